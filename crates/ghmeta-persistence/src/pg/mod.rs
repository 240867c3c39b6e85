//! Implementación Postgres (Diesel) del motor de upsert versionado.
//!
//! - Una escritura = una transacción `read_write`: el `INSERT … ON CONFLICT`
//!   decide entre insertar la fila o agregar la versión, de forma atómica y
//!   segura ante escritores concurrentes (la exclusión la da la PK `sum256`).
//! - La cancelación se verifica antes de escribir y antes del commit; un
//!   deadline se traduce a `SET LOCAL statement_timeout`.
//! - Errores transitorios se reintentan con backoff corto (hasta 3 veces).

mod decode;

use std::time::Duration;

use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::{Array, BigInt, Bool, Jsonb, Nullable, Text, Timestamptz};
use ghmeta_core::{Cancellation, ColumnValue, EntityKind, EntityRow, EntityStore, StoreError, UpsertOutcome,
                  UpsertRequest};
use log::{debug, error, warn};
use serde_json::Value;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::statements;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

type PooledConn = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real o uno de pruebas sin acoplar el store a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PooledConn, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PooledConn, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(QueryableByName)]
struct UpsertReturn {
    #[diesel(sql_type = Bool)]
    inserted: bool,
}

#[derive(QueryableByName)]
struct StoredRow {
    #[diesel(sql_type = Text)]
    sum256: String,
    #[diesel(sql_type = Array<BigInt>)]
    versions: Vec<i64>,
    #[diesel(sql_type = Jsonb)]
    content: Value,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Retry con backoff lineal corto (15ms, 30ms, 45ms); se corta si el token
/// se cancela entre intentos.
fn with_retry<F, T>(cancel: &Cancellation, mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if e.is_retryable() && attempts < 3 && !cancel.is_cancelled() => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

type BoxedUpsert<'f> = BoxedSqlQuery<'f, Pg, SqlQuery>;

fn bind_value<'f>(query: BoxedUpsert<'f>, value: &ColumnValue) -> BoxedUpsert<'f> {
    match value.clone() {
        ColumnValue::Text(v) => query.bind::<Text, _>(v),
        ColumnValue::Bool(v) => query.bind::<Bool, _>(v),
        ColumnValue::BigInt(v) => query.bind::<BigInt, _>(v),
        ColumnValue::Timestamp(v) => query.bind::<Nullable<Timestamptz>, _>(v),
        ColumnValue::TextArray(v) => query.bind::<Array<Text>, _>(v),
        ColumnValue::BigIntArray(v) => query.bind::<Array<BigInt>, _>(v),
    }
}

fn statement_timeout(cancel: &Cancellation) -> Option<String> {
    // 0 en Postgres significa "sin límite": un deadline vencido se corta antes.
    cancel.remaining()
          .map(|left| format!("SET LOCAL statement_timeout = {}", left.as_millis().max(1)))
}

/// Cuerpo transaccional de una escritura. Cualquier `Err` provoca rollback.
fn upsert_in_tx(tx: &mut PgConnection,
                sql: &str,
                identity: &str,
                request: &UpsertRequest,
                cancel: &Cancellation)
                -> Result<UpsertOutcome, PersistenceError> {
    if let Some(timeout) = statement_timeout(cancel) {
        diesel::sql_query(timeout).execute(tx)?;
    }
    if cancel.is_cancelled() {
        return Err(PersistenceError::Cancelled);
    }
    let mut query = diesel::sql_query(sql).into_boxed::<Pg>()
                                          .bind::<Text, _>(identity.to_string())
                                          .bind::<BigInt, _>(request.version);
    for value in &request.values {
        query = bind_value(query, value);
    }
    let row: UpsertReturn = query.get_result(tx)?;
    // Último punto de corte antes del commit.
    if cancel.is_cancelled() {
        return Err(PersistenceError::Cancelled);
    }
    Ok(if row.inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Appended
    })
}

/// Implementación Postgres de `EntityStore`.
pub struct PgEntityStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgEntityStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn write(&self, request: &UpsertRequest, cancel: &Cancellation) -> Result<UpsertOutcome, PersistenceError> {
        let sql = statements::upsert(request.kind.schema());
        let identity = request.identity();
        with_retry(cancel, || {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| upsert_in_tx(tx, &sql, &identity, request, cancel))
        })
    }

    fn read_one(&self, kind: EntityKind, identity: &str) -> Result<Option<EntityRow>, PersistenceError> {
        let sql = statements::find(kind.schema());
        let stored: Option<StoredRow> = with_retry(&Cancellation::new(), || {
                                            let mut conn = self.provider.connection()?;
                                            diesel::sql_query(sql.as_str()).bind::<Text, _>(identity.to_string())
                                                                           .get_result(&mut conn)
                                                                           .optional()
                                                                           .map_err(PersistenceError::from)
                                        })?;
        stored.map(|row| decode::row(kind, row.sum256, row.versions, row.content)).transpose()
    }

    fn read_all(&self, kind: EntityKind) -> Result<Vec<EntityRow>, PersistenceError> {
        let sql = statements::list(kind.schema());
        let stored: Vec<StoredRow> = with_retry(&Cancellation::new(), || {
                                         let mut conn = self.provider.connection()?;
                                         diesel::sql_query(sql.as_str()).load(&mut conn)
                                                                        .map_err(PersistenceError::from)
                                     })?;
        stored.into_iter()
              .map(|row| decode::row(kind, row.sum256, row.versions, row.content))
              .collect()
    }

    /// Cantidad de filas (identidades distintas) de un tipo.
    pub fn count(&self, kind: EntityKind) -> Result<i64, PersistenceError> {
        let sql = statements::count(kind.schema());
        with_retry(&Cancellation::new(), || {
            let mut conn = self.provider.connection()?;
            let row: CountRow = diesel::sql_query(sql.as_str()).get_result(&mut conn)?;
            Ok(row.count)
        })
    }
}

impl<P: ConnectionProvider> EntityStore for PgEntityStore<P> {
    fn upsert(&self, request: &UpsertRequest, cancel: &Cancellation) -> Result<UpsertOutcome, StoreError> {
        request.validate()?;
        debug!("upsert:start table={} version={}", request.kind.table(), request.version);
        match self.write(request, cancel) {
            Ok(outcome) => {
                debug!("upsert:done table={} identity={} outcome={outcome:?}",
                       request.kind.table(),
                       request.identity());
                Ok(outcome)
            }
            Err(PersistenceError::Cancelled) => {
                warn!("upsert:cancelled table={}", request.kind.table());
                Err(StoreError::Cancelled)
            }
            Err(e) => {
                error!("upsert:failed table={} err={e}", request.kind.table());
                Err(e.into())
            }
        }
    }

    fn find(&self, kind: EntityKind, identity: &str) -> Result<Option<EntityRow>, StoreError> {
        Ok(self.read_one(kind, identity)?)
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRow>, StoreError> {
        Ok(self.read_all(kind)?)
    }
}

/// Construye un pool Postgres r2d2 a partir de URL.
///
/// - Tamaños en 0 se elevan a 1; si `min_size > max_size`, usa `min = max`.
/// - Ejecuta las migraciones pendientes con la primera conexión.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(validated_min.min(validated_max)))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
