//! Wrapper para correr migraciones embebidas.
//!
//! Las migraciones viven en `migrations/` de este crate y crean las tablas
//! `github_*_versioned`. Al construir el pool se ejecutan una vez.

use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Aplica las migraciones pendientes y devuelve sus versiones.
pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<Vec<String>, PersistenceError> {
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(|e| PersistenceError::Migration(e.to_string()))?
                      .into_iter()
                      .map(|v| v.to_string())
                      .collect::<Vec<_>>();
    for version in &applied {
        info!("migration applied: {version}");
    }
    Ok(applied)
}

/// Abre una conexión directa (sin pool) y migra.
pub fn migrate(database_url: &str) -> Result<Vec<String>, PersistenceError> {
    let mut conn = PgConnection::establish(database_url).map_err(|e| PersistenceError::TransientIo(format!("connect: {e}")))?;
    run_pending_migrations(&mut conn)
}
