//! ghmeta-persistence
//!
//! Backend Postgres (Diesel + r2d2) del motor de upsert versionado.
//!
//! Módulos:
//! - `pg`: `PgEntityStore`, pool de conexiones y reintentos.
//! - `statements`: SQL generado a partir del contrato de columnas.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde entorno / `.env`.
//! - `error`: mapeo de errores de Diesel / pool.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod statements;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgEntityStore, PgPool, PoolProvider};
