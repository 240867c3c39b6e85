//! Carga de configuración de conexión desde variables de entorno.
//!
//! Convención `DATABASE_URL` / `DATABASE_{MIN,MAX}_CONNECTIONS`, con los
//! nombres heredados `GITHUB_DATABASE_*` como respaldo.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectada.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PersistenceError> {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(k).filter(|v| !v.trim().is_empty()));
        let url = first(&["DATABASE_URL", "GITHUB_DATABASE_URI"]).ok_or_else(|| {
                      PersistenceError::Config("DATABASE_URL (o GITHUB_DATABASE_URI) no definido".into())
                  })?;
        let size = |keys: &[&str]| -> Result<u32, PersistenceError> {
            match first(keys) {
                None => Ok(1),
                Some(raw) => raw.trim()
                                .parse()
                                .map_err(|_| PersistenceError::Config(format!("{}: valor inválido {raw:?}", keys[0]))),
            }
        };
        let min_connections = size(&["DATABASE_MIN_CONNECTIONS", "GITHUB_DATABASE_MAX_IDLE_CONNS"])?;
        let max_connections = size(&["DATABASE_MAX_CONNECTIONS", "GITHUB_DATABASE_MAX_OPEN_CONNS"])?;
        Ok(Self { url,
                  min_connections,
                  max_connections })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
