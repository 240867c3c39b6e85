use ghmeta_core::StoreError;
use ghmeta_persistence::PersistenceError;
use thiserror::Error;

/// Errores del binario, con su código de salida.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("uso: {0}")]
    Usage(String),
    #[error("{failed} de {total} eventos fallaron")]
    Events { failed: usize, total: usize },
    #[error("error de IO: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Events { .. } => 4,
            CliError::Io(_) | CliError::Persistence(_) | CliError::Store(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_event_and_infrastructure_failures() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), 2);
        assert_eq!(CliError::Events { failed: 1, total: 3 }.exit_code(), 4);
        assert_eq!(CliError::Persistence(PersistenceError::Config("url".into())).exit_code(), 5);
        assert_eq!(CliError::Events { failed: 1, total: 3 }.to_string(), "1 de 3 eventos fallaron");
    }
}
