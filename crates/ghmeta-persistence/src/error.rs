//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y, hacia el core,
//! a `StoreError`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use ghmeta_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("not null violation: {0}")]
    NotNullViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("write cancelled")]
    Cancelled,
    #[error("configuration: {0}")]
    Config(String),
    #[error("stored row decode: {0}")]
    Decode(String),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl PersistenceError {
    /// Determina si un error es transitorio (recomendado reintentar con
    /// backoff).
    ///
    /// Cubre conflictos de serialización, errores de pool/conexión y mensajes
    /// comunes de desconexión detectados por texto (best-effort).
    pub fn is_retryable(&self) -> bool {
        match self {
            PersistenceError::SerializationConflict | PersistenceError::TransientIo(_) => true,
            PersistenceError::Unknown(msg) => {
                let m = msg.to_lowercase();
                m.contains("deadlock detected")
                || m.contains("could not serialize access due to concurrent update")
                || m.contains("terminating connection due to administrator command")
                || m.contains("connection closed")
                || m.contains("connection refused")
            }
            _ => false,
        }
    }
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => {
                // 57014: el deadline del token se tradujo a statement_timeout.
                if info.message().contains("canceling statement due to statement timeout") {
                    return Self::Cancelled;
                }
                match kind {
                    DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                    DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                    DatabaseErrorKind::NotNullViolation => Self::NotNullViolation(info.message().to_string()),
                    DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                    DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                    other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
                }
            }
            DieselError::DeserializationError(e) => Self::Decode(e.to_string()),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Cancelled => StoreError::Cancelled,
            other => StoreError::Backend { retryable: other.is_retryable(),
                                           message: other.to_string() },
        }
    }
}
