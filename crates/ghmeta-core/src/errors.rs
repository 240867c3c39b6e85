//! Errores del core: almacenamiento, sobre (envelope) y despacho de eventos.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityKind;

/// Errores del motor de upsert (cualquier backend).
///
/// El conflicto de identidad NO es un error: es la rama esperada que agrega
/// una versión en lugar de insertar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("schema mismatch for {kind}: {reason}")]
    SchemaMismatch { kind: EntityKind, reason: String },
    #[error("write cancelled before commit")]
    Cancelled,
    #[error("storage backend: {message}")]
    Backend { message: String, retryable: bool },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Backend { retryable: true, .. })
    }
}

/// Errores al decodificar el sobre del bus de mensajes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid envelope json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Descripción corta de un evento para reportar errores.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventSummary {
    pub event_type: String,
    pub action: Option<String>,
    pub repository: Option<String>,
}

impl EventSummary {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self { event_type: event_type.into(),
               ..Default::default() }
    }
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({}", self.event_type)?;
        if let Some(action) = &self.action {
            write!(f, " action={action}")?;
        }
        if let Some(repo) = &self.repository {
            write!(f, " repository={repo}")?;
        }
        f.write_str(")")
    }
}

/// Error reportado al procesar un único evento. Nunca afecta a otros eventos.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{event}: payload parse failed: {source}")]
    Payload {
        event: EventSummary,
        #[source]
        source: serde_json::Error,
    },
    #[error("{event}: missing {field}")]
    Extraction { event: EventSummary, field: &'static str },
    #[error("{event}: {source}")]
    Store {
        event: EventSummary,
        #[source]
        source: StoreError,
    },
    #[error("{event} recovered from: {message}")]
    Fault { event: EventSummary, message: String },
}

impl DispatchError {
    pub fn event(&self) -> &EventSummary {
        match self {
            DispatchError::Payload { event, .. }
            | DispatchError::Extraction { event, .. }
            | DispatchError::Store { event, .. }
            | DispatchError::Fault { event, .. } => event,
        }
    }

    /// Sólo fallos de almacenamiento transitorios merecen reentrega.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Store { source, .. } if source.is_retryable())
    }
}
