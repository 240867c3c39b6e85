//! Eventos de webhook: sobre, tablas de acciones y payloads tipados.

pub mod actions;
mod envelope;
mod nullable;
mod timestamp;
pub mod types;

pub use actions::{classify, ActionOutcome, ActionTable, Classified, EventType};
pub use envelope::{base64_bytes, WebhookEnvelope};
