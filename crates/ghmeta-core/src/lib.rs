//! ghmeta-core: normalización de eventos de webhook y upsert versionado
//! direccionado por contenido.
//!
//! Módulos:
//! - `hashing`: identidad estable (`sum256`) de una tupla de ids.
//! - `entity`: tipos de entidad y su contrato de columnas.
//! - `event`: sobre (`WebhookEnvelope`), tablas de acciones y payloads.
//! - `store`: contrato del motor de upsert (`EntityStore`) y backend en memoria.
//! - `dispatch`: `EventDispatcher` (clasificar, filtrar, enrutar).
pub mod dispatch;
pub mod entity;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod store;

pub use dispatch::{DispatchOutcome, EventDispatcher};
pub use entity::{ColumnType, ColumnValue, EntityKind, EntityRow, EntitySchema};
pub use errors::{DispatchError, EnvelopeError, EventSummary, StoreError};
pub use event::{EventType, WebhookEnvelope};
pub use hashing::sum256;
pub use store::{Cancellation, EntityStore, InMemoryEntityStore, UpsertOutcome, UpsertRequest};
