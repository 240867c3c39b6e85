//! Tipos de entidad persistidos y su contrato de columnas.

mod schema;
mod value;

pub use schema::{ColumnType, EntityKind, EntitySchema};
pub use value::{ColumnValue, EntityRow};
