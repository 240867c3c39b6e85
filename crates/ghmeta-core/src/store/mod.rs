//! Motor de upsert versionado: contrato del backend de almacenamiento.
//!
//! Semántica de `upsert` (cualquier implementación):
//! - Calcula la identidad con `hashing::sum256` sobre la tupla de ids.
//! - Si no existe fila con esa identidad, inserta contenido + `versions =
//!   [version]`.
//! - Si existe, sólo agrega `version` al final de `versions`; el contenido
//!   queda intacto (first-write-wins).
//! - Todo ocurre en una unidad atómica: ante error o cancelación no queda
//!   ninguna escritura parcial visible.

mod cancel;
mod memory;

pub use cancel::Cancellation;
pub use memory::InMemoryEntityStore;

use indexmap::IndexMap;

use crate::entity::{ColumnValue, EntityKind, EntityRow};
use crate::errors::StoreError;
use crate::hashing::sum256;

/// Rama tomada por un upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Primera observación de la identidad.
    Inserted,
    /// Identidad ya existente: se agregó una versión.
    Appended,
}

/// Argumentos de una escritura versionada.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    pub kind: EntityKind,
    pub identity_ids: Vec<i64>,
    /// Marca de observación (segundos Unix capturados al escribir).
    pub version: i64,
    /// Valores en el orden del contrato de `kind`.
    pub values: Vec<ColumnValue>,
}

impl UpsertRequest {
    pub fn new(kind: EntityKind, identity_ids: Vec<i64>, version: i64, values: Vec<ColumnValue>) -> Self {
        Self { kind,
               identity_ids,
               version,
               values }
    }

    pub fn identity(&self) -> String {
        sum256(&self.identity_ids)
    }

    /// Verifica la tupla de ids y que los valores sigan el contrato (cantidad,
    /// orden y tipo).
    pub fn validate(&self) -> Result<(), StoreError> {
        let schema = self.kind.schema();
        let mismatch = |reason: String| StoreError::SchemaMismatch { kind: self.kind, reason };
        if self.identity_ids.is_empty() {
            return Err(mismatch("empty identity tuple".into()));
        }
        if self.values.len() != schema.columns.len() {
            return Err(mismatch(format!("expected {} values, got {}",
                                        schema.columns.len(),
                                        self.values.len())));
        }
        for ((column, expected), value) in schema.columns.iter().zip(&self.values) {
            if value.column_type() != *expected {
                return Err(mismatch(format!("column {column}: expected {}, got {}",
                                            expected.sql_name(),
                                            value.column_type().sql_name())));
            }
        }
        Ok(())
    }

    /// Contenido nombrado según el contrato.
    pub fn content(&self) -> IndexMap<String, ColumnValue> {
        self.kind
            .schema()
            .column_names()
            .map(str::to_string)
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// Backend de almacenamiento de filas versionadas.
///
/// Se inyecta explícitamente (un handle construido al arrancar); debe ser
/// seguro para escritores concurrentes: la exclusión la da la unicidad de la
/// identidad en el backend, no un lock en proceso.
pub trait EntityStore: Send + Sync {
    /// Ejecuta exactamente una escritura versionada.
    fn upsert(&self, request: &UpsertRequest, cancel: &Cancellation) -> Result<UpsertOutcome, StoreError>;
    /// Busca una fila por identidad.
    fn find(&self, kind: EntityKind, identity: &str) -> Result<Option<EntityRow>, StoreError>;
    /// Lista todas las filas de un tipo (orden no especificado).
    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRow>, StoreError>;
}

impl<S: EntityStore + ?Sized> EntityStore for std::sync::Arc<S> {
    fn upsert(&self, request: &UpsertRequest, cancel: &Cancellation) -> Result<UpsertOutcome, StoreError> {
        (**self).upsert(request, cancel)
    }
    fn find(&self, kind: EntityKind, identity: &str) -> Result<Option<EntityRow>, StoreError> {
        (**self).find(kind, identity)
    }
    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRow>, StoreError> {
        (**self).list(kind)
    }
}
