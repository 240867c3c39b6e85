//! Valores de columna y filas versionadas.
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ColumnType;

/// Valor tipado de una columna de contenido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Text(String),
    Bool(bool),
    BigInt(i64),
    /// `None` se persiste como NULL.
    Timestamp(Option<DateTime<Utc>>),
    TextArray(Vec<String>),
    BigIntArray(Vec<i64>),
}

impl ColumnValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnValue::Text(_) => ColumnType::Text,
            ColumnValue::Bool(_) => ColumnType::Bool,
            ColumnValue::BigInt(_) => ColumnType::BigInt,
            ColumnValue::Timestamp(_) => ColumnType::Timestamp,
            ColumnValue::TextArray(_) => ColumnType::TextArray,
            ColumnValue::BigIntArray(_) => ColumnType::BigIntArray,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::Text(v)
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Text(v.to_string())
    }
}

impl From<bool> for ColumnValue {
    fn from(v: bool) -> Self {
        ColumnValue::Bool(v)
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::BigInt(v)
    }
}

impl From<Option<DateTime<Utc>>> for ColumnValue {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        ColumnValue::Timestamp(v)
    }
}

impl From<Vec<String>> for ColumnValue {
    fn from(v: Vec<String>) -> Self {
        ColumnValue::TextArray(v)
    }
}

/// Fila versionada tal como queda almacenada.
///
/// - `identity`: digest hex de la tupla de ids (ver `hashing::sum256`).
/// - `versions`: marcas de observación en orden de inserción, sin deduplicar.
/// - `content`: columnas del contrato en su orden; fijadas en la primera
///   observación y nunca sobrescritas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    pub identity: String,
    pub versions: Vec<i64>,
    pub content: IndexMap<String, ColumnValue>,
}

impl EntityRow {
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.content.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(ColumnValue::as_text)
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(ColumnValue::as_i64)
    }

    pub fn flag(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(ColumnValue::as_bool)
    }
}
