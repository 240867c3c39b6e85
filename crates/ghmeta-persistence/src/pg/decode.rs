//! Reconstrucción de `EntityRow` desde `to_jsonb(fila)`.
//!
//! El JSON trae todas las columnas de la tabla; sólo se toman las del
//! contrato y en su orden. Un tipo que no coincide con el contrato es un
//! error de decodificación, no un valor por defecto.

use chrono::{DateTime, Utc};
use ghmeta_core::{ColumnType, ColumnValue, EntityKind, EntityRow};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::PersistenceError;

pub(super) fn row(kind: EntityKind,
                  identity: String,
                  versions: Vec<i64>,
                  content: Value)
                  -> Result<EntityRow, PersistenceError> {
    let Value::Object(mut fields) = content else {
        return Err(PersistenceError::Decode(format!("{kind}: content is not an object")));
    };
    let mut decoded = IndexMap::with_capacity(kind.schema().columns.len());
    for (column, ty) in kind.schema().columns {
        let raw = fields.remove(*column).unwrap_or(Value::Null);
        let value = column_value(*ty, raw).ok_or_else(|| {
                        PersistenceError::Decode(format!("{kind}.{column}: expected {}", ty.sql_name()))
                    })?;
        decoded.insert(column.to_string(), value);
    }
    Ok(EntityRow { identity,
                   versions,
                   content: decoded })
}

fn column_value(ty: ColumnType, raw: Value) -> Option<ColumnValue> {
    Some(match (ty, raw) {
        (ColumnType::Text, Value::String(s)) => ColumnValue::Text(s),
        (ColumnType::Bool, Value::Bool(b)) => ColumnValue::Bool(b),
        (ColumnType::BigInt, Value::Number(n)) => ColumnValue::BigInt(n.as_i64()?),
        (ColumnType::Timestamp, Value::Null) => ColumnValue::Timestamp(None),
        (ColumnType::Timestamp, Value::String(s)) => {
            let ts = DateTime::parse_from_rfc3339(&s).ok()?.with_timezone(&Utc);
            ColumnValue::Timestamp(Some(ts))
        }
        (ColumnType::TextArray, Value::Array(items)) => {
            ColumnValue::TextArray(items.into_iter()
                                        .map(|v| match v {
                                            Value::String(s) => Some(s),
                                            _ => None,
                                        })
                                        .collect::<Option<_>>()?)
        }
        (ColumnType::BigIntArray, Value::Array(items)) => {
            ColumnValue::BigIntArray(items.iter().map(Value::as_i64).collect::<Option<_>>()?)
        }
        _ => return None,
    })
}
