//! SQL de las tablas versionadas, derivado del contrato de columnas.
//!
//! Parámetros del upsert: `$1` identidad, `$2` versión, `$3..` valores de
//! contenido en el orden del contrato. `$2` se usa dos veces: como versión
//! inicial y como valor agregado en conflicto.

use ghmeta_core::EntitySchema;

fn quoted(column: &str) -> String {
    format!("\"{column}\"")
}

/// `INSERT … ON CONFLICT (sum256) DO UPDATE SET versions = array_append(…)`.
///
/// `RETURNING (xmax = 0)` distingue inserción (true) de agregado de versión.
pub fn upsert(schema: &EntitySchema) -> String {
    let columns = schema.column_names().map(quoted).collect::<Vec<_>>().join(", ");
    let params = (0..schema.columns.len()).map(|i| format!("${}", i + 3))
                                          .collect::<Vec<_>>()
                                          .join(", ");
    format!("INSERT INTO {table} AS t (sum256, versions, {columns}) \
             VALUES ($1, ARRAY[$2::bigint], {params}) \
             ON CONFLICT (sum256) DO UPDATE SET versions = array_append(t.versions, $2::bigint) \
             RETURNING (xmax = 0) AS inserted",
            table = schema.table)
}

/// Fila completa por identidad; el contenido viaja como `to_jsonb(t)`.
pub fn find(schema: &EntitySchema) -> String {
    format!("SELECT sum256, versions, to_jsonb(t) AS content FROM {} t WHERE sum256 = $1",
            schema.table)
}

pub fn list(schema: &EntitySchema) -> String {
    format!("SELECT sum256, versions, to_jsonb(t) AS content FROM {} t ORDER BY sum256",
            schema.table)
}

pub fn count(schema: &EntitySchema) -> String {
    format!("SELECT count(*) AS count FROM {}", schema.table)
}
