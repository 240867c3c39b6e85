//! Módulo de hashing: identidad direccionada por contenido de entidades.

pub mod identity;

pub use identity::{sum256, IDENTITY_HEX_LEN};
