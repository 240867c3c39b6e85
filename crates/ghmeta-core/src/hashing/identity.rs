//! Identidad estable de entidades (content address).
//!
//! La identidad de una fila es el SHA-256 de la concatenación de los ids
//! (i64) que la definen, cada uno serializado en 8 bytes little-endian. Se
//! devuelve en hex minúsculas (64 caracteres).
//!
//! Invariantes:
//! - Función pura de la tupla ordenada: no entra contenido de la entidad, así
//!   que dos observaciones con los mismos ids colapsan a la misma fila aunque
//!   el contenido haya cambiado.
//! - No incluye el tipo de entidad. Dos tipos distintos con la misma tupla
//!   producen el mismo digest; es inocuo mientras cada tipo viva en su propia
//!   tabla. Un almacenamiento unificado indexado sólo por identidad tendría que
//!   añadir un discriminante de tipo a la tupla.
use sha2::{Digest, Sha256};

/// Longitud del digest renderizado en hex.
pub const IDENTITY_HEX_LEN: usize = 64;

/// Calcula la identidad de una tupla ordenada de ids.
pub fn sum256(ids: &[i64]) -> String {
    let mut hasher = Sha256::new();
    for id in ids {
        hasher.update(id.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex_of_fixed_length() {
        let h = sum256(&[85718512]);
        assert_eq!(h.len(), IDENTITY_HEX_LEN);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn order_matters() {
        assert_ne!(sum256(&[1, 2, 3]), sum256(&[3, 2, 1]));
        assert_ne!(sum256(&[1, 2]), sum256(&[2, 1]));
    }

    #[test]
    fn concatenation_is_not_ambiguous_for_fixed_width_ids() {
        // Cada id ocupa 8 bytes: [1, 0] y [1] no pueden coincidir.
        assert_ne!(sum256(&[1, 0]), sum256(&[1]));
    }
}
