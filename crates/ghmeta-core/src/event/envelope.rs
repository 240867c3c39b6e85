//! `WebhookEnvelope`: par (tipo, payload) que viaja entre transporte y
//! despachador.
//!
//! Dos formatos:
//! - Wire (plataforma): el tipo viene del header `X-GitHub-Event` y el payload
//!   es el body crudo.
//! - Bus de mensajes: un JSON `{"type": "...", "payload": "<base64>"}`. El
//!   payload viaja en base64 porque el transporte no es transparente a bytes;
//!   se omite cuando está vacío.
//!
//! El payload no se parsea aquí: el despachador lo hace sólo cuando reconoce
//! el tipo.
use serde::{Deserialize, Serialize};

use crate::errors::EnvelopeError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub payload: Vec<u8>,
}

impl WebhookEnvelope {
    pub fn new(event_type: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self { event_type: event_type.into(),
               payload: payload.into() }
    }

    /// Construye el sobre desde una petición de la plataforma.
    pub fn from_wire(event_type_header: &str, body: &[u8]) -> Self {
        Self::new(event_type_header, body)
    }

    /// Devuelve (valor del header de tipo, body).
    pub fn to_wire(&self) -> (&str, &[u8]) {
        (&self.event_type, &self.payload)
    }

    /// Codifica al formato del bus.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodifica desde el formato del bus.
    pub fn decode(data: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// (De)serialización de `Vec<u8>` como string base64 estándar (con padding).
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(d)?.unwrap_or_default();
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
