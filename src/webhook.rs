//! Contrato de transporte del webhook, independiente de cualquier framework
//! HTTP.
//!
//! Validaciones, en este orden (la primera que falla define la respuesta):
//! 1. Firma presente y bien formada (`X-Hub-Signature-256` o
//!    `X-Hub-Signature`, formato `<alg>=<hex>`). El HMAC en sí lo verifica
//!    quien tenga el secreto.
//! 2. Método `POST` (si no, 405).
//! 3. Header `X-GitHub-Event` presente.
//! 4. Body de a lo sumo `MAX_PAYLOAD_SIZE` bytes.
//!
//! `Content-Type` no se mira: el body se entrega tal cual y es el
//! despachador quien decide si el payload es parseable.
//!
//! Una petición válida se entrega como `WebhookEnvelope` al callback; si el
//! callback falla la respuesta es 500, si no 200 con body vacío.

use std::fmt;

use ghmeta_core::WebhookEnvelope;
use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
pub const SIGNATURE_256_HEADER: &str = "X-Hub-Signature-256";
pub const EVENT_TYPE_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Petición entrante ya leída por la capa HTTP.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(method: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self { method: method.into(),
               headers: Vec::new(),
               body: body.into() }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Búsqueda case-insensitive; devuelve el primer valor no vacío.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(name) && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("invalid signature: missing X-Hub-Signature header")]
    MissingSignature,
    #[error("invalid signature: {0}")]
    MalformedSignature(String),
    #[error("invalid request method: {0}")]
    MethodNotAllowed(String),
    #[error("invalid event type: missing X-GitHub-Event header")]
    MissingEventType,
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("{0}")]
    Callback(String),
}

impl WebhookError {
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::MethodNotAllowed(_) => 405,
            WebhookError::Callback(_) => 500,
            _ => 400,
        }
    }
}

/// Algoritmos de firma aceptados y el largo hex de su digest.
fn digest_hex_len(algorithm: &str) -> Option<usize> {
    match algorithm {
        "sha1" => Some(40),
        "sha256" => Some(64),
        "sha512" => Some(128),
        _ => None,
    }
}

fn check_signature(value: &str) -> Result<(), WebhookError> {
    let malformed = || WebhookError::MalformedSignature(value.to_string());
    let (algorithm, hex) = value.split_once('=').ok_or_else(malformed)?;
    let expected = digest_hex_len(algorithm).ok_or_else(malformed)?;
    if hex.len() != expected || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    Ok(())
}

/// Handler del webhook con su callback `on_event`.
pub struct Webhook<F> {
    on_event: F,
}

impl<F, E> Webhook<F>
    where F: Fn(WebhookEnvelope) -> Result<(), E>,
          E: fmt::Display
{
    pub fn new(on_event: F) -> Self {
        Self { on_event }
    }

    /// Valida la petición y construye el sobre.
    pub fn validate(&self, req: &WebhookRequest) -> Result<WebhookEnvelope, WebhookError> {
        let signature = req.header_value(SIGNATURE_256_HEADER)
                           .or_else(|| req.header_value(SIGNATURE_HEADER))
                           .ok_or(WebhookError::MissingSignature)?;
        check_signature(signature)?;
        if !req.method.eq_ignore_ascii_case("POST") {
            return Err(WebhookError::MethodNotAllowed(req.method.clone()));
        }
        let event_type = req.header_value(EVENT_TYPE_HEADER).ok_or(WebhookError::MissingEventType)?;
        if req.body.len() > MAX_PAYLOAD_SIZE {
            return Err(WebhookError::PayloadTooLarge(req.body.len()));
        }
        Ok(WebhookEnvelope::from_wire(event_type, &req.body))
    }

    /// Valida, entrega al callback y traduce el resultado a una respuesta.
    pub fn handle(&self, req: &WebhookRequest) -> WebhookResponse {
        let delivery = req.header_value(DELIVERY_HEADER).and_then(|d| Uuid::parse_str(d).ok());
        let result = self.validate(req).and_then(|envelope| {
                                           debug!("webhook:accepted type={} delivery={delivery:?} bytes={}",
                                                  envelope.event_type,
                                                  envelope.payload.len());
                                           (self.on_event)(envelope).map_err(|e| WebhookError::Callback(e.to_string()))
                                       });
        match result {
            Ok(()) => WebhookResponse { status: 200,
                                        body: String::new() },
            Err(e) => {
                warn!("webhook:rejected delivery={delivery:?} status={} err={e}", e.status_code());
                WebhookResponse { status: e.status_code(),
                                  body: e.to_string() }
            }
        }
    }
}
