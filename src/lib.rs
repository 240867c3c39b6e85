//! ghmeta
//!
//! Borde de la aplicación sobre `ghmeta-core` y `ghmeta-persistence`:
//! - `webhook`: contrato de transporte (validación de la petición entrante).
//! - `processor`: consumo de mensajes del bus, individual y en lote.
//! - `logging`: logger a stderr para el binario.
//! - `errors`: errores del binario y códigos de salida.

pub mod errors;
pub mod logging;
pub mod processor;
pub mod webhook;

pub use processor::{BusMessage, ProcessError, Processor};
pub use webhook::{Webhook, WebhookError, WebhookRequest, WebhookResponse};
