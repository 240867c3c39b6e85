//! Consumidor del bus de mensajes.
//!
//! Un mensaje push trae `{"data": "<base64>"}` donde `data` es el sobre en
//! formato bus (`WebhookEnvelope::encode`). Cada mensaje se procesa de forma
//! aislada: su error no afecta a los demás del lote.

use ghmeta_core::event::base64_bytes;
use ghmeta_core::{Cancellation, DispatchError, DispatchOutcome, EntityStore, EnvelopeError, EventDispatcher,
                  WebhookEnvelope};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusMessage {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl BusMessage {
    pub fn from_envelope(envelope: &WebhookEnvelope) -> Result<Self, EnvelopeError> {
        Ok(Self { data: envelope.encode()? })
    }

    pub fn to_json(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("bus message: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ProcessError {
    /// Sólo los fallos transitorios de almacenamiento ameritan reentrega; un
    /// mensaje mal formado fallaría igual.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessError::Dispatch(e) if e.is_retryable())
    }
}

pub struct Processor<S: EntityStore> {
    dispatcher: EventDispatcher<S>,
}

impl<S: EntityStore> Processor<S> {
    pub fn new(dispatcher: EventDispatcher<S>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &EventDispatcher<S> {
        &self.dispatcher
    }

    pub fn process_envelope(&self,
                            envelope: &WebhookEnvelope,
                            cancel: &Cancellation)
                            -> Result<DispatchOutcome, ProcessError> {
        Ok(self.dispatcher.process_with(envelope, cancel)?)
    }

    /// Procesa un sobre en formato bus (`{"type": …, "payload": …}`).
    pub fn process_encoded(&self, encoded: &[u8]) -> Result<DispatchOutcome, ProcessError> {
        let envelope = WebhookEnvelope::decode(encoded)?;
        self.process_envelope(&envelope, &Cancellation::new())
    }

    /// Procesa el body de un mensaje push (`{"data": "<base64>"}`).
    pub fn process_message(&self, push_body: &[u8]) -> Result<DispatchOutcome, ProcessError> {
        let message: BusMessage = serde_json::from_slice(push_body).map_err(EnvelopeError::from)?;
        self.process_encoded(&message.data)
    }

    /// Procesa un lote de sobres codificados en paralelo; devuelve un
    /// resultado por entrada, en el orden de entrada.
    pub fn process_batch<M>(&self, encoded: &[M]) -> Vec<Result<DispatchOutcome, ProcessError>>
        where M: AsRef<[u8]> + Sync
    {
        let results: Vec<_> = encoded.par_iter().map(|m| self.process_encoded(m.as_ref())).collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!("batch: {failed}/{} events failed", results.len());
        } else {
            info!("batch: {} events processed", results.len());
        }
        results
    }
}
