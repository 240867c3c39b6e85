//! `EventDispatcher`: clasifica, filtra y enruta eventos al motor de upsert.
//!
//! Flujo por evento:
//! 1. Se resuelve el tipo por el tag del sobre; tags desconocidos son un no-op
//!    y el payload no se parsea.
//! 2. Se parsea el payload al struct del tipo (error reportado si falla).
//! 3. Se clasifica `action` con la tabla del tipo; ignoradas y no reconocidas
//!    son no-op.
//! 4. Las significativas extraen sub-estructuras, construyen los
//!    `UpsertRequest` y los escriben (cada uno en su propia transacción).
//!
//! Cualquier pánico durante 2–4 se captura en el borde del evento y se
//! reporta como `DispatchError::Fault`; no afecta a otros eventos.

pub mod rows;

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::Utc;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::{DispatchError, EventSummary};
use crate::event::actions::{InstallationAction, InstallationRepositoriesAction, IssueCommentAction,
                            IssuesAction, OrganizationAction, PullRequestAction, PullRequestReviewAction,
                            PullRequestReviewCommentAction, RepositoryAction};
use crate::event::types::{InstallationEvent, InstallationRepositoriesEvent, IssueCommentEvent, IssuesEvent,
                          OrganizationEvent, PullRequestEvent, PullRequestReviewCommentEvent,
                          PullRequestReviewEvent, Repository, RepositoryEvent};
use crate::event::{classify, ActionTable, Classified, EventType, WebhookEnvelope};
use crate::store::{Cancellation, EntityStore, UpsertOutcome, UpsertRequest};

/// Resultado exitoso de procesar un evento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Tag de tipo no modelado (compatibilidad hacia adelante).
    UnknownType,
    /// Acción listada como ignorada para el tipo.
    Ignored { action: String },
    /// Acción que la tabla del tipo no menciona.
    Unrecognized { action: String },
    /// Acción significativa: una entrada por escritura realizada.
    Persisted(Vec<UpsertOutcome>),
}

impl DispatchOutcome {
    pub fn writes(&self) -> usize {
        match self {
            DispatchOutcome::Persisted(w) => w.len(),
            _ => 0,
        }
    }
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

pub struct EventDispatcher<S: EntityStore> {
    store: S,
    clock: Clock,
}

impl<S: EntityStore> EventDispatcher<S> {
    /// Dispatcher con reloj de pared (segundos Unix UTC) para las versiones.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, || Utc::now().timestamp())
    }

    pub fn with_clock(store: S, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self { store,
               clock: Box::new(clock) }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn process(&self, envelope: &WebhookEnvelope) -> Result<DispatchOutcome, DispatchError> {
        self.process_with(envelope, &Cancellation::new())
    }

    /// Procesa un evento respetando una señal externa de cancelación.
    pub fn process_with(&self,
                        envelope: &WebhookEnvelope,
                        cancel: &Cancellation)
                        -> Result<DispatchOutcome, DispatchError> {
        let Some(event_type) = EventType::from_tag(&envelope.event_type) else {
            debug!("dispatch:skip unknown event type {:?}", envelope.event_type);
            return Ok(DispatchOutcome::UnknownType);
        };
        debug!("dispatch:start type={event_type} bytes={}", envelope.payload.len());
        let result = catch_unwind(AssertUnwindSafe(|| self.route(event_type, &envelope.payload, cancel)));
        let result = result.unwrap_or_else(|panic| {
                               Err(DispatchError::Fault { event: summary_from_payload(event_type, &envelope.payload),
                                                          message: panic_message(panic.as_ref()) })
                           });
        match &result {
            Ok(outcome) => debug!("dispatch:done type={event_type} outcome={outcome:?}"),
            Err(e) => warn!("dispatch:failed {e}"),
        }
        result
    }

    fn route(&self,
             event_type: EventType,
             payload: &[u8],
             cancel: &Cancellation)
             -> Result<DispatchOutcome, DispatchError> {
        let version = (self.clock)();
        let mut summary = EventSummary::new(event_type.as_str());
        match event_type {
            EventType::Installation => {
                let ev: InstallationEvent = parse(&summary, payload)?;
                summary.action = Some(ev.action.clone());
                if let Err(skip) = gate::<InstallationAction>(&ev.action) {
                    return Ok(skip);
                }
                let requests = ev.repositories.iter().map(|r| rows::repository(r, version)).collect();
                self.write_all(&summary, requests, cancel)
            }
            EventType::InstallationRepositories => {
                let ev: InstallationRepositoriesEvent = parse(&summary, payload)?;
                summary.action = Some(ev.action.clone());
                if let Err(skip) = gate::<InstallationRepositoriesAction>(&ev.action) {
                    return Ok(skip);
                }
                let requests = ev.repositories_added.iter().map(|r| rows::repository(r, version)).collect();
                self.write_all(&summary, requests, cancel)
            }
            EventType::Repository => {
                let ev: RepositoryEvent = parse(&summary, payload)?;
                describe(&mut summary, &ev.action, ev.repository.as_ref());
                if let Err(skip) = gate::<RepositoryAction>(&ev.action) {
                    return Ok(skip);
                }
                let repo = required(&summary, ev.repository.as_ref(), "repository")?;
                self.write_all(&summary, vec![rows::repository(repo, version)], cancel)
            }
            EventType::Organization => {
                let ev: OrganizationEvent = parse(&summary, payload)?;
                summary.action = Some(ev.action.clone());
                if let Err(skip) = gate::<OrganizationAction>(&ev.action) {
                    return Ok(skip);
                }
                let org = required(&summary, ev.organization.as_ref(), "organization")?;
                self.write_all(&summary, vec![rows::organization(org, version)], cancel)
            }
            EventType::IssueComment => {
                let ev: IssueCommentEvent = parse(&summary, payload)?;
                describe(&mut summary, &ev.action, ev.repository.as_ref());
                if let Err(skip) = gate::<IssueCommentAction>(&ev.action) {
                    return Ok(skip);
                }
                let repo = required(&summary, ev.repository.as_ref(), "repository")?;
                let issue = required(&summary, ev.issue.as_ref(), "issue")?;
                let comment = required(&summary, ev.comment.as_ref(), "comment")?;
                let request = if issue.is_pull_request() {
                    rows::issue_comment_as_pull_request(repo, issue, comment, version)
                } else {
                    rows::issue_comment(repo, issue, comment, version)
                };
                self.write_all(&summary, vec![request], cancel)
            }
            EventType::Issues => {
                let ev: IssuesEvent = parse(&summary, payload)?;
                describe(&mut summary, &ev.action, ev.repository.as_ref());
                if let Err(skip) = gate::<IssuesAction>(&ev.action) {
                    return Ok(skip);
                }
                let repo = required(&summary, ev.repository.as_ref(), "repository")?;
                let issue = required(&summary, ev.issue.as_ref(), "issue")?;
                self.write_all(&summary, vec![rows::issue(repo, issue, version)], cancel)
            }
            EventType::PullRequest => {
                let ev: PullRequestEvent = parse(&summary, payload)?;
                describe(&mut summary, &ev.action, ev.repository.as_ref());
                if let Err(skip) = gate::<PullRequestAction>(&ev.action) {
                    return Ok(skip);
                }
                let repo = required(&summary, ev.repository.as_ref(), "repository")?;
                let pr = required(&summary, ev.pull_request.as_ref(), "pull_request")?;
                self.write_all(&summary, vec![rows::pull_request(repo, pr, version)], cancel)
            }
            EventType::PullRequestReview => {
                let ev: PullRequestReviewEvent = parse(&summary, payload)?;
                describe(&mut summary, &ev.action, ev.repository.as_ref());
                if let Err(skip) = gate::<PullRequestReviewAction>(&ev.action) {
                    return Ok(skip);
                }
                let repo = required(&summary, ev.repository.as_ref(), "repository")?;
                let pr = required(&summary, ev.pull_request.as_ref(), "pull_request")?;
                let review = required(&summary, ev.review.as_ref(), "review")?;
                self.write_all(&summary, vec![rows::pull_request_review(repo, pr, review, version)], cancel)
            }
            EventType::PullRequestReviewComment => {
                let ev: PullRequestReviewCommentEvent = parse(&summary, payload)?;
                describe(&mut summary, &ev.action, ev.repository.as_ref());
                if let Err(skip) = gate::<PullRequestReviewCommentAction>(&ev.action) {
                    return Ok(skip);
                }
                let repo = required(&summary, ev.repository.as_ref(), "repository")?;
                let pr = required(&summary, ev.pull_request.as_ref(), "pull_request")?;
                let comment = required(&summary, ev.comment.as_ref(), "comment")?;
                self.write_all(&summary,
                               vec![rows::pull_request_review_comment(repo, pr, comment, version)],
                               cancel)
            }
        }
    }

    /// Escribe en orden; se detiene en el primer error. Cada escritura es
    /// atómica por sí sola, no el lote.
    fn write_all(&self,
                 summary: &EventSummary,
                 requests: Vec<UpsertRequest>,
                 cancel: &Cancellation)
                 -> Result<DispatchOutcome, DispatchError> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in &requests {
            let outcome = self.store
                              .upsert(request, cancel)
                              .map_err(|source| DispatchError::Store { event: summary.clone(), source })?;
            outcomes.push(outcome);
        }
        Ok(DispatchOutcome::Persisted(outcomes))
    }
}

fn parse<T: DeserializeOwned>(summary: &EventSummary, payload: &[u8]) -> Result<T, DispatchError> {
    serde_json::from_slice(payload).map_err(|source| DispatchError::Payload { event: summary.clone(), source })
}

/// Deja pasar sólo acciones significativas; el resto se convierte en el
/// resultado no-op correspondiente.
fn gate<A: ActionTable>(action: &str) -> Result<A, DispatchOutcome> {
    match classify::<A>(action) {
        Classified::Significant(a) => Ok(a),
        Classified::Ignored(_) => Err(DispatchOutcome::Ignored { action: action.to_string() }),
        Classified::Unrecognized => Err(DispatchOutcome::Unrecognized { action: action.to_string() }),
    }
}

fn required<'a, T>(summary: &EventSummary, value: Option<&'a T>, field: &'static str) -> Result<&'a T, DispatchError> {
    value.ok_or_else(|| DispatchError::Extraction { event: summary.clone(), field })
}

fn describe(summary: &mut EventSummary, action: &str, repo: Option<&Repository>) {
    summary.action = Some(action.to_string());
    summary.repository = repo.map(|r| r.full_name.clone());
}

/// Resumen best-effort para reportar un pánico: relee sólo `action` y el
/// nombre del repositorio.
fn summary_from_payload(event_type: EventType, payload: &[u8]) -> EventSummary {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Head {
        action: Option<String>,
        repository: Option<RepoName>,
    }
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct RepoName {
        full_name: Option<String>,
    }
    let head: Head = serde_json::from_slice(payload).unwrap_or_default();
    EventSummary { event_type: event_type.as_str().to_string(),
                   action: head.action,
                   repository: head.repository.and_then(|r| r.full_name) }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::entity::EntityRow;
    use crate::errors::StoreError;
    use crate::store::InMemoryEntityStore;

    /// Store que entra en pánico al escribir: simula un fallo inesperado.
    struct PanickingStore;

    impl EntityStore for PanickingStore {
        fn upsert(&self, _: &UpsertRequest, _: &Cancellation) -> Result<UpsertOutcome, StoreError> {
            panic!("boom")
        }
        fn find(&self, _: EntityKind, _: &str) -> Result<Option<EntityRow>, StoreError> {
            Ok(None)
        }
        fn list(&self, _: EntityKind) -> Result<Vec<EntityRow>, StoreError> {
            Ok(vec![])
        }
    }

    const ORG_CREATED: &str =
        r#"{"action":"created","organization":{"id":6,"login":"Octocoders"},"repository":{"full_name":"o/r"}}"#;

    #[test]
    fn panic_inside_processing_becomes_fault_with_event_description() {
        let dispatcher = EventDispatcher::new(PanickingStore);
        let err = dispatcher.process(&WebhookEnvelope::new("organization", ORG_CREATED)).unwrap_err();
        match err {
            DispatchError::Fault { event, message } => {
                assert_eq!(event.event_type, "organization");
                assert_eq!(event.action.as_deref(), Some("created"));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clock_value_becomes_the_version_marker() {
        let dispatcher = EventDispatcher::with_clock(InMemoryEntityStore::new(), || 1_700_000_000);
        dispatcher.process(&WebhookEnvelope::new("organization", ORG_CREATED)).unwrap();
        let rows = dispatcher.store().list(EntityKind::Organization).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].versions, vec![1_700_000_000]);
    }

    #[test]
    fn unknown_type_never_parses_payload() {
        let dispatcher = EventDispatcher::new(InMemoryEntityStore::new());
        let outcome = dispatcher.process(&WebhookEnvelope::new("push", b"not json".to_vec())).unwrap();
        assert_eq!(outcome, DispatchOutcome::UnknownType);
    }
}
