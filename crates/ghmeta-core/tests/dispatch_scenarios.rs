//! Escenarios end-to-end del despachador contra el backend en memoria.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use ghmeta_core::{Cancellation, DispatchError, DispatchOutcome, EntityKind, EntityRow, EntityStore, EventDispatcher,
                  EventType, InMemoryEntityStore, StoreError, UpsertOutcome, WebhookEnvelope};
use rayon::prelude::*;

fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read(&path).unwrap_or_else(|e| panic!("fixture {path}: {e}"))
}

fn fixture_for(ty: EventType) -> Vec<u8> {
    fixture(&format!("{}_event.json", ty.as_str()))
}

fn with_action(payload: &[u8], action: &str) -> Vec<u8> {
    let mut v: serde_json::Value = serde_json::from_slice(payload).unwrap();
    v["action"] = serde_json::Value::String(action.to_string());
    serde_json::to_vec(&v).unwrap()
}

/// Reloj determinista: 1000, 1001, 1002…
fn ticking_dispatcher() -> EventDispatcher<InMemoryEntityStore> {
    let tick = Arc::new(AtomicI64::new(1000));
    EventDispatcher::with_clock(InMemoryEntityStore::new(), move || tick.fetch_add(1, Ordering::SeqCst))
}

fn rows(d: &EventDispatcher<InMemoryEntityStore>, kind: EntityKind) -> Vec<EntityRow> {
    d.store().list(kind).unwrap()
}

#[test]
fn installation_created_persists_attached_repository() {
    let d = ticking_dispatcher();
    let out = d.process(&WebhookEnvelope::new("installation", fixture("installation_event.json"))).unwrap();
    assert_eq!(out, DispatchOutcome::Persisted(vec![UpsertOutcome::Inserted]));

    let matching: Vec<_> = rows(&d, EntityKind::Repository).into_iter()
                                                           .filter(|r| r.text("name") == Some("cuckoo") && r.flag("fork") == Some(false))
                                                           .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].int("id"), Some(85718512));
    assert_eq!(matching[0].identity, ghmeta_core::sum256(&[85718512]));
}

#[test]
fn installation_repositories_added_persists_each_repository() {
    let d = ticking_dispatcher();
    let out = d.process(&WebhookEnvelope::new("installation_repositories",
                                              fixture("installation_repositories_event.json")))
               .unwrap();
    assert_eq!(out.writes(), 2);
    let mut ids: Vec<i64> = rows(&d, EntityKind::Repository).iter().filter_map(|r| r.int("id")).collect();
    ids.sort();
    assert_eq!(ids, vec![1296269, 1296270]);
}

#[test]
fn repository_event_fields_are_mapped() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("repository", fixture("repository_event.json"))).unwrap();
    let all = rows(&d, EntityKind::Repository);
    assert_eq!(all.len(), 1);
    let row = &all[0];
    assert_eq!(row.int("id"), Some(118));
    assert_eq!(row.text("language"), Some("Ruby"));
    assert_eq!(row.text("name"), Some("Hello-World"));
    assert_eq!(row.flag("fork"), Some(false));
    assert_eq!(row.text("default_branch"), Some("master"));
    assert_eq!(row.text("owner_login"), Some("Codertocat"));
    assert_eq!(row.text("description"), Some(""));
}

#[test]
fn organization_member_added_is_persisted() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("organization", fixture("organization_event.json"))).unwrap();
    let all = rows(&d, EntityKind::Organization);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].int("id"), Some(6));
    assert_eq!(all[0].text("login"), Some("Octocoders"));
    assert_eq!(all[0].text("node_id"), Some("MDEyOk9yZ2FuaXphdGlvbjY="));
    assert_eq!(all[0].int("collaborators"), Some(0));
}

#[test]
fn issue_comment_on_plain_issue_goes_to_issue_comments() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("issue_comment", fixture("issue_comment_event.json"))).unwrap();
    let body: Vec<String> = rows(&d, EntityKind::IssueComment).iter()
                                                              .filter(|r| {
                                                                  r.int("id") == Some(2)
                                                                  && r.int("issue_number") == Some(1)
                                                                  && r.text("user_login") == Some("Codertocat")
                                                              })
                                                              .filter_map(|r| r.text("body").map(str::to_string))
                                                              .collect();
    assert_eq!(body, vec!["You are totally right! I'll get this fixed right away.".to_string()]);
    assert!(rows(&d, EntityKind::PullRequestReviewComment).is_empty());
}

#[test]
fn issue_comment_on_pull_request_goes_to_pull_request_comments() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("issue_comment", fixture("issue_comment_on_pull_request_event.json")))
     .unwrap();
    assert!(rows(&d, EntityKind::IssueComment).is_empty());
    let all = rows(&d, EntityKind::PullRequestReviewComment);
    assert_eq!(all.len(), 1);
    let row = &all[0];
    assert_eq!(row.identity, ghmeta_core::sum256(&[118, 444500099, 492700500]));
    assert_eq!(row.int("pull_request_number"), Some(2));
    assert_eq!(row.text("body"), Some("Looks good, merging after CI."));
    assert_eq!(row.text("diff_hunk"), Some(""));
    assert_eq!(row.text("commit_id"), Some(""));
    assert_eq!(row.int("position"), Some(0));
}

#[test]
fn issues_event_keeps_assignees_and_repository_name() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("issues", fixture("issues_event.json"))).unwrap();
    let all = rows(&d, EntityKind::Issue);
    assert_eq!(all.len(), 1);
    let row = &all[0];
    assert_eq!(row.int("id"), Some(10));
    assert_eq!(row.int("number"), Some(1));
    assert_eq!(row.get("assignees"), Some(&ghmeta_core::ColumnValue::TextArray(vec!["Codertocat".into()])));
    assert_eq!(row.get("labels"), Some(&ghmeta_core::ColumnValue::TextArray(vec!["bug".into()])));
    assert_eq!(row.text("repository_name"), Some("Hello-World"));
    assert_eq!(row.text("milestone_title"), Some("v1.0"));
}

#[test]
fn pull_request_opened_maps_base_and_head() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("pull_request", fixture("pull_request_event.json"))).unwrap();
    let all = rows(&d, EntityKind::PullRequest);
    let found: Vec<_> = all.iter()
                           .filter(|r| {
                               r.int("number") == Some(2)
                               && r.text("base_sha") == Some("78a96099c3f442d7f6e8d1a7d07090091993e65a")
                               && r.text("head_sha") == Some("14977a7b5485400124827221a04bfb474bcd72d1")
                           })
                           .filter_map(|r| r.text("title"))
                           .collect();
    assert_eq!(found, vec!["Update the README with new information."]);
    assert_eq!(all[0].text("node_id"), Some("MDExOlB1bGxSZXF1ZXN0Mjc5MTQ3NDM3"));
    assert_eq!(all[0].flag("mergeable"), Some(false));
    assert_eq!(all[0].text("merged_by_login"), Some(""));
}

#[test]
fn pull_request_review_submitted_is_persisted() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("pull_request_review", fixture("pull_request_review_event.json")))
     .unwrap();
    let ids: Vec<i64> = rows(&d, EntityKind::PullRequestReview).iter()
                                                               .filter(|r| {
                                                                   r.text("commit_id")
                                                                   == Some("14977a7b5485400124827221a04bfb474bcd72d1")
                                                                   && r.text("user_login") == Some("Codertocat")
                                                               })
                                                               .filter_map(|r| r.int("id"))
                                                               .collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn explicit_nulls_in_plain_fields_are_stored_as_zero_values() {
    let d = ticking_dispatcher();
    let mut review: serde_json::Value = serde_json::from_slice(&fixture("pull_request_review_event.json")).unwrap();
    review["review"]["commit_id"] = serde_json::Value::Null;
    review["review"]["state"] = serde_json::Value::Null;
    let out = d.process(&WebhookEnvelope::new("pull_request_review", serde_json::to_vec(&review).unwrap()))
               .unwrap();
    assert_eq!(out, DispatchOutcome::Persisted(vec![UpsertOutcome::Inserted]));
    let stored = rows(&d, EntityKind::PullRequestReview);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text("commit_id"), Some(""));
    assert_eq!(stored[0].text("state"), Some(""));
    assert_eq!(stored[0].int("id"), Some(2));

    let mut comment: serde_json::Value =
        serde_json::from_slice(&fixture("pull_request_review_comment_event.json")).unwrap();
    comment["comment"]["diff_hunk"] = serde_json::Value::Null;
    comment["pull_request"]["additions"] = serde_json::Value::Null;
    comment["pull_request"]["labels"] = serde_json::Value::Null;
    d.process(&WebhookEnvelope::new("pull_request_review_comment", serde_json::to_vec(&comment).unwrap()))
     .unwrap();
    let stored = rows(&d, EntityKind::PullRequestReviewComment);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text("diff_hunk"), Some(""));
    assert_eq!(stored[0].text("path"), Some("README.md"));
}

#[test]
fn pull_request_review_comment_keeps_diff_hunk() {
    let d = ticking_dispatcher();
    d.process(&WebhookEnvelope::new("pull_request_review_comment",
                                    fixture("pull_request_review_comment_event.json")))
     .unwrap();
    let all = rows(&d, EntityKind::PullRequestReviewComment);
    let found: Vec<_> = all.iter()
                           .filter(|r| {
                               r.text("commit_id") == Some("14977a7b5485400124827221a04bfb474bcd72d1")
                               && r.text("path") == Some("README.md")
                               && r.text("user_login") == Some("Codertocat")
                           })
                           .filter_map(|r| r.text("diff_hunk"))
                           .collect();
    assert_eq!(found, vec!["@@ -1 +1 @@\n-# Hello-World"]);
    assert_eq!(all[0].int("pull_request_review_id"), Some(237895671));
}

#[test]
fn repeated_delivery_appends_a_version_instead_of_a_row() {
    let d = ticking_dispatcher();
    let env = WebhookEnvelope::new("repository", fixture("repository_event.json"));
    assert_eq!(d.process(&env).unwrap(), DispatchOutcome::Persisted(vec![UpsertOutcome::Inserted]));
    assert_eq!(d.process(&env).unwrap(), DispatchOutcome::Persisted(vec![UpsertOutcome::Appended]));
    let all = rows(&d, EntityKind::Repository);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].versions, vec![1000, 1001]);
}

#[test]
fn first_observation_defines_content() {
    let d = ticking_dispatcher();
    let original = fixture("repository_event.json");
    let mut edited: serde_json::Value = serde_json::from_slice(&original).unwrap();
    edited["action"] = "renamed".into();
    edited["repository"]["name"] = "Hello-Universe".into();
    edited["repository"]["language"] = "Rust".into();

    d.process(&WebhookEnvelope::new("repository", original)).unwrap();
    d.process(&WebhookEnvelope::new("repository", serde_json::to_vec(&edited).unwrap())).unwrap();

    let all = rows(&d, EntityKind::Repository);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].versions.len(), 2);
    assert_eq!(all[0].text("name"), Some("Hello-World"));
    assert_eq!(all[0].text("language"), Some("Ruby"));
}

#[test]
fn every_ignored_action_is_a_noop() {
    for ty in EventType::ALL {
        let base = fixture_for(ty);
        for action in ty.ignored_actions() {
            let d = ticking_dispatcher();
            let out = d.process(&WebhookEnvelope::new(ty.as_str(), with_action(&base, action)))
                       .unwrap_or_else(|e| panic!("{ty}/{action}: {e}"));
            assert_eq!(out, DispatchOutcome::Ignored { action: action.to_string() }, "{ty}/{action}");
            assert!(d.store().is_empty(), "{ty}/{action} wrote rows");
        }
    }
}

#[test]
fn every_significant_action_writes() {
    for ty in EventType::ALL {
        let base = fixture_for(ty);
        for action in ty.significant_actions() {
            let d = ticking_dispatcher();
            let out = d.process(&WebhookEnvelope::new(ty.as_str(), with_action(&base, action)))
                       .unwrap_or_else(|e| panic!("{ty}/{action}: {e}"));
            assert!(out.writes() >= 1, "{ty}/{action} -> {out:?}");
            assert_eq!(d.store().len(), out.writes(), "{ty}/{action}");
        }
    }
}

#[test]
fn unrecognized_action_is_a_noop() {
    let d = ticking_dispatcher();
    let payload = with_action(&fixture("pull_request_event.json"), "review_requested");
    let out = d.process(&WebhookEnvelope::new("pull_request", payload)).unwrap();
    assert_eq!(out, DispatchOutcome::Unrecognized { action: "review_requested".into() });
    assert!(d.store().is_empty());
}

#[test]
fn unknown_type_is_ignored_even_with_empty_payload() {
    let d = ticking_dispatcher();
    assert_eq!(d.process(&WebhookEnvelope::new("ignore", Vec::new())).unwrap(),
               DispatchOutcome::UnknownType);
}

#[test]
fn empty_payload_for_known_type_is_a_reported_error() {
    let d = ticking_dispatcher();
    let err = d.process(&WebhookEnvelope::new("repository", Vec::new())).unwrap_err();
    assert!(matches!(err, DispatchError::Payload { .. }), "{err:?}");
    assert_eq!(err.event().event_type, "repository");
    assert!(!err.is_retryable());
}

#[test]
fn extraction_failure_is_isolated_to_its_event() {
    let d = ticking_dispatcher();
    let broken = br#"{"action":"created","repository":{"full_name":"Codertocat/Hello-World"}}"#.to_vec();
    let err = d.process(&WebhookEnvelope::new("issue_comment", broken)).unwrap_err();
    match &err {
        DispatchError::Extraction { event, field } => {
            assert_eq!(*field, "issue");
            assert_eq!(event.action.as_deref(), Some("created"));
            assert_eq!(event.repository.as_deref(), Some("Codertocat/Hello-World"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(d.store().is_empty());

    let out = d.process(&WebhookEnvelope::new("issues", fixture("issues_event.json"))).unwrap();
    assert_eq!(out.writes(), 1);
}

#[test]
fn concurrent_duplicate_deliveries_converge_to_one_row() {
    let d = ticking_dispatcher();
    let env = WebhookEnvelope::new("pull_request", fixture("pull_request_event.json"));
    let outcomes: Vec<DispatchOutcome> = (0..32).into_par_iter().map(|_| d.process(&env).unwrap()).collect();

    let inserted = outcomes.iter()
                           .filter(|o| **o == DispatchOutcome::Persisted(vec![UpsertOutcome::Inserted]))
                           .count();
    assert_eq!(inserted, 1);
    let all = rows(&d, EntityKind::PullRequest);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].versions.len(), 32);
}

#[test]
fn cancelled_event_leaves_no_rows() {
    let d = ticking_dispatcher();
    let cancel = Cancellation::new();
    cancel.cancel();
    let err = d.process_with(&WebhookEnvelope::new("repository", fixture("repository_event.json")), &cancel)
               .unwrap_err();
    assert!(matches!(err, DispatchError::Store { source: StoreError::Cancelled, .. }), "{err:?}");
    assert!(d.store().is_empty());
}
