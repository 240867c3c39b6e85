use ghmeta_core::dispatch::rows;
use ghmeta_core::event::types::Organization;
use ghmeta_core::{sum256, Cancellation, ColumnValue, EntityKind, EntityStore, EventDispatcher, InMemoryEntityStore,
                  StoreError, UpsertOutcome, UpsertRequest, WebhookEnvelope};
use test_support::{unique_id, with_store};

fn organization(id: i64, login: &str) -> Organization {
    Organization { id,
                   login: login.to_string(),
                   node_id: format!("node-{id}"),
                   ..Default::default() }
}

#[test]
fn first_write_inserts_then_duplicates_append_versions() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_store(|store| {
        let id = unique_id();
        let first = rows::organization(&organization(id, "octo"), 100);
        let second = rows::organization(&organization(id, "renamed"), 200);
        assert_eq!(store.upsert(&first, &Cancellation::new()).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert(&second, &Cancellation::new()).unwrap(), UpsertOutcome::Appended);
        assert_eq!(store.upsert(&first, &Cancellation::new()).unwrap(), UpsertOutcome::Appended);

        let row = store.find(EntityKind::Organization, &sum256(&[id])).unwrap().expect("row");
        assert_eq!(row.versions, vec![100, 200, 100]);
        assert_eq!(row.text("login"), Some("octo"));
        assert_eq!(row.int("id"), Some(id));
    });
}

#[test]
fn cancelled_write_leaves_nothing_behind() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_store(|store| {
        let id = unique_id();
        let cancel = Cancellation::new();
        cancel.cancel();
        let err = store.upsert(&rows::organization(&organization(id, "octo"), 1), &cancel).unwrap_err();
        assert_eq!(err, StoreError::Cancelled);
        assert!(store.find(EntityKind::Organization, &sum256(&[id])).unwrap().is_none());
    });
}

#[test]
fn contract_violations_never_reach_the_database() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_store(|store| {
        let id = unique_id();
        let mut request = rows::organization(&organization(id, "octo"), 1);
        request.values[0] = ColumnValue::BigInt(1);
        let err = store.upsert(&request, &Cancellation::new()).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch { .. }), "{err:?}");

        let empty = UpsertRequest::new(EntityKind::Organization, vec![], 1, request.values.clone());
        assert!(store.upsert(&empty, &Cancellation::new()).is_err());
        assert!(store.find(EntityKind::Organization, &sum256(&[id])).unwrap().is_none());
    });
}

#[test]
fn concurrent_duplicates_produce_one_row() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_store(|store| {
        let id = unique_id();
        let before = store.count(EntityKind::Organization).unwrap();
        let request = rows::organization(&organization(id, "octo"), 7);
        let outcomes: Vec<UpsertOutcome> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| store.upsert(&request, &Cancellation::new())))
                                        .collect();
            handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });
        assert_eq!(outcomes.iter().filter(|o| **o == UpsertOutcome::Inserted).count(), 1);
        let row = store.find(EntityKind::Organization, &sum256(&[id])).unwrap().expect("row");
        assert_eq!(row.versions, vec![7; 8]);
        assert!(store.count(EntityKind::Organization).unwrap() > before);
    });
}

#[test]
fn postgres_rows_match_the_in_memory_backend() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    let fixture = concat!(env!("CARGO_MANIFEST_DIR"), "/../ghmeta-core/tests/fixtures/pull_request_event.json");
    let mut payload: serde_json::Value = serde_json::from_slice(&std::fs::read(fixture).unwrap()).unwrap();
    let repo_id = unique_id();
    payload["repository"]["id"] = repo_id.into();
    let envelope = WebhookEnvelope::new("pull_request", serde_json::to_vec(&payload).unwrap());

    with_store(|store| {
        let pg = EventDispatcher::with_clock(store, || 1_700_000_000);
        let memory = EventDispatcher::with_clock(InMemoryEntityStore::new(), || 1_700_000_000);
        pg.process(&envelope).unwrap();
        memory.process(&envelope).unwrap();

        let identity = sum256(&[repo_id, 279147437]);
        let stored = pg.store().find(EntityKind::PullRequest, &identity).unwrap().expect("pg row");
        let expected = memory.store().find(EntityKind::PullRequest, &identity).unwrap().expect("memory row");
        assert_eq!(stored, expected);
        assert_eq!(stored.get("labels"), Some(&ColumnValue::TextArray(vec![])));
    });
}
