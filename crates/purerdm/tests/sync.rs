//! End-to-end engine tests: fakes for the submission semantics, wiremock
//! for the full HTTP stack.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use purerdm::config::SyncConfig;
use purerdm::engine::SyncEngine;
use purerdm::submit::SubmissionOutcome;
use purerdm::vocab::LanguageTable;
use purerdm_core::traits::{RecordHit, RecordPage, SyncStore};
use purerdm_core::Counters;
use purerdm_store::MemorySyncStore;

use support::{recid, uuid, FakePure, FakeRdm};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn engine(
    pure: FakePure,
    rdm: FakeRdm,
    config: SyncConfig,
) -> SyncEngine<FakePure, FakeRdm, MemorySyncStore> {
    SyncEngine::new(
        pure,
        rdm,
        MemorySyncStore::new(),
        LanguageTable::from_entries([("English", "eng")]),
        config,
        Arc::new(Counters::new()),
    )
}

fn open_record() -> serde_json::Value {
    json!({
        "uuid": uuid().as_str(),
        "title": "A record",
        "openAccessPermissions": [{"value": "Open"}],
        "types": [{"value": "Article"}],
    })
}

fn single_hit_page(id: &str) -> RecordPage {
    RecordPage {
        total: 1,
        hits: vec![RecordHit {
            recid: recid(id),
            metadata: json!({"recid": id}),
        }],
    }
}

// ============================================================================
// Scheduled runs
// ============================================================================

#[tokio::test]
async fn scheduled_run_syncs_changed_records_and_marks_dates() {
    let pure = FakePure::new();
    pure.add_record(open_record());
    pure.add_change(day(10), uuid());
    let rdm = FakeRdm::new();
    rdm.push_query_page(single_hit_page("abcde-12345"));

    let config = SyncConfig {
        lookback_days: 1,
        ..SyncConfig::immediate()
    };
    let engine = engine(pure, rdm.clone(), config);
    let snapshot = engine.run_scheduled_synchronization(day(10)).await.unwrap();

    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.metadata_success, 1);
    assert_eq!(rdm.created.lock().unwrap().len(), 1);

    let store = engine.store();
    assert_eq!(store.successes().unwrap(), vec![uuid()]);
    assert_eq!(
        store.seen_records().unwrap(),
        vec![(uuid(), recid("abcde-12345"))]
    );
    assert!(store.pending_retries().unwrap().is_empty());
    assert_eq!(store.synced_dates().unwrap(), vec![day(10)]);
}

#[tokio::test]
async fn already_synced_dates_are_not_revisited() {
    let pure = FakePure::new();
    pure.add_record(open_record());
    pure.add_change(day(10), uuid());
    let rdm = FakeRdm::new();

    let config = SyncConfig {
        lookback_days: 1,
        ..SyncConfig::immediate()
    };
    let engine = engine(pure, rdm.clone(), config);
    engine.store().add_synced_date(day(10)).unwrap();

    engine.run_scheduled_synchronization(day(10)).await.unwrap();
    assert!(rdm.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_submission_queues_and_next_run_drains() {
    let pure = FakePure::new();
    pure.add_record(open_record());
    pure.add_change(day(10), uuid());
    let rdm = FakeRdm::new();
    rdm.fail_next_creates();

    let config = SyncConfig {
        lookback_days: 1,
        ..SyncConfig::immediate()
    };
    let engine = engine(pure, rdm.clone(), config);
    let snapshot = engine.run_scheduled_synchronization(day(10)).await.unwrap();

    assert_eq!(snapshot.metadata_error, 1);
    assert_eq!(engine.store().pending_retries().unwrap(), vec![uuid()]);
    // the date still advances; the identity is tracked by the queue
    assert_eq!(engine.store().synced_dates().unwrap(), vec![day(10)]);

    // next run: the repository is healthy again
    rdm.fail_create.store(false, Ordering::SeqCst);
    rdm.push_query_page(single_hit_page("abcde-12345"));
    engine.run_scheduled_synchronization(day(10)).await.unwrap();

    assert!(engine.store().pending_retries().unwrap().is_empty());
    assert_eq!(engine.store().successes().unwrap(), vec![uuid()]);
}

#[tokio::test]
async fn initial_run_ignores_history() {
    let pure = FakePure::new();
    pure.add_record(open_record());
    pure.add_change(day(10), uuid());
    let rdm = FakeRdm::new();
    rdm.push_query_page(single_hit_page("abcde-12345"));

    let config = SyncConfig {
        lookback_days: 1,
        ..SyncConfig::immediate()
    };
    let engine = engine(pure, rdm.clone(), config);
    engine.store().add_synced_date(day(10)).unwrap();

    engine.run_initial_synchronization(day(10)).await.unwrap();
    assert_eq!(rdm.created.lock().unwrap().len(), 1);
}

// ============================================================================
// Recid resolution
// ============================================================================

#[tokio::test]
async fn older_duplicates_are_deleted_on_resolution() {
    let pure = FakePure::new();
    pure.add_record(open_record());
    let rdm = FakeRdm::new();
    rdm.push_query_page(RecordPage {
        total: 2,
        hits: vec![
            RecordHit {
                recid: recid("abcde-22222"),
                metadata: json!({"recid": "abcde-22222"}),
            },
            RecordHit {
                recid: recid("abcde-11111"),
                metadata: json!({"recid": "abcde-11111"}),
            },
        ],
    });

    let engine = engine(pure, rdm.clone(), SyncConfig::immediate());
    let outcome = engine.push_record_by_uuid(&uuid()).await.unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::Completed {
            recid: recid("abcde-22222")
        }
    );
    let deleted = rdm.deleted.lock().unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].as_str(), "abcde-11111");
    assert_eq!(engine.counters().snapshot().delete_success, 1);
}

#[tokio::test]
async fn versioning_keeps_older_records_and_relinks_them() {
    let pure = FakePure::new();
    pure.add_record(open_record());
    let rdm = FakeRdm::new();
    // version lookup before the create
    rdm.push_query_page(single_hit_page("abcde-11111"));
    // recid resolution after the create
    rdm.push_query_page(RecordPage {
        total: 2,
        hits: vec![
            RecordHit {
                recid: recid("abcde-22222"),
                metadata: json!({"recid": "abcde-22222"}),
            },
            RecordHit {
                recid: recid("abcde-11111"),
                metadata: json!({"recid": "abcde-11111"}),
            },
        ],
    });
    // chain relink after the submission
    rdm.push_query_page(RecordPage {
        total: 2,
        hits: vec![
            RecordHit {
                recid: recid("abcde-22222"),
                metadata: json!({"recid": "abcde-22222"}),
            },
            RecordHit {
                recid: recid("abcde-11111"),
                metadata: json!({"recid": "abcde-11111"}),
            },
        ],
    });

    let config = SyncConfig {
        versioning_enabled: true,
        ..SyncConfig::immediate()
    };
    let engine = engine(pure, rdm.clone(), config);
    let outcome = engine.push_record_by_uuid(&uuid()).await.unwrap();

    assert!(matches!(outcome, SubmissionOutcome::Completed { .. }));
    assert!(rdm.deleted.lock().unwrap().is_empty());

    // the new record was tagged v2 at creation time
    let created = rdm.created.lock().unwrap();
    assert_eq!(created[0]["metadataVersion"], "v2");
    assert_eq!(created[0]["metadataOtherVersions"], json!(["abcde-11111"]));

    // the older sibling was rewritten to point back at the newcomer
    let replaced = rdm.replaced.lock().unwrap();
    assert_eq!(replaced.len(), 1);
    assert_eq!(replaced[0].0.as_str(), "abcde-11111");
    assert_eq!(replaced[0].1["metadataVersion"], "v1");
    assert_eq!(replaced[0].1["metadataOtherVersions"], json!(["abcde-22222"]));
}

#[tokio::test]
async fn missing_source_record_is_not_queued() {
    let pure = FakePure::new();
    let rdm = FakeRdm::new();
    let engine = engine(pure, rdm, SyncConfig::immediate());

    let outcome = engine.push_record_by_uuid(&uuid()).await.unwrap();
    assert_eq!(outcome, SubmissionOutcome::SourceMissing);
    assert!(engine.store().pending_retries().unwrap().is_empty());
}

#[tokio::test]
async fn vanished_source_record_leaves_the_retry_queue() {
    let pure = FakePure::new();
    let rdm = FakeRdm::new();
    let engine = engine(pure, rdm, SyncConfig::immediate());

    // queued on an earlier run, deleted in Pure since
    engine.store().queue_retry(&uuid()).unwrap();
    engine.run_scheduled_synchronization(day(10)).await.unwrap();

    assert!(engine.store().pending_retries().unwrap().is_empty());
    assert!(engine.store().successes().unwrap().is_empty());
}

// ============================================================================
// User runs
// ============================================================================

#[tokio::test]
async fn user_run_only_pushes_the_persons_records() {
    let other_uuid =
        purerdm_core::types::RecordUuid::new("99999999-0000-0000-0000-000000000999").unwrap();

    let pure = FakePure::new();
    let mut record = open_record();
    record["personAssociations"] = json!([{"person": {"externalId": "per-1"}}]);
    pure.add_record(record);
    pure.add_record(json!({
        "uuid": other_uuid.as_str(),
        "title": "Someone else's record",
        "openAccessPermissions": [{"value": "Open"}],
    }));
    pure.add_change(day(10), uuid());
    pure.add_change(day(10), other_uuid);

    let rdm = FakeRdm::new();
    rdm.push_query_page(single_hit_page("abcde-12345"));

    let config = SyncConfig {
        lookback_days: 1,
        ..SyncConfig::immediate()
    };
    let engine = engine(pure, rdm.clone(), config);
    engine
        .run_user_synchronization("per-1", day(10))
        .await
        .unwrap();

    assert_eq!(rdm.created.lock().unwrap().len(), 1);
    assert_eq!(engine.store().successes().unwrap(), vec![uuid()]);
    // user runs never advance the shared history
    assert!(engine.store().synced_dates().unwrap().is_empty());
}

// ============================================================================
// Full HTTP stack
// ============================================================================

#[tokio::test]
async fn full_stack_sync_through_mock_servers() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let pure_server = MockServer::start().await;
    let rdm_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/changes/2024-03-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"uuid": uuid().as_str()}],
        })))
        .mount(&pure_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/research-outputs/{}", uuid())))
        .respond_with(ResponseTemplate::new(200).set_body_json(open_record()))
        .mount(&pure_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/records"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&rdm_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {
                "total": 1,
                "hits": [{"metadata": {"recid": "abcde-12345"}}],
            },
        })))
        .mount(&rdm_server)
        .await;

    let counters = Arc::new(Counters::new());
    let staging = tempfile::tempdir().unwrap();
    let pure = purerdm_http::PureClient::new(
        &pure_server.uri(),
        Some("sekrit".to_string()),
        staging.path(),
        Arc::clone(&counters),
    )
    .unwrap();
    let rdm = purerdm_http::RdmClient::new(
        &rdm_server.uri(),
        Arc::clone(&counters),
        purerdm_http::Pacing::none(),
    )
    .unwrap();

    let config = SyncConfig {
        lookback_days: 1,
        ..SyncConfig::immediate()
    };
    let engine = SyncEngine::new(
        pure,
        rdm,
        MemorySyncStore::new(),
        LanguageTable::from_entries([("English", "eng")]),
        config,
        Arc::clone(&counters),
    );

    let snapshot = engine.run_scheduled_synchronization(day(10)).await.unwrap();

    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.metadata_success, 1);
    assert_eq!(snapshot.http_responses.get(&201), Some(&1));
    assert_eq!(engine.store().successes().unwrap(), vec![uuid()]);
    assert_eq!(
        engine.store().seen_records().unwrap(),
        vec![(uuid(), recid("abcde-12345"))]
    );
}
