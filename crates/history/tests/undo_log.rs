//! Integration tests for snapshot capture, the undo log, and the sweep.
//!
//! - Capture of flat and aggregate entities
//! - Create/perform round trip and single-shot consumption
//! - Expiry boundaries and actor isolation
//! - Sweep interaction with perform

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use mrp_db::codec::CodecRegistry;
use mrp_db::models::undo_entry::CreateUndoEntry;
use mrp_db::repositories::UndoLogRepo;
use mrp_events::EventBus;
use mrp_history::sweep::{sweep_once, SweepReport};
use mrp_history::{History, HistoryConfig, HistoryError, Notifier};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn history(pool: &PgPool) -> History {
    History::new(
        pool.clone(),
        CodecRegistry::with_catalog(),
        Notifier::noop(),
        &HistoryConfig::default(),
    )
}

async fn seed_part(pool: &PgPool, ipn: &str, description: &str) {
    sqlx::query("INSERT INTO parts (ipn, description) VALUES ($1, $2)")
        .bind(ipn)
        .bind(description)
        .execute(pool)
        .await
        .unwrap();
}

async fn delete_part(pool: &PgPool, ipn: &str) {
    sqlx::query("DELETE FROM parts WHERE ipn = $1")
        .bind(ipn)
        .execute(pool)
        .await
        .unwrap();
}

async fn part_description(pool: &PgPool, ipn: &str) -> Option<String> {
    sqlx::query_scalar("SELECT description FROM parts WHERE ipn = $1")
        .bind(ipn)
        .fetch_optional(pool)
        .await
        .unwrap()
}

/// Insert an entry for IPN-1 created `age` ago with a 24h lifetime.
async fn backdated_entry(pool: &PgPool, actor: &str, age: Duration) -> i64 {
    let created_at = Utc::now() - age;
    UndoLogRepo::insert(
        pool,
        &CreateUndoEntry {
            actor: actor.to_string(),
            action: "delete".to_string(),
            entity_type: "part".to_string(),
            entity_id: "IPN-1".to_string(),
            snapshot_payload: json!({"__v": 1, "ipn": "IPN-1", "description": "Resistor"}),
            created_at,
            expires_at: created_at + Duration::hours(24),
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Test: capture
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_capture_aggregate_includes_children(pool: PgPool) {
    let history = history(&pool);
    sqlx::query("INSERT INTO purchase_orders (id, vendor_id) VALUES ('PO-1', 'V-1')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO po_lines (po_id, line_no, ipn) VALUES ('PO-1', 1, 'IPN-A')")
        .execute(&pool)
        .await
        .unwrap();

    let snapshot = history.capture.capture("purchase_order", "PO-1").await.unwrap();

    assert_eq!(snapshot.field("vendor_id"), Some(&json!("V-1")));
    assert_eq!(snapshot.children().map(<[_]>::len), Some(1));
    assert_eq!(snapshot.to_value()["__v"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_capture_missing_entity_is_not_found(pool: PgPool) {
    let history = history(&pool);
    assert_matches!(
        history.capture.capture("part", "IPN-404").await,
        Err(HistoryError::NotFound { .. })
    );
    assert_matches!(
        history.capture.capture("accounts", "A-1").await,
        Err(HistoryError::InvalidIdentifier(_))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_capture_child_table_is_invalid_identifier(pool: PgPool) {
    let history = history(&pool);
    sqlx::query("INSERT INTO purchase_orders (id) VALUES ('PO-1')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO po_lines (po_id, line_no, ipn) VALUES ('PO-1', 1, 'IPN-A')")
        .execute(&pool)
        .await
        .unwrap();

    assert_matches!(
        history.capture.capture("po_lines", "PO-1").await,
        Err(HistoryError::InvalidIdentifier(name)) if name == "po_lines"
    );
    assert_matches!(
        history.undo.create("alice", "delete", "po_lines", "PO-1").await,
        Err(HistoryError::InvalidIdentifier(_))
    );
}

// ---------------------------------------------------------------------------
// Test: create and perform
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_perform_restores_deleted_entity_once(pool: PgPool) {
    let history = history(&pool);
    seed_part(&pool, "IPN-1", "Resistor").await;

    let id = history
        .undo
        .create("alice", "delete", "part", "IPN-1")
        .await
        .unwrap();
    delete_part(&pool, "IPN-1").await;

    let summary = history.undo.perform("alice", id).await.unwrap();
    assert_eq!(summary.entry_id, id);
    assert_eq!(summary.action, "delete");
    assert_eq!(summary.entity_type, "part");
    assert_eq!(summary.entity_id, "IPN-1");
    assert_eq!(part_description(&pool, "IPN-1").await.as_deref(), Some("Resistor"));

    assert_matches!(
        history.undo.perform("alice", id).await,
        Err(HistoryError::NotFound { .. })
    );
    assert!(history.undo.list("alice", None).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_sets_expiry_from_ttl(pool: PgPool) {
    let config = HistoryConfig {
        undo_ttl: Duration::hours(2),
        ..HistoryConfig::default()
    };
    let history = History::new(
        pool.clone(),
        CodecRegistry::with_catalog(),
        Notifier::noop(),
        &config,
    );
    seed_part(&pool, "IPN-1", "Resistor").await;

    history.undo.create("alice", "update", "parts", "IPN-1").await.unwrap();

    let entries = history.undo.list("alice", None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].expires_at - entries[0].created_at, Duration::hours(2));
    assert_eq!(entries[0].snapshot_payload["description"], "Resistor");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_for_missing_entity_is_not_found(pool: PgPool) {
    let history = history(&pool);
    assert_matches!(
        history.undo.create("alice", "delete", "part", "IPN-404").await,
        Err(HistoryError::NotFound { .. })
    );
    assert!(history.undo.list("alice", None).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_perform_restores_once(pool: PgPool) {
    let history = history(&pool);
    let id = backdated_entry(&pool, "alice", Duration::minutes(5)).await;

    let (a, b) = tokio::join!(
        history.undo.perform("alice", id),
        history.undo.perform("alice", id)
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(HistoryError::NotFound { .. }))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_perform_broadcasts_restore_event(pool: PgPool) {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let history = History::new(
        pool.clone(),
        CodecRegistry::with_catalog(),
        Notifier::new(Arc::new(mrp_history::notifier::NoopNotifier), bus.clone()),
        &HistoryConfig::default(),
    );
    let id = backdated_entry(&pool, "alice", Duration::minutes(5)).await;

    history.undo.perform("alice", id).await.unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, "parts_restore");
    assert_eq!(event.entity_id, "IPN-1");
    assert_eq!(event.verb, "restore");
    assert_eq!(event.actor.as_deref(), Some("alice"));
}

// ---------------------------------------------------------------------------
// Test: expiry and isolation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_entry_usable_until_expiry(pool: PgPool) {
    let history = history(&pool);
    let id = backdated_entry(&pool, "alice", Duration::hours(24) - Duration::minutes(1)).await;

    let listed = history.undo.list("alice", None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);

    history.undo.perform("alice", id).await.unwrap();
    assert_eq!(part_description(&pool, "IPN-1").await.as_deref(), Some("Resistor"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_entry_is_inert(pool: PgPool) {
    let history = history(&pool);
    let id = backdated_entry(&pool, "alice", Duration::hours(24) + Duration::seconds(1)).await;

    assert!(history.undo.list("alice", None).await.unwrap().is_empty());
    assert_matches!(
        history.undo.perform("alice", id).await,
        Err(HistoryError::Expired(expired)) if expired == id
    );
    assert_eq!(part_description(&pool, "IPN-1").await, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_actor_cannot_list_or_perform(pool: PgPool) {
    let history = history(&pool);
    let id = backdated_entry(&pool, "alice", Duration::minutes(5)).await;

    assert!(history.undo.list("bob", None).await.unwrap().is_empty());
    assert_matches!(
        history.undo.perform("bob", id).await,
        Err(HistoryError::NotFound { .. })
    );
    assert_eq!(history.undo.list("alice", None).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_limit_is_clamped(pool: PgPool) {
    let history = history(&pool);
    for _ in 0..3 {
        backdated_entry(&pool, "alice", Duration::minutes(5)).await;
    }

    assert_eq!(history.undo.list("alice", Some(2)).await.unwrap().len(), 2);
    assert_eq!(history.undo.list("alice", Some(0)).await.unwrap().len(), 1);
    assert_eq!(history.undo.list("alice", Some(10_000)).await.unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Test: sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_perform_after_sweep_is_not_found(pool: PgPool) {
    let history = history(&pool);
    let expired = backdated_entry(&pool, "alice", Duration::hours(30)).await;
    let live = backdated_entry(&pool, "alice", Duration::minutes(5)).await;

    let report = sweep_once(&pool, Utc::now(), None).await.unwrap();
    assert_eq!(
        report,
        SweepReport {
            undo_entries: 1,
            change_records: 0
        }
    );

    assert_matches!(
        history.undo.perform("alice", expired).await,
        Err(HistoryError::NotFound { .. })
    );
    history.undo.perform("alice", live).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_prunes_change_records_when_configured(pool: PgPool) {
    sqlx::query(
        "INSERT INTO change_history (entity_collection, entity_id, operation, after_payload, actor, created_at) \
         VALUES ('parts', 'IPN-1', 'create', '{}', 'alice', now() - interval '40 days'), \
                ('parts', 'IPN-2', 'create', '{}', 'alice', now())",
    )
    .execute(&pool)
    .await
    .unwrap();

    let untouched = sweep_once(&pool, Utc::now(), None).await.unwrap();
    assert_eq!(untouched.change_records, 0);

    let pruned = sweep_once(&pool, Utc::now(), Some(Duration::days(30))).await.unwrap();
    assert_eq!(pruned.change_records, 1);

    let remaining: Vec<String> = sqlx::query_scalar("SELECT entity_id FROM change_history")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, vec!["IPN-2"]);
}
