//! Periodic cleanup of expired undo entries and old change records.
//!
//! Reads never depend on this job: expired undo entries are already
//! invisible to `list` and `perform`. The sweep only reclaims space.

use chrono::Utc;
use mrp_core::types::Timestamp;
use mrp_db::repositories::{ChangeHistoryRepo, UndoLogRepo};
use mrp_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::config::HistoryConfig;

/// Rows removed by one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub undo_entries: u64,
    pub change_records: u64,
}

/// Run one pass at `now`.
///
/// Change records are pruned only when `change_retention` is set.
pub async fn sweep_once(
    pool: &DbPool,
    now: Timestamp,
    change_retention: Option<chrono::Duration>,
) -> Result<SweepReport, sqlx::Error> {
    let undo_entries = UndoLogRepo::delete_expired(pool, now).await?;
    let change_records = match change_retention {
        Some(retention) => ChangeHistoryRepo::delete_older_than(pool, now - retention).await?,
        None => 0,
    };
    Ok(SweepReport {
        undo_entries,
        change_records,
    })
}

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(pool: DbPool, config: HistoryConfig, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = config.sweep_interval.as_secs(),
        change_retention_days = config.change_retention.map(|d| d.num_days()),
        "Undo expiry sweep started"
    );

    let mut interval = tokio::time::interval(config.sweep_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Undo expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&pool, Utc::now(), config.change_retention).await {
                    Ok(report) if report == SweepReport::default() => {
                        tracing::debug!("Undo expiry sweep: nothing to purge");
                    }
                    Ok(report) => {
                        tracing::info!(
                            undo_entries = report.undo_entries,
                            change_records = report.change_records,
                            "Undo expiry sweep: purged rows"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Undo expiry sweep failed");
                    }
                }
            }
        }
    }
}
