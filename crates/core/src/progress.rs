use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Records untouched for this long are eligible for sweeping.
pub const DEFAULT_RETENTION_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Processing,
    Completed,
    Error,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Error)
    }
}

/// Point-in-time view of one analysis operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: String,
    pub status: Status,
    pub current_step: u32,
    pub total_chunks: u32,
    pub current_chunk: u32,
    pub chunk_progress: u8,
    pub message: String,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: Status::Pending,
            current_step: 0,
            total_chunks: 0,
            current_chunk: 0,
            chunk_progress: 0,
            message: "queued".to_string(),
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Overall completion percentage, weighting every chunk equally. For an
    /// errored record this reports how far the operation got.
    pub fn overall_percent(&self) -> u8 {
        match self.status {
            Status::Pending => 0,
            Status::Completed => 100,
            _ => {
                if self.total_chunks <= 1 {
                    self.chunk_progress.min(100)
                } else {
                    let done = self.current_chunk.saturating_sub(1) as f64;
                    let total = self.total_chunks as f64;
                    let pct =
                        done / total * 100.0 + self.chunk_progress as f64 / 100.0 * 100.0 / total;
                    pct.round().min(100.0) as u8
                }
            }
        }
    }
}

/// Keyed in-memory store of analysis progress. Cheap to clone; every clone
/// shares the same records.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    records: Arc<RwLock<HashMap<String, ProgressRecord>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new operation in `pending` state. Re-creating an id
    /// replaces the old record.
    pub async fn create(&self, id: &str) {
        let mut records = self.records.write().await;
        records.insert(id.to_string(), ProgressRecord::new(id));
    }

    /// Record a chunk-level milestone. The first update moves the record to
    /// `processing`. `current_chunk` never goes backwards, `chunk_progress`
    /// never goes backwards within a chunk and resets when the chunk
    /// advances. Updates against a terminal record are dropped.
    pub async fn update_chunk(
        &self,
        id: &str,
        current_chunk: u32,
        total_chunks: u32,
        chunk_progress: u8,
        message: &str,
    ) {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(id) else {
            return;
        };
        if record.status.is_terminal() {
            return;
        }
        record.status = Status::Processing;
        record.total_chunks = total_chunks;
        let chunk_progress = chunk_progress.min(100);
        if current_chunk > record.current_chunk {
            record.current_chunk = current_chunk;
            record.chunk_progress = chunk_progress;
        } else if current_chunk == record.current_chunk {
            record.chunk_progress = record.chunk_progress.max(chunk_progress);
        }
        record.message = message.to_string();
        record.current_step += 1;
        record.updated_at = Utc::now();
    }

    /// Mark the operation finished. Terminal.
    pub async fn complete(&self, id: &str, message: &str) {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(id) else {
            return;
        };
        if record.status.is_terminal() {
            return;
        }
        record.status = Status::Completed;
        record.chunk_progress = 100;
        record.message = message.to_string();
        record.current_step += 1;
        record.updated_at = Utc::now();
    }

    /// Mark the operation failed. Terminal.
    pub async fn fail(&self, id: &str, error: &str) {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(id) else {
            return;
        };
        if record.status.is_terminal() {
            return;
        }
        record.status = Status::Error;
        record.error = Some(error.to_string());
        record.message = "analysis failed".to_string();
        record.current_step += 1;
        record.updated_at = Utc::now();
    }

    pub async fn get(&self, id: &str) -> Option<ProgressRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Drop records whose last update is older than `max_age_minutes`.
    /// Returns how many were removed.
    pub async fn sweep(&self, max_age_minutes: i64) -> usize {
        let cutoff = Utc::now() - Duration::minutes(max_age_minutes);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.updated_at >= cutoff);
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, "swept stale progress records");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle_runs_pending_processing_completed() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;

        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.status, Status::Pending);
        assert_eq!(record.overall_percent(), 0);

        tracker.update_chunk("op", 1, 2, 10, "preparing chunk 1/2").await;
        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.status, Status::Processing);

        tracker.complete("op", "analysis completed").await;
        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.status, Status::Completed);
        assert_eq!(record.overall_percent(), 100);
    }

    #[tokio::test]
    async fn terminal_states_reject_updates() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;
        tracker.complete("op", "done").await;

        tracker.update_chunk("op", 2, 2, 50, "late update").await;
        tracker.fail("op", "late failure").await;

        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.status, Status::Completed);
        assert_eq!(record.message, "done");
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn chunk_progress_is_monotone_and_resets_per_chunk() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;

        for pct in [10, 30, 70, 100] {
            tracker.update_chunk("op", 1, 2, pct, "chunk 1").await;
            assert_eq!(tracker.get("op").await.unwrap().chunk_progress, pct);
        }

        tracker.update_chunk("op", 2, 2, 10, "chunk 2").await;
        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.current_chunk, 2);
        assert_eq!(record.chunk_progress, 10);

        // stale update from an earlier chunk cannot move anything backwards
        tracker.update_chunk("op", 1, 2, 70, "stale").await;
        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.current_chunk, 2);
        assert_eq!(record.chunk_progress, 10);
    }

    #[tokio::test]
    async fn percent_weights_chunks_equally() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;

        tracker.update_chunk("op", 1, 2, 30, "chunk 1").await;
        assert_eq!(tracker.get("op").await.unwrap().overall_percent(), 15);

        tracker.update_chunk("op", 2, 2, 70, "chunk 2").await;
        assert_eq!(tracker.get("op").await.unwrap().overall_percent(), 85);
    }

    #[tokio::test]
    async fn percent_for_single_chunk_is_chunk_progress() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;
        tracker.update_chunk("op", 1, 1, 70, "only chunk").await;
        assert_eq!(tracker.get("op").await.unwrap().overall_percent(), 70);
    }

    #[tokio::test]
    async fn errored_record_reports_how_far_it_got() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;
        tracker.update_chunk("op", 1, 2, 30, "chunk 1").await;
        tracker.fail("op", "boom").await;

        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.status, Status::Error);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert_eq!(record.overall_percent(), 15);
    }

    #[tokio::test]
    async fn sweep_drops_only_stale_records() {
        let tracker = ProgressTracker::new();
        tracker.create("old").await;
        tracker.create("fresh").await;
        {
            let mut records = tracker.records.write().await;
            records.get_mut("old").unwrap().updated_at = Utc::now() - Duration::minutes(90);
        }

        let removed = tracker.sweep(DEFAULT_RETENTION_MINUTES).await;
        assert_eq!(removed, 1);
        assert!(tracker.get("old").await.is_none());
        assert!(tracker.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn unknown_ids_are_ignored() {
        let tracker = ProgressTracker::new();
        tracker.update_chunk("ghost", 1, 1, 50, "nobody home").await;
        tracker.complete("ghost", "done").await;
        assert!(tracker.get("ghost").await.is_none());
    }
}
