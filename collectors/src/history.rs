use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::Mutex;

use pl_core::types::CollectedRecord;

/// Fixed-capacity record buffer with FIFO eviction.
///
/// Guarded by a mutex so the last-N invariant holds under concurrent
/// report requests.
pub struct History {
    records: Mutex<VecDeque<CollectedRecord>>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn push(&self, record: CollectedRecord) {
        let mut records = self.records.lock().await;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Most recent records, oldest first, at most `limit`.
    pub async fn recent(&self, limit: usize) -> Vec<CollectedRecord> {
        let records = self.records.lock().await;
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    /// Records at or after the cutoff, oldest first.
    pub async fn since(&self, cutoff: DateTime<Utc>) -> Vec<CollectedRecord> {
        let records = self.records.lock().await;
        records
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn clear(&self) {
        self.records.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_core::types::SourceKind;

    fn record(n: u64) -> CollectedRecord {
        CollectedRecord::success(SourceKind::Classification, serde_json::json!({ "n": n }))
    }

    #[tokio::test]
    async fn test_capacity_eviction() {
        let history = History::new(3);
        for n in 0..5 {
            history.push(record(n)).await;
        }

        assert_eq!(history.len().await, 3);
        let recent = history.recent(10).await;
        assert_eq!(recent[0].payload["n"], 2);
        assert_eq!(recent[2].payload["n"], 4);
    }

    #[tokio::test]
    async fn test_recent_limit() {
        let history = History::new(10);
        for n in 0..6 {
            history.push(record(n)).await;
        }

        let recent = history.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].payload["n"], 4);
        assert_eq!(recent[1].payload["n"], 5);
    }

    #[tokio::test]
    async fn test_since_filters_by_cutoff() {
        let history = History::new(10);
        let mut old = record(0);
        old.timestamp = Utc::now() - chrono::Duration::hours(12);
        history.push(old).await;
        history.push(record(1)).await;

        let cutoff = Utc::now() - chrono::Duration::hours(6);
        let recent = history.since(cutoff).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].payload["n"], 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let history = History::new(4);
        history.push(record(0)).await;
        history.clear().await;
        assert_eq!(history.len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_pushes_respect_capacity() {
        let history = std::sync::Arc::new(History::new(8));
        let mut handles = Vec::new();
        for n in 0..32 {
            let history = history.clone();
            handles.push(tokio::spawn(async move {
                history.push(record(n)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(history.len().await, 8);
    }
}
