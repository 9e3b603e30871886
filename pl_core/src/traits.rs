//! Traits shared across the PharmaLens workspace.

use async_trait::async_trait;

use crate::types::{CollectedRecord, SourceKind};

/// A collector polling one external prediction API and retaining bounded
/// recent history.
///
/// `collect` never fails at the type level: upstream errors are represented
/// as records with `status: Error` so a single slow or broken source cannot
/// abort an aggregation cycle.
#[async_trait]
pub trait DataCollector: Send + Sync {
    /// Issues the upstream request(s), appends the result to history, and
    /// returns it.
    async fn collect(&self) -> CollectedRecord;

    fn source(&self) -> SourceKind;

    /// Most recent records, newest last, at most `limit`.
    async fn history(&self, limit: usize) -> Vec<CollectedRecord>;

    async fn clear_history(&self);
}
