//! Content Store Module
//!
//! The persistence layer of the service. Owns the relational schema for
//! providers, contents, per-content stats and scores, tags and the
//! content-tag relation, plus the full-text index used by search.
//!
//! ## Responsibilities
//! - **Upserts**: idempotent writes keyed on `(provider_id, external_id)`
//!   for contents and on `content_id` for stats and scores.
//! - **Tag writes**: transactional, idempotent tag + link creation.
//! - **Stale sweep**: soft-deletion of contents a provider stopped emitting.
//! - **Search**: prefix-matched full-text query with relevance or
//!   popularity ordering and pagination.
//!
//! ## Submodules
//! - **`types`**: entities shared across the crate.
//! - **`sqlite`**: the SQLite-backed implementation.

pub mod sqlite;
pub mod types;


use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::provider::types::Provider;
use self::types::{Content, ContentScore, NewContent, RecordStats, SearchParams};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("migration failed: {0}")]
    Migration(String),
}

/// Persistence operations consumed by the sync pipeline and the search
/// engine. Implemented by [`sqlite::SqliteStore`]; test code substitutes
/// counting fakes.
pub trait ContentStore: Send + Sync {
    /// Insert-or-update a content row; returns the surrogate id. A conflict
    /// on `(provider_id, external_id)` overwrites the mutable fields,
    /// refreshes `updated_at` and resets the soft-delete flag.
    fn upsert(&self, content: &NewContent) -> Result<i64, StoreError>;

    fn upsert_stats(&self, content_id: i64, stats: &RecordStats) -> Result<(), StoreError>;

    fn upsert_score(&self, content_id: i64, score: &ContentScore) -> Result<(), StoreError>;

    /// Atomically ensure tag rows and content-tag links for every name.
    /// Names are trimmed and lowercased; empty names are skipped.
    fn add_tags(&self, content_id: i64, names: &[String]) -> Result<(), StoreError>;

    /// Point lookup with embedded stats, score and tags. Soft-deleted rows
    /// are reported as absent.
    fn find(&self, id: i64) -> Result<Option<Content>, StoreError>;

    /// Soft-delete every live row of the provider not touched since the
    /// threshold. Returns the number of rows flagged.
    fn mark_stale_deleted(
        &self,
        provider_id: i64,
        threshold: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Ranked, filtered, paginated search. Returns the page window and the
    /// total match count under the same predicate.
    fn search(&self, params: &SearchParams) -> Result<(Vec<Content>, u64), StoreError>;

    fn active_providers(&self) -> Result<Vec<Provider>, StoreError>;

    fn insert_provider(
        &self,
        name: &str,
        url: &str,
        format: &str,
        active: bool,
    ) -> Result<i64, StoreError>;

    fn ping(&self) -> Result<(), StoreError>;
}
