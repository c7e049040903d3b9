use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::cache::ResultCache;
use crate::provider::adapter::ProviderAdapter;
use crate::provider::types::NormalizedRecord;
use crate::scoring::engine::ScoringEngine;
use crate::store::types::NewContent;
use crate::store::{ContentStore, StoreError};

pub struct SyncOrchestrator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    store: Arc<dyn ContentStore>,
    scoring: ScoringEngine,
    cache: Arc<dyn ResultCache>,
}

impl SyncOrchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        store: Arc<dyn ContentStore>,
        scoring: ScoringEngine,
        cache: Arc<dyn ResultCache>,
    ) -> Arc<Self> {
        Arc::new(Self {
            adapters,
            store,
            scoring,
            cache,
        })
    }

    /// Runs every provider concurrently, then flushes the result cache.
    ///
    /// The start instant is captured once and used as the stale-sweep
    /// threshold for every provider, so rows touched during the run are
    /// never swept by it.
    pub async fn sync_all(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!("Provider sync starting ({} adapters)", self.adapters.len());
        let started_at = Utc::now();

        let mut tasks = JoinSet::new();
        for adapter in &self.adapters {
            let this = Arc::clone(&self);
            let adapter = Arc::clone(adapter);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                this.sync_one(adapter, started_at, cancel).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::error!("Provider sync task panicked: {}", err);
            }
        }

        if let Err(err) = self.cache.clear().await {
            tracing::warn!("Cache clear after sync failed: {}", err);
        }

        tracing::info!("Provider sync finished");
    }

    /// Launches `sync_all` on a fresh background task and returns
    /// immediately. Used by the admin trigger.
    pub fn sync_all_async(self: Arc<Self>) {
        tokio::spawn(async move {
            self.sync_all(CancellationToken::new()).await;
        });
    }

    /// One provider's run. Any failure here is isolated: it is logged and
    /// the other providers proceed.
    async fn sync_one(
        &self,
        adapter: Arc<dyn ProviderAdapter>,
        started_at: DateTime<Utc>,
        cancel: CancellationToken,
    ) {
        let provider = adapter.provider().clone();
        tracing::info!("Syncing provider {}", provider.name);

        let records = match adapter.fetch_all(&cancel).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!("Provider sync failed ({}): {}", provider.name, err);
                return;
            }
        };

        let mut synced = 0usize;
        for record in &records {
            match self.process_record(provider.id, record) {
                Ok(()) => synced += 1,
                Err(err) => {
                    tracing::error!(
                        "Record processing failed ({} / {}): {}",
                        provider.name,
                        record.external_id,
                        err
                    );
                }
            }
        }

        if let Err(err) = self.store.mark_stale_deleted(provider.id, started_at) {
            tracing::error!("Stale sweep failed ({}): {}", provider.name, err);
        }

        tracing::info!(
            "Provider {} synced: {}/{} records",
            provider.name,
            synced,
            records.len()
        );
    }

    /// Per-record write sequence: upsert content, upsert stats, compute and
    /// upsert the score when defined, then tags. Tag failures are swallowed;
    /// everything else fails the record.
    fn process_record(
        &self,
        provider_id: i64,
        record: &NormalizedRecord,
    ) -> Result<(), StoreError> {
        let content_id = self.store.upsert(&NewContent {
            provider_id,
            external_id: record.external_id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            content_type: record.kind,
            published_at: record.published_at,
            raw_payload: record.raw_payload.clone(),
        })?;

        self.store.upsert_stats(content_id, &record.stats)?;

        if let Some(score) =
            self.scoring
                .compute(record.kind, Some(&record.stats), record.published_at, Utc::now())
        {
            self.store.upsert_score(content_id, &score)?;
        }

        if !record.tags.is_empty() {
            if let Err(err) = self.store.add_tags(content_id, &record.tags) {
                tracing::warn!("Tag write failed (content {}): {}", content_id, err);
            }
        }

        Ok(())
    }
}
