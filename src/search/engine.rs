//! Cache-backed search execution.
//!
//! Flow: validate/default the raw parameters, fingerprint them, try the
//! result cache, fall back to the store, write the envelope back with the
//! configured TTL. Cache failures on either side are logged and never fail
//! the query.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::types::{Pagination, SearchRequest, SearchResult};
use crate::cache::ResultCache;
use crate::store::types::{ContentKind, SearchParams, SortOrder};
use crate::store::{ContentStore, StoreError};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),

    #[error("search query failed: {0}")]
    Store(#[from] StoreError),
}

pub struct SearchEngine {
    store: Arc<dyn ContentStore>,
    cache: Arc<dyn ResultCache>,
    cache_ttl: Duration,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        cache: Arc<dyn ResultCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    pub async fn execute(&self, request: SearchRequest) -> Result<SearchResult, SearchError> {
        let params = validate(request)?;
        let cache_key = fingerprint(&params);

        match self.cache.get(&cache_key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<SearchResult>(&bytes) {
                Ok(result) => {
                    tracing::debug!("Search cache hit: {}", cache_key);
                    return Ok(result);
                }
                Err(err) => {
                    tracing::warn!("Discarding undecodable cache entry {}: {}", cache_key, err);
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("Cache read failed ({}): {}", cache_key, err);
            }
        }

        let (items, total_items) = self.store.search(&params)?;
        let result = SearchResult {
            items,
            pagination: Pagination {
                page: params.page,
                page_size: params.page_size,
                total_items,
                total_pages: total_items.div_ceil(u64::from(params.page_size)),
            },
        };

        match serde_json::to_vec(&result) {
            Ok(bytes) => {
                if let Err(err) = self.cache.set(&cache_key, bytes, self.cache_ttl).await {
                    tracing::warn!("Cache write failed ({}): {}", cache_key, err);
                }
            }
            Err(err) => {
                tracing::warn!("Failed to encode search result for caching: {}", err);
            }
        }

        Ok(result)
    }
}

/// Applies defaults and clamps, rejects unknown sort and kind values.
/// An empty query is allowed (browse mode).
pub fn validate(request: SearchRequest) -> Result<SearchParams, SearchError> {
    let page = request.page.unwrap_or(1).max(1) as u32;

    let page_size = match request.page_size {
        Some(size) if size < 1 => DEFAULT_PAGE_SIZE,
        Some(size) if size > i64::from(MAX_PAGE_SIZE) => MAX_PAGE_SIZE,
        Some(size) => size as u32,
        None => DEFAULT_PAGE_SIZE,
    };

    let sort = if request.sort.is_empty() {
        SortOrder::Popularity
    } else {
        SortOrder::parse(&request.sort).ok_or_else(|| {
            SearchError::Validation(format!(
                "invalid sort value: {} (expected popularity or relevance)",
                request.sort
            ))
        })?
    };

    let content_type = if request.content_type.is_empty() {
        None
    } else {
        Some(ContentKind::parse(&request.content_type).ok_or_else(|| {
            SearchError::Validation(format!(
                "invalid content type: {} (expected video or article)",
                request.content_type
            ))
        })?)
    };

    Ok(SearchParams {
        query: request.query,
        content_type,
        sort,
        page,
        page_size,
    })
}

/// Canonical fingerprint of the validated parameters. Semantically distinct
/// parameter sets must hash differently; a 128-bit digest prefix is enough.
pub fn fingerprint(params: &SearchParams) -> String {
    let canonical = format!(
        "{}|{}|{}|{}|{}",
        params.query,
        params.content_type.map(|kind| kind.as_str()).unwrap_or(""),
        params.sort.as_str(),
        params.page,
        params.page_size
    );

    let digest = Sha256::digest(canonical.as_bytes());
    format!("search:{}", hex::encode(&digest[..16]))
}
