//! Result Cache Module
//!
//! Keyed byte-blob store with per-entry TTL used by the search engine.
//! A miss is an expected outcome (`Ok(None)`), not an error; cache I/O
//! failures are logged by callers and never fail the surrounding
//! operation.

pub mod memory;

#[cfg(test)]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores the value under the key; overwrites any previous entry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Flushes the whole cache namespace.
    async fn clear(&self) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}
