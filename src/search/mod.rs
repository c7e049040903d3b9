//! Search Engine Module
//!
//! The query side of the service. Validates raw request parameters,
//! canonicalizes them into a cache fingerprint, serves from the result
//! cache when possible and otherwise executes the ranked store query and
//! writes the envelope back to the cache.
//!
//! ## Submodules
//! - **`engine`**: validation, fingerprinting and cache-backed execution.
//! - **`handlers`**: the axum search handler with its error mapping.
//! - **`types`**: request and response envelopes.

pub mod engine;
pub mod handlers;
pub mod types;
