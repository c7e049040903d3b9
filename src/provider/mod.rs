//! Provider Adapter Module
//!
//! The ingestion edge of the service. Each remote provider exposes a
//! paginated feed in one of the supported wire dialects; the adapter walks
//! the pages, decodes them and emits store-ready normalized records.
//!
//! ## Responsibilities
//! - **Pagination**: page walk driven by the `total/per_page` hint of the
//!   first page, bounded by a hard per-run record limit.
//! - **Rate limiting**: one token per second per provider; every network
//!   attempt waits for a token.
//! - **Retry**: up to 3 attempts per page with linear backoff; transport,
//!   status and decode failures retry, cancellation does not.
//! - **Normalization**: per-item validation with drop semantics; a bad
//!   record never fails the provider run.
//!
//! ## Submodules
//! - **`adapter`**: the `ProviderAdapter` trait, `FeedAdapter` and factory.
//! - **`json`** / **`xml`**: the wire dialect decoders.
//! - **`types`**: provider registry types, normalized records, errors.

pub mod adapter;
pub mod json;
pub mod types;
pub mod xml;

#[cfg(test)]
mod tests;
