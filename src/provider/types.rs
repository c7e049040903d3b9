use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::types::{ContentKind, RecordStats};

/// A configured remote feed. The format tag stays an open string here;
/// only the adapter factory interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
    pub format: String,
    pub active: bool,
}

/// Wire dialects the adapter factory knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    JsonV1,
    XmlV1,
}

impl FeedFormat {
    pub fn from_tag(tag: &str) -> Option<FeedFormat> {
        match tag {
            "json_v1" => Some(FeedFormat::JsonV1),
            "xml_v1" => Some(FeedFormat::XmlV1),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            FeedFormat::JsonV1 => "json_v1",
            FeedFormat::XmlV1 => "xml_v1",
        }
    }
}

/// A store-ready record, independent of the wire format it came from.
/// `raw_payload` keeps the re-serialized source item for audit.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub kind: ContentKind,
    pub published_at: DateTime<Utc>,
    pub stats: RecordStats,
    pub tags: Vec<String>,
    pub raw_payload: String,
}

/// One decoded feed page. `item_count` is the number of source items before
/// normalization drops; the pagination loop terminates on it, not on the
/// surviving record count.
#[derive(Debug)]
pub struct FeedPage {
    pub records: Vec<NormalizedRecord>,
    pub item_count: usize,
    pub total: usize,
    pub per_page: usize,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("fetch cancelled")]
    Cancelled,
}
