//! json_v1 dialect: `{ contents: [...], pagination: { total, page, per_page } }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{FeedPage, FetchError, NormalizedRecord};
use crate::store::types::{ContentKind, RecordStats};

#[derive(Debug, Deserialize)]
struct JsonFeed {
    #[serde(default)]
    contents: Vec<JsonContent>,
    #[serde(default)]
    pagination: JsonPagination,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonContent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    metrics: JsonMetrics,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonMetrics {
    #[serde(default)]
    views: i64,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    reading_time: i64,
    #[serde(default)]
    reactions: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonPagination {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    per_page: usize,
}

pub fn decode_page(body: &[u8]) -> Result<FeedPage, FetchError> {
    let feed: JsonFeed =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let item_count = feed.contents.len();
    let mut records = Vec::with_capacity(item_count);
    for item in feed.contents {
        if let Some(record) = normalize(item) {
            records.push(record);
        }
    }

    Ok(FeedPage {
        records,
        item_count,
        total: feed.pagination.total,
        per_page: feed.pagination.per_page,
    })
}

fn normalize(item: JsonContent) -> Option<NormalizedRecord> {
    if item.id.is_empty() {
        tracing::debug!("Dropping json record without id");
        return None;
    }

    let Some(kind) = ContentKind::parse(&item.kind) else {
        tracing::debug!("Dropping json record {}: unknown kind {:?}", item.id, item.kind);
        return None;
    };

    let Ok(published_at) = DateTime::parse_from_rfc3339(&item.published_at) else {
        tracing::debug!(
            "Dropping json record {}: bad published_at {:?}",
            item.id,
            item.published_at
        );
        return None;
    };
    let published_at = published_at.with_timezone(&Utc);

    // One row, one payload: re-serialize the single source item.
    let raw_payload = serde_json::to_string(&item).unwrap_or_default();

    Some(NormalizedRecord {
        external_id: item.id,
        title: item.title,
        description: String::new(),
        kind,
        published_at,
        stats: RecordStats {
            views: item.metrics.views,
            likes: item.metrics.likes,
            reading_time: item.metrics.reading_time,
            reactions: item.metrics.reactions,
        },
        tags: item.tags,
        raw_payload,
    })
}
