use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of an ingested content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Article,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Article => "article",
        }
    }

    pub fn parse(value: &str) -> Option<ContentKind> {
        match value {
            "video" => Some(ContentKind::Video),
            "article" => Some(ContentKind::Article),
            _ => None,
        }
    }
}

/// Counters attached to a record, both on the wire and in `content_stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub views: i64,
    pub likes: i64,
    pub reading_time: i64,
    pub reactions: i64,
}

/// Stats row embedded into query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStats {
    pub content_id: i64,
    pub views: i64,
    pub likes: i64,
    pub reading_time: i64,
    pub reactions: i64,
    pub updated_at: DateTime<Utc>,
}

/// Score row: the four components plus the derived final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentScore {
    pub base_score: f64,
    pub type_weight: f64,
    pub recency_score: f64,
    pub engagement_score: f64,
    pub final_score: f64,
    pub calculated_at: DateTime<Utc>,
}

/// A stored content row with its embedded stats, score and tags.
///
/// `stats` and `score` stay `None` until the sync pipeline has written them;
/// readers must tolerate the intermediate state. `raw_payload` is only
/// populated by point lookups, never by search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: i64,
    pub provider_id: i64,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub content_type: ContentKind,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub stats: Option<ContentStats>,
    #[serde(default)]
    pub score: Option<ContentScore>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<String>,
}

/// Input for a content upsert; identity is `(provider_id, external_id)`.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub provider_id: i64,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub content_type: ContentKind,
    pub published_at: DateTime<Utc>,
    pub raw_payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Popularity,
    Relevance,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity",
            SortOrder::Relevance => "relevance",
        }
    }

    pub fn parse(value: &str) -> Option<SortOrder> {
        match value {
            "popularity" => Some(SortOrder::Popularity),
            "relevance" => Some(SortOrder::Relevance),
            _ => None,
        }
    }
}

/// Validated search parameters as consumed by the store.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub content_type: Option<ContentKind>,
    pub sort: SortOrder,
    pub page: u32,
    pub page_size: u32,
}
