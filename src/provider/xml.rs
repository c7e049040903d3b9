//! xml_v1 dialect:
//! `<feed><items><item>...</item>...</items><meta>...</meta></feed>`.
//! `publication_date` accepts RFC-3339 or bare `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::types::{FeedPage, FetchError, NormalizedRecord};
use crate::store::types::{ContentKind, RecordStats};

#[derive(Debug, Deserialize)]
struct XmlFeed {
    #[serde(default)]
    items: XmlItems,
    #[serde(default)]
    meta: XmlMeta,
}

#[derive(Debug, Default, Deserialize)]
struct XmlItems {
    #[serde(default, rename = "item")]
    item: Vec<XmlItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    headline: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    stats: XmlStats,
    #[serde(default)]
    publication_date: String,
    #[serde(default)]
    categories: XmlCategories,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlStats {
    #[serde(default)]
    views: i64,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    reading_time: i64,
    #[serde(default)]
    reactions: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlCategories {
    #[serde(default, rename = "category")]
    category: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlMeta {
    #[serde(default)]
    total_count: usize,
    #[serde(default)]
    items_per_page: usize,
}

pub fn decode_page(body: &[u8]) -> Result<FeedPage, FetchError> {
    let text = std::str::from_utf8(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let feed: XmlFeed =
        quick_xml::de::from_str(text).map_err(|e| FetchError::Decode(e.to_string()))?;

    let item_count = feed.items.item.len();
    let mut records = Vec::with_capacity(item_count);
    for item in feed.items.item {
        if let Some(record) = normalize(item) {
            records.push(record);
        }
    }

    Ok(FeedPage {
        records,
        item_count,
        total: feed.meta.total_count,
        per_page: feed.meta.items_per_page,
    })
}

fn normalize(item: XmlItem) -> Option<NormalizedRecord> {
    if item.id.is_empty() {
        tracing::debug!("Dropping xml record without id");
        return None;
    }

    let Some(kind) = ContentKind::parse(&item.kind) else {
        tracing::debug!("Dropping xml record {}: unknown kind {:?}", item.id, item.kind);
        return None;
    };

    let Some(published_at) = parse_publication_date(&item.publication_date) else {
        tracing::debug!(
            "Dropping xml record {}: bad publication_date {:?}",
            item.id,
            item.publication_date
        );
        return None;
    };

    let raw_payload = quick_xml::se::to_string_with_root("item", &item).unwrap_or_default();

    Some(NormalizedRecord {
        external_id: item.id,
        title: item.headline,
        description: String::new(),
        kind,
        published_at,
        stats: RecordStats {
            views: item.stats.views,
            likes: item.stats.likes,
            reading_time: item.stats.reading_time,
            reactions: item.stats.reactions,
        },
        tags: item.categories.category,
        raw_payload,
    })
}

fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}
