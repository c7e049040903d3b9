#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use crate::provider::adapter::RateGate;
    use crate::provider::types::{FeedFormat, FetchError};
    use crate::provider::{json, xml};
    use crate::store::types::ContentKind;

    // ============================================================
    // JSON DIALECT TESTS
    // ============================================================

    const JSON_PAGE: &str = r#"{
        "contents": [
            {
                "id": "vid-1",
                "title": "Rust in Production",
                "type": "video",
                "metrics": { "views": 15000, "likes": 320, "duration": "12:30" },
                "published_at": "2024-05-01T10:00:00Z",
                "tags": ["rust", "backend"]
            },
            {
                "id": "art-1",
                "title": "Async Patterns",
                "type": "article",
                "metrics": { "reading_time": 8, "reactions": 54 },
                "published_at": "2024-05-02T08:30:00+02:00",
                "tags": []
            }
        ],
        "pagination": { "total": 2, "page": 1, "per_page": 10 }
    }"#;

    #[test]
    fn test_json_decode_page() {
        let page = json::decode_page(JSON_PAGE.as_bytes()).unwrap();

        assert_eq!(page.item_count, 2);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total, 2);
        assert_eq!(page.per_page, 10);

        let video = &page.records[0];
        assert_eq!(video.external_id, "vid-1");
        assert_eq!(video.title, "Rust in Production");
        assert_eq!(video.kind, ContentKind::Video);
        assert_eq!(video.stats.views, 15000);
        assert_eq!(video.stats.likes, 320);
        assert_eq!(video.tags, vec!["rust", "backend"]);
        assert!(video.description.is_empty());

        let article = &page.records[1];
        assert_eq!(article.kind, ContentKind::Article);
        assert_eq!(article.stats.reading_time, 8);
        assert_eq!(article.stats.reactions, 54);
    }

    #[test]
    fn test_json_raw_payload_is_per_item() {
        let page = json::decode_page(JSON_PAGE.as_bytes()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&page.records[0].raw_payload).unwrap();
        assert_eq!(raw["id"], "vid-1");
        assert_eq!(raw["metrics"]["views"], 15000);
        // The page envelope is not part of the per-item payload.
        assert!(raw.get("pagination").is_none());
    }

    #[test]
    fn test_json_drops_invalid_records_but_counts_items() {
        let body = r#"{
            "contents": [
                { "id": "", "title": "No Id", "type": "video",
                  "metrics": {}, "published_at": "2024-05-01T10:00:00Z", "tags": [] },
                { "id": "x-1", "title": "Bad Kind", "type": "podcast",
                  "metrics": {}, "published_at": "2024-05-01T10:00:00Z", "tags": [] },
                { "id": "x-2", "title": "Bad Date", "type": "video",
                  "metrics": {}, "published_at": "yesterday", "tags": [] },
                { "id": "x-3", "title": "Good", "type": "video",
                  "metrics": {}, "published_at": "2024-05-01T10:00:00Z", "tags": [] }
            ],
            "pagination": { "total": 4, "page": 1, "per_page": 10 }
        }"#;

        let page = json::decode_page(body.as_bytes()).unwrap();

        assert_eq!(page.item_count, 4);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].external_id, "x-3");
    }

    #[test]
    fn test_json_rejects_date_only_timestamps() {
        // Unlike the xml dialect, json only accepts RFC-3339.
        let body = r#"{
            "contents": [
                { "id": "x-1", "title": "Date Only", "type": "video",
                  "metrics": {}, "published_at": "2024-05-01", "tags": [] }
            ],
            "pagination": { "total": 1, "page": 1, "per_page": 10 }
        }"#;

        let page = json::decode_page(body.as_bytes()).unwrap();
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_json_malformed_body_is_a_decode_error() {
        let result = json::decode_page(b"not json at all");
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    // ============================================================
    // XML DIALECT TESTS
    // ============================================================

    const XML_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed>
  <items>
    <item>
      <id>xml-vid-1</id>
      <headline>Distributed Systems Talk</headline>
      <type>video</type>
      <stats>
        <views>9000</views>
        <likes>410</likes>
      </stats>
      <publication_date>2024-04-20T16:45:00Z</publication_date>
      <categories>
        <category>Systems</category>
        <category>Talks</category>
      </categories>
    </item>
    <item>
      <id>xml-art-1</id>
      <headline>Yearly Recap</headline>
      <type>article</type>
      <stats>
        <reading_time>12</reading_time>
        <reactions>88</reactions>
      </stats>
      <publication_date>2024-01-15</publication_date>
      <categories/>
    </item>
  </items>
  <meta>
    <total_count>2</total_count>
    <current_page>1</current_page>
    <items_per_page>10</items_per_page>
  </meta>
</feed>"#;

    #[test]
    fn test_xml_decode_page() {
        let page = xml::decode_page(XML_PAGE.as_bytes()).unwrap();

        assert_eq!(page.item_count, 2);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total, 2);
        assert_eq!(page.per_page, 10);

        let video = &page.records[0];
        assert_eq!(video.external_id, "xml-vid-1");
        assert_eq!(video.title, "Distributed Systems Talk");
        assert_eq!(video.kind, ContentKind::Video);
        assert_eq!(video.stats.views, 9000);
        assert_eq!(video.tags, vec!["Systems", "Talks"]);
    }

    #[test]
    fn test_xml_accepts_bare_dates() {
        let page = xml::decode_page(XML_PAGE.as_bytes()).unwrap();

        let article = &page.records[1];
        assert_eq!(article.kind, ContentKind::Article);
        assert_eq!(
            article.published_at.to_rfc3339(),
            "2024-01-15T00:00:00+00:00"
        );
    }

    #[test]
    fn test_xml_raw_payload_is_per_item() {
        let page = xml::decode_page(XML_PAGE.as_bytes()).unwrap();

        let raw = &page.records[0].raw_payload;
        assert!(raw.starts_with("<item"));
        assert!(raw.contains("<id>xml-vid-1</id>"));
        assert!(!raw.contains("xml-art-1"));
    }

    #[test]
    fn test_xml_drops_invalid_records() {
        let body = r#"<feed>
  <items>
    <item>
      <id>ok-1</id>
      <headline>Fine</headline>
      <type>article</type>
      <stats><reading_time>3</reading_time></stats>
      <publication_date>2024-02-02</publication_date>
      <categories/>
    </item>
    <item>
      <id>bad-kind</id>
      <headline>Nope</headline>
      <type>livestream</type>
      <stats/>
      <publication_date>2024-02-02</publication_date>
      <categories/>
    </item>
    <item>
      <id>bad-date</id>
      <headline>Nope</headline>
      <type>article</type>
      <stats/>
      <publication_date>02/02/2024</publication_date>
      <categories/>
    </item>
  </items>
  <meta>
    <total_count>3</total_count>
    <current_page>1</current_page>
    <items_per_page>10</items_per_page>
  </meta>
</feed>"#;

        let page = xml::decode_page(body.as_bytes()).unwrap();
        assert_eq!(page.item_count, 3);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].external_id, "ok-1");
    }

    #[test]
    fn test_xml_malformed_body_is_a_decode_error() {
        let result = xml::decode_page(b"<feed><items>");
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    // ============================================================
    // FORMAT TAG TESTS
    // ============================================================

    #[test]
    fn test_format_tag_roundtrip() {
        assert_eq!(FeedFormat::from_tag("json_v1"), Some(FeedFormat::JsonV1));
        assert_eq!(FeedFormat::from_tag("xml_v1"), Some(FeedFormat::XmlV1));
        assert_eq!(FeedFormat::from_tag("csv_v1"), None);

        assert_eq!(FeedFormat::JsonV1.as_tag(), "json_v1");
        assert_eq!(FeedFormat::XmlV1.as_tag(), "xml_v1");
    }

    // ============================================================
    // RATE GATE TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_rate_gate_spaces_acquisitions() {
        let gate = RateGate::new(Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();

        gate.acquire(&cancel).await.unwrap();
        gate.acquire(&cancel).await.unwrap();
        gate.acquire(&cancel).await.unwrap();

        // Three tokens out of a capacity-1 bucket: at least two refills.
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_rate_gate_cancelled_before_wait() {
        let gate = RateGate::new(Duration::from_secs(1));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = gate.acquire(&cancel).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_gate_cancellation_aborts_wait() {
        let gate = Arc::new(RateGate::new(Duration::from_secs(60)));
        let cancel = CancellationToken::new();

        gate.acquire(&cancel).await.unwrap();

        let waiter = {
            let gate = Arc::clone(&gate);
            let cancel = cancel.clone();
            tokio::spawn(async move { gate.acquire(&cancel).await })
        };

        cancel.cancel();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
