#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::scoring::engine::{ScoringEngine, ScoringWeights};
    use crate::store::types::{ContentKind, RecordStats};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringWeights::default())
    }

    fn stats(views: i64, likes: i64, reading_time: i64, reactions: i64) -> RecordStats {
        RecordStats {
            views,
            likes,
            reading_time,
            reactions,
        }
    }

    // ============================================================
    // SCENARIO TESTS
    // ============================================================

    #[test]
    fn test_hot_video_score() {
        let now = Utc::now();
        let published_at = now - Duration::days(5);
        let stats = stats(150_000, 5_000, 0, 0);

        let score = engine()
            .compute(ContentKind::Video, Some(&stats), published_at, now)
            .unwrap();

        // base = 150000/1000 + 5000/100 = 200
        assert_eq!(score.base_score, 200.0);
        assert_eq!(score.type_weight, 1.5);
        assert_eq!(score.recency_score, 5.0);
        // engagement = (5000/150000) * 10 = 0.333... -> 0.33
        assert_eq!(score.engagement_score, 0.33);
        // final = 200 * 1.5 + 5.0 + 0.333... -> 305.33
        assert_eq!(score.final_score, 305.33);
    }

    #[test]
    fn test_old_article_score() {
        let now = Utc::now();
        let published_at = now - Duration::days(100);
        let stats = stats(0, 0, 5, 100);

        let score = engine()
            .compute(ContentKind::Article, Some(&stats), published_at, now)
            .unwrap();

        // base = 5 + 100/50 = 7
        assert_eq!(score.base_score, 7.0);
        assert_eq!(score.type_weight, 1.0);
        assert_eq!(score.recency_score, 0.0);
        // engagement = (100/5) * 5 = 100
        assert_eq!(score.engagement_score, 100.0);
        assert_eq!(score.final_score, 107.0);
    }

    #[test]
    fn test_zero_views_video_score() {
        let now = Utc::now();
        let stats = stats(0, 10, 0, 0);

        let score = engine()
            .compute(ContentKind::Video, Some(&stats), now, now)
            .unwrap();

        // base = 0/1000 + 10/100 = 0.1
        assert_eq!(score.base_score, 0.1);
        assert_eq!(score.recency_score, 5.0);
        assert_eq!(score.engagement_score, 0.0);
        // final = 0.1 * 1.5 + 5.0 = 5.15
        assert_eq!(score.final_score, 5.15);
    }

    // ============================================================
    // RECENCY BOUNDARIES (inclusive)
    // ============================================================

    #[test]
    fn test_recency_week_boundary() {
        let now = Utc::now();
        let stats = stats(1000, 0, 0, 0);

        let at_boundary = engine()
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(7),
                now,
            )
            .unwrap();
        assert_eq!(at_boundary.recency_score, 5.0);

        let past_boundary = engine()
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(7) - Duration::seconds(1),
                now,
            )
            .unwrap();
        assert_eq!(past_boundary.recency_score, 3.0);
    }

    #[test]
    fn test_recency_month_boundary() {
        let now = Utc::now();
        let stats = stats(1000, 0, 0, 0);

        let at_boundary = engine()
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(30),
                now,
            )
            .unwrap();
        assert_eq!(at_boundary.recency_score, 3.0);

        let past_boundary = engine()
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(30) - Duration::seconds(1),
                now,
            )
            .unwrap();
        assert_eq!(past_boundary.recency_score, 1.0);
    }

    #[test]
    fn test_recency_quarter_boundary() {
        let now = Utc::now();
        let stats = stats(1000, 0, 0, 0);

        let at_boundary = engine()
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(90),
                now,
            )
            .unwrap();
        assert_eq!(at_boundary.recency_score, 1.0);

        let past_boundary = engine()
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(90) - Duration::seconds(1),
                now,
            )
            .unwrap();
        assert_eq!(past_boundary.recency_score, 0.0);
    }

    // ============================================================
    // ENGAGEMENT EDGE CASES
    // ============================================================

    #[test]
    fn test_article_zero_reading_time_engagement() {
        let now = Utc::now();
        let stats = stats(0, 0, 0, 50);

        let score = engine()
            .compute(ContentKind::Article, Some(&stats), now, now)
            .unwrap();

        assert_eq!(score.engagement_score, 0.0);
    }

    #[test]
    fn test_absent_stats_yield_no_score() {
        let now = Utc::now();
        let score = engine().compute(ContentKind::Video, None, now, now);
        assert!(score.is_none());
    }

    // ============================================================
    // ROUNDING & DETERMINISM
    // ============================================================

    #[test]
    fn test_rounding_half_away_from_zero() {
        let now = Utc::now();
        // engagement = (1/8) * 5 = 0.625 -> 0.63
        let stats = stats(0, 0, 8, 1);

        let score = engine()
            .compute(ContentKind::Article, Some(&stats), now, now)
            .unwrap();

        assert_eq!(score.engagement_score, 0.63);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let now = Utc::now();
        let published_at = now - Duration::days(12);
        let stats = stats(42_000, 1_337, 0, 0);

        let first = engine()
            .compute(ContentKind::Video, Some(&stats), published_at, now)
            .unwrap();
        let second = engine()
            .compute(ContentKind::Video, Some(&stats), published_at, now)
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_weights_apply() {
        let now = Utc::now();
        let custom = ScoringEngine::new(ScoringWeights {
            video_type_weight: 2.0,
            article_type_weight: 0.5,
        });
        let stats = stats(10_000, 0, 0, 0);

        let score = custom
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(365),
                now,
            )
            .unwrap();

        // base = 10, weight = 2.0, no recency, no engagement
        assert_eq!(score.type_weight, 2.0);
        assert_eq!(score.final_score, 20.0);
    }

    #[test]
    fn test_final_score_identity() {
        let now = Utc::now();
        let stats = stats(123_456, 7_890, 0, 0);

        let score = engine()
            .compute(
                ContentKind::Video,
                Some(&stats),
                now - Duration::days(20),
                now,
            )
            .unwrap();

        let reassembled =
            score.base_score * score.type_weight + score.recency_score + score.engagement_score;
        assert!((score.final_score - reassembled).abs() < 0.01);
    }
}
