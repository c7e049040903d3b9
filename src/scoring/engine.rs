use chrono::{DateTime, Duration, Utc};

use crate::store::types::{ContentKind, ContentScore, RecordStats};

/// Type weights applied to the base score.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub video_type_weight: f64,
    pub article_type_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            video_type_weight: 1.5,
            article_type_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Computes the score tuple for a content.
    ///
    /// `final = base * type_weight + recency + engagement`, with the final
    /// score derived from the unrounded components and every stored
    /// component rounded to two decimals. Returns `None` when the content
    /// has no statistics; the caller skips the score write in that case.
    pub fn compute(
        &self,
        kind: ContentKind,
        stats: Option<&RecordStats>,
        published_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<ContentScore> {
        let stats = stats?;

        let (base, type_weight) = match kind {
            ContentKind::Video => (
                stats.views as f64 / 1000.0 + stats.likes as f64 / 100.0,
                self.weights.video_type_weight,
            ),
            ContentKind::Article => (
                stats.reading_time as f64 + stats.reactions as f64 / 50.0,
                self.weights.article_type_weight,
            ),
        };

        let recency = recency_score(published_at, now);
        let engagement = engagement_score(kind, stats);
        let final_score = base * type_weight + recency + engagement;

        Some(ContentScore {
            base_score: round2(base),
            type_weight,
            recency_score: round2(recency),
            engagement_score: round2(engagement),
            final_score: round2(final_score),
            calculated_at: now,
        })
    }
}

/// Recency buckets over the publication age; boundaries are inclusive.
fn recency_score(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age = now - published_at;

    if age <= Duration::days(7) {
        5.0
    } else if age <= Duration::days(30) {
        3.0
    } else if age <= Duration::days(90) {
        1.0
    } else {
        0.0
    }
}

/// Ratio-based engagement; zero denominators yield zero.
fn engagement_score(kind: ContentKind, stats: &RecordStats) -> f64 {
    match kind {
        ContentKind::Video => {
            if stats.views == 0 {
                return 0.0;
            }
            stats.likes as f64 / stats.views as f64 * 10.0
        }
        ContentKind::Article => {
            if stats.reading_time == 0 {
                return 0.0;
            }
            stats.reactions as f64 / stats.reading_time as f64 * 5.0
        }
    }
}

/// Half-away-from-zero rounding to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
