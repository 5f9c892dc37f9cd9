//! Time-decayed engagement ranking for trending listings.
//!
//! ```text
//! score = (likes * 2 + views) / (age_days + 1) ^ 1.5
//! ```
//!
//! Ranking is pure: it only looks at the candidates, the fallback pool and the
//! supplied `now`.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashSet;

const GRAVITY: f64 = 1.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// The minimal shape ranked content exposes.
pub trait Rankable {
    fn rank_id(&self) -> i64;
    fn created_at(&self) -> &str;
    fn like_count(&self) -> i64;
    fn view_count(&self) -> i64;

    fn engagement(&self) -> i64 {
        self.like_count()
            .saturating_mul(2)
            .saturating_add(self.view_count())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: i64,
    pub created_at: String,
    pub like_count: i64,
    pub view_count: i64,
}

impl Rankable for ContentItem {
    fn rank_id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn like_count(&self) -> i64 {
        self.like_count
    }

    fn view_count(&self) -> i64 {
        self.view_count
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankParams {
    pub window: Duration,
    pub min_results: usize,
    pub max_results: usize,
}

/// Accepts RFC 3339 and the naive `YYYY-MM-DD HH:MM:SS[.fff]` form (read as UTC).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Age in fractional days. Timestamps in the future count as zero.
#[must_use]
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let seconds = (now - created_at).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_DAY).max(0.0)
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn decayed_score(engagement: i64, age_days: f64) -> f64 {
    engagement as f64 / (age_days + 1.0).powf(GRAVITY)
}

/// `None` when the timestamp cannot be parsed.
#[must_use]
pub fn score<T: Rankable>(item: &T, now: DateTime<Utc>) -> Option<f64> {
    let created = parse_timestamp(item.created_at())?;
    Some(decayed_score(item.engagement(), age_in_days(created, now)))
}

struct Scored<T> {
    item: T,
    score: Option<f64>,
}

fn by_score_desc<T>(a: &Scored<T>, b: &Scored<T>) -> Ordering {
    match (a.score, b.score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ranks `candidates` by decayed score and backfills from `fallback_pool`.
///
/// Candidates older than `params.window` are dropped. Unparseable timestamps
/// stay in the set with no score and sort after everything else. When fewer
/// than `min_results` survive, the pool is consulted in raw engagement order,
/// skipping ids already selected, until `min_results` is reached or the pool
/// runs out.
#[must_use]
pub fn rank<T: Rankable>(
    candidates: Vec<T>,
    fallback_pool: Vec<T>,
    params: &RankParams,
    now: DateTime<Utc>,
) -> Vec<T> {
    let cutoff = now - params.window;

    let mut scored: Vec<Scored<T>> = candidates
        .into_iter()
        .filter_map(|item| match parse_timestamp(item.created_at()) {
            Some(created) if created < cutoff => None,
            Some(created) => {
                let score = decayed_score(item.engagement(), age_in_days(created, now));
                Some(Scored {
                    item,
                    score: Some(score),
                })
            }
            None => Some(Scored { item, score: None }),
        })
        .collect();

    // sort_by is stable, so ties keep candidate order
    scored.sort_by(by_score_desc);
    scored.truncate(params.max_results);

    let mut selected: Vec<T> = scored.into_iter().map(|s| s.item).collect();

    if selected.len() < params.min_results {
        let mut seen: HashSet<i64> = selected.iter().map(Rankable::rank_id).collect();
        let mut pool = fallback_pool;
        pool.sort_by_key(|item| std::cmp::Reverse(item.engagement()));

        for item in pool {
            if selected.len() >= params.min_results {
                break;
            }
            if seen.insert(item.rank_id()) {
                selected.push(item);
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn item(id: i64, age: Duration, likes: i64, views: i64) -> ContentItem {
        ContentItem {
            id,
            created_at: (now() - age).to_rfc3339(),
            like_count: likes,
            view_count: views,
        }
    }

    fn params(window_days: i64, min: usize, max: usize) -> RankParams {
        RankParams {
            window: Duration::days(window_days),
            min_results: min,
            max_results: max,
        }
    }

    fn ids(items: &[ContentItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_worked_example_scores() {
        let a = item(1, Duration::zero(), 10, 100);
        let b = item(2, Duration::days(6), 50, 50);

        let score_a = score(&a, now()).unwrap();
        let score_b = score(&b, now()).unwrap();
        assert!((score_a - 120.0).abs() < 1e-9);
        assert!((score_b - 150.0 / 7f64.powf(1.5)).abs() < 1e-9);
        assert!((score_b - 8.1).abs() < 0.05);

        let ranked = rank(vec![b, a], vec![], &params(7, 0, 12), now());
        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_more_engagement_never_ranks_lower() {
        let low = item(1, Duration::days(2), 5, 10);
        let high = item(2, Duration::days(2), 6, 10);
        assert!(score(&high, now()).unwrap() >= score(&low, now()).unwrap());

        let ranked = rank(vec![low, high], vec![], &params(7, 0, 12), now());
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn test_older_item_never_ranks_higher() {
        let fresh = item(1, Duration::hours(1), 20, 20);
        let stale = item(2, Duration::days(3), 20, 20);
        assert!(score(&fresh, now()).unwrap() > score(&stale, now()).unwrap());
    }

    #[test]
    fn test_future_timestamp_counts_as_age_zero() {
        let future = item(1, Duration::days(-2), 10, 100);
        assert!((score(&future, now()).unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_excludes_old_candidates() {
        let inside = item(1, Duration::days(6), 1, 1);
        let outside = item(2, Duration::days(8), 1000, 1000);
        let ranked = rank(vec![inside, outside], vec![], &params(7, 0, 12), now());
        assert_eq!(ids(&ranked), vec![1]);
    }

    #[test]
    fn test_max_results_truncates() {
        let candidates: Vec<_> = (0..20).map(|i| item(i, Duration::hours(i), 1, 1)).collect();
        let ranked = rank(candidates, vec![], &params(7, 6, 12), now());
        assert_eq!(ranked.len(), 12);
        assert_eq!(ranked[0].id, 0);
    }

    #[test]
    fn test_backfill_to_minimum() {
        let candidates = vec![
            item(1, Duration::days(1), 5, 5),
            item(2, Duration::days(2), 5, 5),
            item(3, Duration::days(3), 5, 5),
        ];
        let mut pool = candidates.clone();
        pool.extend((10..20).map(|i| item(i, Duration::days(40), i, 0)));

        let ranked = rank(candidates, pool, &params(7, 6, 12), now());
        assert_eq!(ranked.len(), 6);
        assert_eq!(ids(&ranked), vec![1, 2, 3, 19, 18, 17]);
    }

    #[test]
    fn test_backfill_stops_when_pool_runs_out() {
        let candidates = vec![item(1, Duration::days(1), 5, 5)];
        let pool = vec![item(1, Duration::days(1), 5, 5), item(2, Duration::days(60), 1, 1)];
        let ranked = rank(candidates, pool, &params(7, 6, 12), now());
        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_unparseable_timestamp_sorts_last() {
        let broken = ContentItem {
            id: 9,
            created_at: "yesterday-ish".to_string(),
            like_count: 1000,
            view_count: 1000,
        };
        let zero = item(1, Duration::days(1), 0, 0);
        let ranked = rank(vec![broken, zero], vec![], &params(7, 0, 12), now());
        assert_eq!(ids(&ranked), vec![1, 9]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let a = item(5, Duration::days(1), 3, 3);
        let b = item(3, Duration::days(1), 3, 3);
        let c = item(4, Duration::days(1), 3, 3);
        let ranked = rank(vec![a, b, c], vec![], &params(7, 0, 12), now());
        assert_eq!(ids(&ranked), vec![5, 3, 4]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2025-06-15T12:00:00Z").is_some());
        assert!(parse_timestamp("2025-06-15T12:00:00.123456+00:00").is_some());
        assert!(parse_timestamp("2025-06-15 12:00:00.123456").is_some());
        assert!(parse_timestamp("2025-06-15 12:00:00").is_some());
        assert!(parse_timestamp("15/06/2025").is_none());
    }
}
