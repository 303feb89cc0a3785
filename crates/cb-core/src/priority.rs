//! # Priority scoring
//!
//! A complaint's priority is the sum of three bounded terms:
//!
//! | term | range |
//! |---|---|
//! | category weight | 10..=100 |
//! | urgency weight | 5..=50 |
//! | days pending, capped | 0..=30 |
//!
//! rounded to the nearest integer, halves rounding up. The resulting
//! range (15..=180) is what [`PriorityLevel`] bands are cut from.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Category, Urgency};

/// Days pending stop adding to the score past this point.
pub const MAX_DAYS_PENDING: f64 = 30.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

impl Category {
    pub const fn weight(self) -> i64 {
        match self {
            Category::Bullying => 100,
            Category::Academic => 30,
            Category::Staff => 30,
            Category::Other => 20,
            Category::Facility => 10,
        }
    }
}

impl Urgency {
    pub const fn weight(self) -> i64 {
        match self {
            Urgency::Critical => 50,
            Urgency::High => 30,
            Urgency::Medium => 15,
            Urgency::Low => 5,
        }
    }
}

/// Fractional days between `created_at` and `now`.
///
/// Negative when `now` precedes `created_at`; callers get that value as-is.
pub fn days_pending(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - created_at).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Priority score of a complaint evaluated at `now`.
pub fn score(
    category: Category,
    urgency: Urgency,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    let time_bonus = days_pending(created_at, now).min(MAX_DAYS_PENDING);
    let raw = (category.weight() + urgency.weight()) as f64 + time_bonus;
    round_half_up(raw)
}

/// Rounds to the nearest integer, sending exact halves toward +∞ (27.5 → 28, -5.5 → -5).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Coarse band of a score used by clients to colour complaints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub const HIGH_THRESHOLD: i64 = 100;
    pub const MEDIUM_THRESHOLD: i64 = 50;

    pub fn from_score(score: i64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            PriorityLevel::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }
}
