//! Running aggregates kept per image, per pair and per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::judgment::Rating;

/// Running sum and count of ratings for one image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageScore {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub votes: u64,
}

impl ImageScore {
    pub fn record(&mut self, rating: Rating) {
        self.total = self.total.saturating_add(rating.value());
        self.votes = self.votes.saturating_add(1);
    }

    pub fn average_rating(&self) -> f64 {
        average(self.total, self.votes)
    }
}

/// Running response-time statistics.
///
/// `avg_time_ms` is always `round(total_time_ms / time_votes)`; it is
/// recomputed on every update and never written independently. Sums saturate
/// at `u64::MAX` instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTime {
    #[serde(default)]
    pub total_time_ms: u64,
    #[serde(default)]
    pub time_votes: u64,
    #[serde(default)]
    pub avg_time_ms: u64,
}

impl ResponseTime {
    pub fn record(&mut self, duration_ms: u64) {
        self.total_time_ms = self.total_time_ms.saturating_add(duration_ms);
        self.time_votes = self.time_votes.saturating_add(1);
        self.recompute();
    }

    /// Re-derive the average from the running sum and count.
    pub fn recompute(&mut self) {
        self.avg_time_ms = if self.time_votes == 0 {
            0
        } else {
            rounded_div(self.total_time_ms, self.time_votes)
        };
    }

    fn merge(&mut self, other: &Self) {
        self.total_time_ms = self.total_time_ms.saturating_add(other.total_time_ms);
        self.time_votes = self.time_votes.saturating_add(other.time_votes);
        self.recompute();
    }
}

/// Aggregate for one canonical image pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairScore {
    /// Lexicographically smaller image of the pair.
    #[serde(rename = "imgA", default)]
    pub img_a: String,
    /// Lexicographically larger image of the pair.
    #[serde(rename = "imgB", default)]
    pub img_b: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub votes: u64,
    #[serde(flatten)]
    pub time: ResponseTime,
}

impl PairScore {
    pub fn new(img_a: impl Into<String>, img_b: impl Into<String>) -> Self {
        Self {
            img_a: img_a.into(),
            img_b: img_b.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, rating: Rating, duration_ms: Option<u64>) {
        self.total = self.total.saturating_add(rating.value());
        self.votes = self.votes.saturating_add(1);
        if let Some(ms) = duration_ms {
            self.time.record(ms);
        }
    }

    pub fn average_rating(&self) -> f64 {
        average(self.total, self.votes)
    }

    pub(crate) fn merge(&mut self, other: &Self) {
        self.total = self.total.saturating_add(other.total);
        self.votes = self.votes.saturating_add(other.votes);
        self.time.merge(&other.time);
    }
}

/// Aggregate for one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScore {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub votes: u64,
    #[serde(flatten)]
    pub time: ResponseTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_answered_at: Option<DateTime<Utc>>,
}

impl UserScore {
    pub fn record(&mut self, rating: Rating, duration_ms: Option<u64>, answered_at: DateTime<Utc>) {
        self.total = self.total.saturating_add(rating.value());
        self.votes = self.votes.saturating_add(1);
        if let Some(ms) = duration_ms {
            self.time.record(ms);
        }
        self.last_answered_at = Some(answered_at);
    }

    pub fn average_rating(&self) -> f64 {
        average(self.total, self.votes)
    }

    /// Fold another entry for the same user into this one. The later
    /// `last_answered_at` wins.
    pub(crate) fn merge(&mut self, other: &Self) {
        self.total = self.total.saturating_add(other.total);
        self.votes = self.votes.saturating_add(other.votes);
        self.time.merge(&other.time);
        self.last_answered_at = self.last_answered_at.max(other.last_answered_at);
    }
}

fn average(total: u64, votes: u64) -> f64 {
    if votes == 0 {
        0.0
    } else {
        total as f64 / votes as f64
    }
}

/// Integer division rounding half up, matching `Math.round` on positive values.
fn rounded_div(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder >= denominator - remainder {
        quotient + 1
    } else {
        quotient
    }
}
