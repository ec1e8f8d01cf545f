//! The aggregate store: per-image, per-pair and per-user running scores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::judgment::Judgment;
use super::pair::PairKey;
use super::score::{ImageScore, PairScore, UserScore};

/// All aggregates, keyed by image identifier, encoded pair key and user.
///
/// This is also the persisted document layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStore {
    #[serde(default)]
    pub image_scores: BTreeMap<String, ImageScore>,
    #[serde(default)]
    pub pair_scores: BTreeMap<String, PairScore>,
    #[serde(default)]
    pub user_scores: BTreeMap<String, UserScore>,
}

/// Entries touched by one recorded judgment, as they stand afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub pair_key: String,
    pub pair: PairScore,
    pub image_a: ImageScore,
    pub image_b: ImageScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserScore>,
}

/// One row of the flattened pair export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRow {
    pub img_a: String,
    pub img_b: String,
    pub total: u64,
    pub votes: u64,
    pub average_rating: f64,
    pub total_time_ms: u64,
    pub time_votes: u64,
    pub avg_time_ms: u64,
}

const CSV_HEADER: &str = "imgA,imgB,total,votes,avg,totalTimeMs,timeVotes,avgTimeMs";

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.image_scores.is_empty() && self.pair_scores.is_empty() && self.user_scores.is_empty()
    }

    /// Fold one judgment into every aggregate it touches.
    ///
    /// A self-pair updates its single image twice, once per side.
    pub fn record(&mut self, judgment: &Judgment) -> RecordOutcome {
        let pair = &judgment.pair;

        self.image_scores
            .entry(pair.img_a.clone())
            .or_default()
            .record(judgment.rating);
        self.image_scores
            .entry(pair.img_b.clone())
            .or_default()
            .record(judgment.rating);

        let key = pair.key();
        let encoded = key.encode();
        let pair_score = self
            .pair_scores
            .entry(encoded.clone())
            .or_insert_with(|| PairScore::new(key.first(), key.second()));
        pair_score.record(judgment.rating, judgment.duration_ms);
        let pair_score = pair_score.clone();

        let user = judgment.user.as_ref().map(|user| {
            let score = self.user_scores.entry(user.clone()).or_default();
            score.record(judgment.rating, judgment.duration_ms, judgment.timestamp);
            score.clone()
        });

        RecordOutcome {
            pair_key: encoded,
            pair: pair_score,
            image_a: self.image_scores[&pair.img_a],
            image_b: self.image_scores[&pair.img_b],
            user,
        }
    }

    pub fn pair_score(&self, key: &PairKey) -> Option<&PairScore> {
        self.pair_scores.get(&key.encode())
    }

    /// Normalize a freshly loaded store to the current schema.
    ///
    /// Pair entries missing their image fields get them from the key and
    /// entries stored under a non-canonical key are merged into the canonical
    /// one. User ids are trimmed, blank ones dropped and entries that collide
    /// after trimming merged. Every average is re-derived.
    pub fn migrate(&mut self) {
        let legacy = std::mem::take(&mut self.pair_scores);
        for (stored_key, mut score) in legacy {
            let key = if score.img_a.is_empty() && score.img_b.is_empty() {
                PairKey::decode(&stored_key)
            } else {
                PairKey::new(&score.img_a, &score.img_b)
            };
            score.img_a = key.first().to_string();
            score.img_b = key.second().to_string();
            score.time.recompute();

            match self.pair_scores.get_mut(&key.encode()) {
                Some(existing) => existing.merge(&score),
                None => {
                    self.pair_scores.insert(key.encode(), score);
                }
            }
        }

        let legacy = std::mem::take(&mut self.user_scores);
        for (stored_user, mut score) in legacy {
            let user = stored_user.trim();
            if user.is_empty() {
                continue;
            }
            score.time.recompute();

            match self.user_scores.get_mut(user) {
                Some(existing) => existing.merge(&score),
                None => {
                    self.user_scores.insert(user.to_string(), score);
                }
            }
        }
    }

    /// Flattened view over pair scores, one row per pair.
    pub fn pair_rows(&self) -> Vec<PairRow> {
        self.pair_scores
            .values()
            .map(|score| PairRow {
                img_a: score.img_a.clone(),
                img_b: score.img_b.clone(),
                total: score.total,
                votes: score.votes,
                average_rating: score.average_rating(),
                total_time_ms: score.time.total_time_ms,
                time_votes: score.time.time_votes,
                avg_time_ms: score.time.avg_time_ms,
            })
            .collect()
    }

    /// CSV rendering of [`Self::pair_rows`], every field quoted.
    pub fn to_csv(&self) -> String {
        let mut lines = vec![CSV_HEADER.to_string()];
        for row in self.pair_rows() {
            let fields = [
                row.img_a,
                row.img_b,
                row.total.to_string(),
                row.votes.to_string(),
                format!("{:.4}", row.average_rating),
                row.total_time_ms.to_string(),
                row.time_votes.to_string(),
                format!("{:.2}", row.avg_time_ms as f64),
            ];
            lines.push(
                fields
                    .iter()
                    .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        lines.join("\n")
    }
}
