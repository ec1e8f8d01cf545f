//! Pair selection for experiment sessions.
//!
//! Builds the ordered sequence of image pairs one participant sees. Similar
//! pairs come from consecutive images in the similar pool, different pairs
//! from every combination within the different pool. Optionally a share of
//! the sequence is given to self-pairs (an image against itself) so that
//! inattentive answers can be spotted afterwards.
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ImagePair, SessionConfig};
use crate::domain::ports::ImagePoolProvider;

/// Default share of a session reserved for self-pairs.
pub const DEFAULT_SELF_PAIR_RATIO: f64 = 0.1;

/// Uniform in-place permutation (Fisher–Yates, last index first).
pub fn shuffle<T>(items: &mut [T], rng: &mut impl Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Pair images `(0, 1), (2, 3), ...`; a trailing odd image is left out.
pub fn similar_pairs(images: &[String]) -> Vec<ImagePair> {
    images
        .chunks_exact(2)
        .map(|chunk| ImagePair::new(chunk[0].clone(), chunk[1].clone()))
        .collect()
}

/// Every unordered combination `i < j` of the given images.
pub fn different_pairs(images: &[String]) -> Vec<ImagePair> {
    let mut pairs = Vec::with_capacity(images.len() * images.len().saturating_sub(1) / 2);
    for i in 0..images.len() {
        for j in (i + 1)..images.len() {
            pairs.push(ImagePair::new(images[i].clone(), images[j].clone()));
        }
    }
    pairs
}

/// A random pair of two distinct images from one pool.
pub fn random_distinct_pair(images: &[String], rng: &mut impl Rng) -> DomainResult<ImagePair> {
    if images.len() < 2 {
        return Err(DomainError::NotEnoughImages {
            found: images.len(),
        });
    }
    let first = rng.random_range(0..images.len());
    // Draw from the remaining n - 1 slots and skip over `first`.
    let mut second = rng.random_range(0..images.len() - 1);
    if second >= first {
        second += 1;
    }
    Ok(ImagePair::new(images[first].clone(), images[second].clone()))
}

/// The two candidate pools a session is drawn from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairPools {
    pub similar_pairs: Vec<ImagePair>,
    pub different_pairs: Vec<ImagePair>,
    #[serde(skip)]
    images: Vec<String>,
}

impl PairPools {
    /// Build pools from the raw image lists.
    ///
    /// Fails when the two lists hold fewer than two distinct images together.
    pub fn from_images(similar: &[String], different: &[String]) -> DomainResult<Self> {
        let images = distinct(similar.iter().chain(different));
        if images.len() < 2 {
            return Err(DomainError::NotEnoughImages {
                found: images.len(),
            });
        }
        Ok(Self {
            similar_pairs: similar_pairs(similar),
            different_pairs: different_pairs(different),
            images,
        })
    }

    /// Build pools from already-paired input.
    pub fn from_pairs(similar_pairs: Vec<ImagePair>, different_pairs: Vec<ImagePair>) -> Self {
        let images = distinct(
            similar_pairs
                .iter()
                .chain(&different_pairs)
                .flat_map(|p| [&p.img_a, &p.img_b]),
        );
        Self {
            similar_pairs,
            different_pairs,
            images,
        }
    }

    pub async fn from_provider(provider: &dyn ImagePoolProvider) -> DomainResult<Self> {
        let similar = provider.similar_images().await?;
        let different = provider.different_images().await?;
        Self::from_images(&similar, &different)
    }

    /// Total number of candidate pairs across both pools.
    pub fn count(&self) -> usize {
        self.similar_pairs.len() + self.different_pairs.len()
    }

    /// Distinct images of both pools, sorted.
    pub fn images(&self) -> &[String] {
        &self.images
    }
}

fn distinct<'a>(images: impl Iterator<Item = &'a String>) -> Vec<String> {
    images
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

/// How self-pairs are mixed into a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelfPairPolicy {
    Disabled,
    /// Reserve `ratio` of the target (at least one slot) for self-pairs.
    Ratio(f64),
}

impl Default for SelfPairPolicy {
    fn default() -> Self {
        Self::Ratio(DEFAULT_SELF_PAIR_RATIO)
    }
}

/// Produces one session's ordered pair sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSelector {
    target: usize,
    self_pairs: SelfPairPolicy,
}

impl From<&SessionConfig> for PairSelector {
    fn from(settings: &SessionConfig) -> Self {
        let policy = if settings.self_pairs {
            SelfPairPolicy::Ratio(settings.self_pair_ratio)
        } else {
            SelfPairPolicy::Disabled
        };
        Self::new(settings.target).with_self_pairs(policy)
    }
}

impl PairSelector {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            self_pairs: SelfPairPolicy::default(),
        }
    }

    pub fn with_self_pairs(mut self, policy: SelfPairPolicy) -> Self {
        self.self_pairs = policy;
        self
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn self_pair_policy(&self) -> SelfPairPolicy {
        self.self_pairs
    }

    /// Number of slots given to self-pairs for this target.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn self_pair_count(&self) -> usize {
        match self.self_pairs {
            SelfPairPolicy::Disabled => 0,
            SelfPairPolicy::Ratio(_) if self.target == 0 => 0,
            SelfPairPolicy::Ratio(ratio) => {
                let reserved = (self.target as f64 * ratio).round().max(0.0) as usize;
                reserved.max(1).min(self.target)
            }
        }
    }

    /// Select a session sequence from `pools`.
    pub fn select(&self, pools: &PairPools, rng: &mut impl Rng) -> DomainResult<Vec<ImagePair>> {
        let images = pools.images();
        if images.len() < 2 {
            return Err(DomainError::NotEnoughImages {
                found: images.len(),
            });
        }

        let self_count = self.self_pair_count();
        let base_budget = self.target - self_count;

        let mut different = pools.different_pairs.clone();
        shuffle(&mut different, rng);

        let mut sequence = pools.similar_pairs.clone();
        if sequence.len() < base_budget {
            let missing = base_budget - sequence.len();
            sequence.extend(different.into_iter().take(missing));
        } else {
            sequence.truncate(base_budget);
        }

        if self_count > 0 {
            for _ in 0..self_count {
                let image = &images[rng.random_range(0..images.len())];
                sequence.push(ImagePair::self_pair(image.clone()));
            }
            shuffle(&mut sequence, rng);
            sequence.truncate(self.target);
        }

        tracing::debug!(
            session_target = self.target,
            self_pairs = self_count,
            selected = sequence.len(),
            "selected session pairs"
        );
        Ok(sequence)
    }
}
