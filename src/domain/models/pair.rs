//! Image pairs and their order-independent canonical key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when a [`PairKey`] is flattened into a single string.
pub const PAIR_KEY_SEPARATOR: &str = "__";

/// An ordered pair of images as presented to a participant.
///
/// `img_a` is shown on the left, `img_b` on the right. Aggregation ignores
/// the order; see [`PairKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImagePair {
    #[serde(rename = "imgA")]
    pub img_a: String,
    #[serde(rename = "imgB")]
    pub img_b: String,
}

impl ImagePair {
    pub fn new(img_a: impl Into<String>, img_b: impl Into<String>) -> Self {
        Self {
            img_a: img_a.into(),
            img_b: img_b.into(),
        }
    }

    /// A pair comparing one image against itself, used as an attention check.
    pub fn self_pair(image: impl Into<String>) -> Self {
        let image = image.into();
        Self {
            img_a: image.clone(),
            img_b: image,
        }
    }

    pub fn is_self_pair(&self) -> bool {
        self.img_a == self.img_b
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.img_a, &self.img_b)
    }
}

/// Canonical identity of an unordered image pair.
///
/// The two identifiers are held sorted, so `PairKey::new(a, b)` and
/// `PairKey::new(b, a)` compare equal and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                first: a.to_string(),
                second: b.to_string(),
            }
        } else {
            Self {
                first: b.to_string(),
                second: a.to_string(),
            }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Flatten into the string form used as a map key on disk.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.first, PAIR_KEY_SEPARATOR, self.second)
    }

    /// Recover a key from its flattened form.
    ///
    /// Splits on the first separator, so identifiers that themselves contain
    /// `"__"` in the first position are not recovered faithfully. Only used for
    /// entries written without explicit image fields.
    pub fn decode(encoded: &str) -> Self {
        match encoded.split_once(PAIR_KEY_SEPARATOR) {
            Some((a, b)) => Self::new(a, b),
            None => Self::new(encoded, ""),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<&ImagePair> for PairKey {
    fn from(pair: &ImagePair) -> Self {
        pair.key()
    }
}
