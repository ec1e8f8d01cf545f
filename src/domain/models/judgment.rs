//! A single participant decision and its validation from raw input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::pair::ImagePair;
use crate::domain::errors::{DomainError, DomainResult};

/// Binary similarity judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Rating {
    Different,
    Similar,
}

impl Rating {
    pub const fn value(self) -> u64 {
        match self {
            Self::Different => 0,
            Self::Similar => 1,
        }
    }

    /// Accepts exactly `0` or `1`.
    pub fn from_number(n: f64) -> Option<Self> {
        if n == 0.0 {
            Some(Self::Different)
        } else if n == 1.0 {
            Some(Self::Similar)
        } else {
            None
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Different => 0,
            Rating::Similar => 1,
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Different),
            1 => Ok(Self::Similar),
            other => Err(format!("rating must be 0 or 1, got {other}")),
        }
    }
}

/// Judgment payload as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentSubmission {
    #[serde(default, rename = "imgA")]
    pub img_a: Option<String>,
    #[serde(default, rename = "imgB")]
    pub img_b: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

/// A validated judgment, ready to be folded into the aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub pair: ImagePair,
    pub rating: Rating,
    pub duration_ms: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub user: Option<String>,
}

impl Judgment {
    pub fn new(pair: ImagePair, rating: Rating) -> Self {
        Self {
            pair,
            rating,
            duration_ms: None,
            timestamp: Utc::now(),
            user: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = clamp_duration(duration_ms);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = normalize_user(Some(user));
        self
    }

    /// Validate a raw submission.
    ///
    /// Image identifiers must be non-blank and the rating must be the number
    /// `0` or `1`. A missing or malformed timestamp falls back to `now`; a
    /// non-numeric duration is treated as absent.
    pub fn from_submission(submission: &JudgmentSubmission, now: DateTime<Utc>) -> DomainResult<Self> {
        let img_a = required_image(submission.img_a.as_deref(), "imgA")?;
        let img_b = required_image(submission.img_b.as_deref(), "imgB")?;

        let rating = match submission.rating.as_ref().and_then(Value::as_f64) {
            Some(n) => Rating::from_number(n).ok_or_else(|| {
                DomainError::ValidationFailed(format!("rating must be 0 or 1, got {n}"))
            })?,
            None => {
                return Err(DomainError::ValidationFailed(
                    "rating must be a number".to_string(),
                ))
            }
        };

        let duration_ms = submission
            .duration_ms
            .as_ref()
            .and_then(Value::as_f64)
            .and_then(clamp_duration);

        let timestamp = submission
            .timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or(now, |ts| ts.with_timezone(&Utc));

        Ok(Self {
            pair: ImagePair::new(img_a, img_b),
            rating,
            duration_ms,
            timestamp,
            user: normalize_user(submission.username.as_deref()),
        })
    }
}

fn required_image(value: Option<&str>, field: &str) -> DomainResult<String> {
    match value {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => Err(DomainError::ValidationFailed(format!("{field} is required"))),
    }
}

/// `max(0, round(ms))`; non-finite input is dropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_duration(ms: f64) -> Option<u64> {
    if ms.is_finite() {
        Some(ms.round().max(0.0) as u64)
    } else {
        None
    }
}

fn normalize_user(user: Option<&str>) -> Option<String> {
    user.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn submission(value: Value) -> JudgmentSubmission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_submission() {
        let sub = submission(json!({
            "imgA": "a.png",
            "imgB": "b.png",
            "rating": 1,
            "timestamp": "2024-05-01T08:30:00.000Z",
            "durationMs": 812.6,
            "username": "  alice "
        }));
        let judgment = Judgment::from_submission(&sub, now()).unwrap();
        assert_eq!(judgment.pair, ImagePair::new("a.png", "b.png"));
        assert_eq!(judgment.rating, Rating::Similar);
        assert_eq!(judgment.duration_ms, Some(813));
        assert_eq!(judgment.timestamp, "2024-05-01T08:30:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(judgment.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let sub = submission(json!({"imgA": "a.png", "rating": 1}));
        let err = Judgment::from_submission(&sub, now()).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(msg) if msg.contains("imgB")));

        let blank = submission(json!({"imgA": "  ", "imgB": "b.png", "rating": 0}));
        assert!(Judgment::from_submission(&blank, now()).is_err());
    }

    #[test]
    fn test_non_numeric_rating_is_rejected() {
        let sub = submission(json!({"imgA": "a", "imgB": "b", "rating": "1"}));
        assert!(Judgment::from_submission(&sub, now()).is_err());

        let missing = submission(json!({"imgA": "a", "imgB": "b"}));
        assert!(Judgment::from_submission(&missing, now()).is_err());
    }

    #[test]
    fn test_out_of_range_rating_is_rejected() {
        for bad in [json!(2), json!(-1), json!(0.5), json!(5)] {
            let sub = submission(json!({"imgA": "a", "imgB": "b", "rating": bad}));
            assert!(Judgment::from_submission(&sub, now()).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_negative_duration_clamps_to_zero() {
        let sub = submission(json!({"imgA": "a", "imgB": "b", "rating": 0, "durationMs": -40}));
        let judgment = Judgment::from_submission(&sub, now()).unwrap();
        assert_eq!(judgment.duration_ms, Some(0));
    }

    #[test]
    fn test_huge_duration_saturates() {
        let sub = submission(json!({"imgA": "a", "imgB": "b", "rating": 1, "durationMs": 1e300}));
        let judgment = Judgment::from_submission(&sub, now()).unwrap();
        assert_eq!(judgment.duration_ms, Some(u64::MAX));
    }

    #[test]
    fn test_null_or_garbage_duration_is_absent() {
        let null = submission(json!({"imgA": "a", "imgB": "b", "rating": 0, "durationMs": null}));
        assert_eq!(Judgment::from_submission(&null, now()).unwrap().duration_ms, None);

        let text = submission(json!({"imgA": "a", "imgB": "b", "rating": 0, "durationMs": "fast"}));
        assert_eq!(Judgment::from_submission(&text, now()).unwrap().duration_ms, None);
    }

    #[test]
    fn test_malformed_timestamp_defaults_to_now() {
        let sub = submission(json!({"imgA": "a", "imgB": "b", "rating": 1, "timestamp": "yesterday"}));
        assert_eq!(Judgment::from_submission(&sub, now()).unwrap().timestamp, now());
    }

    #[test]
    fn test_blank_username_is_dropped() {
        let sub = submission(json!({"imgA": "a", "imgB": "b", "rating": 1, "username": "   "}));
        assert_eq!(Judgment::from_submission(&sub, now()).unwrap().user, None);
    }

    #[test]
    fn test_non_finite_duration_is_dropped() {
        let judgment = Judgment::new(ImagePair::new("a", "b"), Rating::Similar)
            .with_duration_ms(f64::NAN);
        assert_eq!(judgment.duration_ms, None);
    }

    #[test]
    fn test_rating_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Rating::Similar).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Rating>("0").unwrap(), Rating::Different);
        assert!(serde_json::from_str::<Rating>("3").is_err());
    }
}
