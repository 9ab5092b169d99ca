//! Data models for NutriAI API payloads.
//!
//! This module contains the request and response shapes exchanged with the
//! remote API:
//!
//! - `Profile`, `ProfileUpdate`, `Registration`, `Preferences`: account data
//! - `Meal`: meal catalogue entries
//! - `Recommendation`, `PlanSlot`: recommendations and plan entries
//! - `FeedbackRequest`, `Feedback`: meal feedback
//!
//! Profiles are passed through untouched; the session core never relies on
//! their shape.

pub mod feedback;
pub mod meal;
pub mod recommendation;
pub mod user;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use feedback::{Feedback, FeedbackRequest};
pub use meal::Meal;
pub use recommendation::{
    ManualPlanEntry, PlanSlot, Recommendation, RecommendationRequest, RecommendationUpdate,
};
pub use user::{AuthResponse, LoginRequest, Preferences, Profile, ProfileUpdate, Registration};

/// Identifier of a server-side record. The API uses both string and numeric
/// ids, so both are accepted and kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => RecordId(s),
            RawId::Integer(n) => RecordId(n.to_string()),
            RawId::Float(n) => RecordId(n.to_string()),
        })
    }
}
