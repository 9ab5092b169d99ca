use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Meal, RecordId};

/// Slot of the daily plan a meal is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PlanSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl PlanSlot {
    pub const ALL: [PlanSlot; 4] = [
        PlanSlot::Breakfast,
        PlanSlot::Lunch,
        PlanSlot::Dinner,
        PlanSlot::Snack,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlanSlot::Breakfast => "Breakfast",
            PlanSlot::Lunch => "Lunch",
            PlanSlot::Dinner => "Dinner",
            PlanSlot::Snack => "Snack",
        }
    }

    /// Parse a slot name case-insensitively ("lunch", "LUNCH", "Lunch").
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.label().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for PlanSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Recommendation {
    pub id: Option<RecordId>,
    pub meal: Option<Meal>,
    pub reason: Option<String>,
    pub status: Option<String>,
    pub plan_slot: Option<PlanSlot>,
    #[serde(default)]
    pub consumed: bool,
}

impl Recommendation {
    pub fn is_accepted(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("ACCEPTED"))
            .unwrap_or(false)
    }
}

/// Body of `POST /recommendations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RecommendationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<PlanSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<String>,
}

/// Body of `PATCH /recommendations/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RecommendationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_slot: Option<PlanSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed: Option<bool>,
}

impl RecommendationUpdate {
    /// Accept a recommendation into a plan slot.
    pub fn accept(slot: PlanSlot) -> Self {
        Self {
            status: Some("ACCEPTED".to_string()),
            plan_slot: Some(slot),
            consumed: None,
        }
    }
}

/// Body of `POST /recommendations/manual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ManualPlanEntry {
    pub name: String,
    pub plan_slot: PlanSlot,
}
