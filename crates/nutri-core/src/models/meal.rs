use serde::{Deserialize, Serialize};

use super::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Meal {
    pub id: Option<RecordId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub serving_size: Option<String>,
    pub source: Option<String>,
}

impl Meal {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled meal")
    }

    /// One-line macro summary, e.g. "520 kcal · P 32g · C 48g · F 18g".
    pub fn macro_summary(&self) -> String {
        let grams = |label: &str, v: Option<f64>| match v {
            Some(v) => format!("{} {}g", label, v.round()),
            None => format!("{} -", label),
        };
        let kcal = match self.calories {
            Some(c) => format!("{} kcal", c.round()),
            None => "- kcal".to_string(),
        };
        format!(
            "{} · {} · {} · {}",
            kcal,
            grams("P", self.protein),
            grams("C", self.carbs),
            grams("F", self.fat)
        )
    }
}
