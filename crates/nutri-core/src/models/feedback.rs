use serde::{Deserialize, Serialize};

use super::RecordId;

/// Body of `POST /feedback`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct FeedbackRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Feedback {
    pub id: Option<RecordId>,
    pub recommendation_id: Option<RecordId>,
    pub meal_id: Option<RecordId>,
    pub liked: Option<bool>,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feedback_request_skips_empty() {
        let req = FeedbackRequest {
            meal_id: Some(RecordId::from(5)),
            liked: Some(true),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "mealId": "5", "liked": true }));
    }

    #[test]
    fn test_parse_feedback() {
        let fb: Feedback = serde_json::from_value(json!({
            "id": 9, "mealId": "m1", "rating": 4, "comment": "tasty", "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(fb.rating, Some(4));
        assert_eq!(fb.meal_id.as_ref().map(RecordId::as_str), Some("m1"));
        assert!(fb.liked.is_none());
    }
}
