use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in user as the API describes them. Kept as raw JSON so new
/// server fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Value);

impl Profile {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    /// Label for the navigation bar: name, then email, then "Profile".
    pub fn display_label(&self) -> &str {
        self.name().or_else(|| self.email()).unwrap_or("Profile")
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

/// Body of `POST /auth/login`. The identifier is an email or a username.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }
}

/// Answer to login and registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Profile>,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preferred_cuisines: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allergies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
}

/// Body of `PATCH /users/me`; unset fields are left unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_meal_types: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_accessors() {
        let profile = Profile::new(json!({ "id": 17, "name": "Mina", "email": "mina@example.com" }));
        assert_eq!(profile.id().as_deref(), Some("17"));
        assert_eq!(profile.display_label(), "Mina");

        let profile = Profile::new(json!({ "id": "u1", "name": "", "email": "mina@example.com" }));
        assert_eq!(profile.display_label(), "mina@example.com");

        assert_eq!(Profile::new(json!({})).display_label(), "Profile");
    }

    #[test]
    fn test_profile_passes_through_unknown_fields() {
        let raw = json!({ "id": 1, "heightCm": 170, "nested": { "a": [1, 2] } });
        let profile: Profile = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&profile).unwrap(), raw);
    }

    #[test]
    fn test_auth_response_without_token() {
        let auth: AuthResponse = serde_json::from_value(json!({ "user": { "id": 1 } })).unwrap();
        assert!(auth.token.is_none());
        assert!(auth.user.is_some());
    }

    #[test]
    fn test_profile_update_omits_unset() {
        let update = ProfileUpdate {
            weight_kg: Some(62.5),
            allergies: Some(vec!["peanut".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "weightKg": 62.5, "allergies": ["peanut"] })
        );
    }

    #[test]
    fn test_registration_wire_format() {
        let reg = Registration {
            name: "Mina".to_string(),
            email: "mina@example.com".to_string(),
            password: "secret".to_string(),
            goal_type: Some("LOSE_WEIGHT".to_string()),
            activity_level: Some("MODERATE".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&reg).unwrap(),
            json!({
                "name": "Mina",
                "email": "mina@example.com",
                "password": "secret",
                "goalType": "LOSE_WEIGHT",
                "activityLevel": "MODERATE"
            })
        );
    }

    #[test]
    fn test_preferences_keep_extra_fields() {
        let prefs: Preferences =
            serde_json::from_value(json!({ "preferredMealTypes": ["LUNCH"], "spiceLevel": 2 })).unwrap();
        assert_eq!(prefs.preferred_meal_types, Some(vec!["LUNCH".to_string()]));
        assert_eq!(prefs.extra.get("spiceLevel"), Some(&json!(2)));
    }
}
