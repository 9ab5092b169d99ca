//! API client for the NutriAI backend.
//!
//! Every outbound call goes through [`ApiClient::send`], which attaches the
//! bearer credential, serializes the body, performs exactly one exchange and
//! classifies the answer. The typed operations below are thin wrappers over
//! that primitive and the envelope helpers.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{CredentialSlot, TokenStore};
use crate::config::Config;
use crate::models::{
    AuthResponse, Feedback, FeedbackRequest, LoginRequest, ManualPlanEntry, Meal, Preferences,
    Profile, ProfileUpdate, Recommendation, RecommendationRequest, RecommendationUpdate, RecordId,
    Registration,
};
use crate::navigation::Redirector;

use super::envelope::{unwrap, unwrap_as};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use super::ApiError;

/// Base URL of the NutriAI API.
pub const API_BASE_URL: &str = "https://wpback.boramae.dev/api";

/// Default page size for `list_feedback`.
const DEFAULT_FEEDBACK_LIMIT: u32 = 20;

const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured data, serialized as JSON.
    Json(Value),
    /// Sent verbatim.
    Text(String),
}

/// One outbound call: method, path relative to the API base, optional body
/// and header overrides.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<RequestBody>,
    headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("failed to encode body: {}", e)))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// Override or add a header. Overrides win over the defaults.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// API client for NutriAI.
/// Clone is cheap - all state is shared behind `Arc`s, so every clone sees
/// the same credential.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: Arc<str>,
    credential: Arc<CredentialSlot>,
    redirector: Arc<Redirector>,
}

impl ApiClient {
    /// Create a client talking HTTP to the configured API.
    pub fn new(
        config: &Config,
        store: Box<dyn TokenStore>,
        redirector: Arc<Redirector>,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(
            Arc::new(transport),
            &config.api_base_url,
            store,
            redirector,
        ))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        base_url: &str,
        store: Box<dyn TokenStore>,
        redirector: Arc<Redirector>,
    ) -> Self {
        Self {
            transport,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            credential: Arc::new(CredentialSlot::new(store)),
            redirector,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn redirector(&self) -> &Arc<Redirector> {
        &self.redirector
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_present()
    }

    /// Watch credential presence. Flips to `false` whenever the credential
    /// is cleared (logout, 401, inactivity).
    pub fn credential_presence(&self) -> watch::Receiver<bool> {
        self.credential.subscribe()
    }

    // ===== Request primitive =====

    /// Send one request and classify the answer.
    ///
    /// - 401: the credential is cleared, the login redirect policy applies,
    ///   and the call fails with [`ApiError::Unauthorized`].
    /// - other non-2xx: [`ApiError::RequestFailed`] with status and body.
    /// - 2xx: the parsed body, or `Value::Null` when it cannot be parsed.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let ApiRequest {
            method,
            path,
            body,
            headers: overrides,
        } = request;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MIME));
        if let Some(token) = self.credential.get() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::InvalidRequest("stored credential is not a valid header value".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.extend(overrides);

        let body = body.map(|body| {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME));
            }
            match body {
                RequestBody::Json(value) => value.to_string(),
                RequestBody::Text(text) => text,
            }
        });

        debug!(method = %method, path = %path, "Sending request");
        let response = self
            .transport
            .send(HttpRequest {
                method: method.clone(),
                url: format!("{}{}", self.base_url, path),
                headers,
                body,
            })
            .await
            .map_err(|e| {
                warn!(method = %method, path = %path, error = %e, "Request did not complete");
                e
            })?;

        let status = response.status;
        let body = parse_body(&response);

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(&path);
            return Err(ApiError::Unauthorized { body });
        }
        if !status.is_success() {
            warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                body = %ApiError::truncate_body(&body),
                "Request failed"
            );
            return Err(ApiError::RequestFailed { status, body });
        }

        debug!(method = %method, path = %path, status = status.as_u16(), "Request succeeded");
        Ok(body)
    }

    fn handle_unauthorized(&self, path: &str) {
        if self.credential.clear() {
            info!(path, "Credential rejected by server, cleared");
        } else {
            debug!(path, "Unauthorized response with no credential held");
        }
        if !self.redirector.on_public_page() {
            self.redirector.redirect_to_login();
        }
    }

    async fn send_unwrapped<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        key: &str,
        fallback: T,
    ) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        unwrap_as(&body, key, fallback)
    }

    // ===== Authentication =====

    /// Log in and keep the returned token as the credential.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let body = self
            .send(ApiRequest::post("/auth/login").json(request)?)
            .await?;
        Ok(self.accept_auth_response(body))
    }

    /// Create an account and keep the returned token as the credential.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let body = self
            .send(ApiRequest::post("/auth/register").json(registration)?)
            .await?;
        Ok(self.accept_auth_response(body))
    }

    fn accept_auth_response(&self, body: Value) -> AuthResponse {
        let auth: AuthResponse = serde_json::from_value(body).unwrap_or_default();
        match auth.token.as_deref() {
            Some(token) if !token.is_empty() => {
                self.credential.set(token);
                info!("Credential stored");
            }
            _ => debug!("Auth response carried no token"),
        }
        auth
    }

    /// Forget the credential. Local only: no request, no navigation.
    pub fn logout(&self) {
        if self.credential.clear() {
            info!("Logged out, credential cleared");
        }
    }

    /// Who is signed in, or `None` when the server reports no user.
    pub async fn me(&self) -> Result<Option<Profile>, ApiError> {
        self.send_unwrapped(ApiRequest::get("/auth/me"), "user", None)
            .await
    }

    /// Whether an account already uses `email`.
    pub async fn check_email(&self, email: &str) -> Result<bool, ApiError> {
        if email.is_empty() {
            return Ok(false);
        }
        let path = with_query("/auth/check-email", &[("email", email)]);
        let body = self.send(ApiRequest::get(path)).await?;
        Ok(is_truthy(body.get("exists")))
    }

    // ===== Recommendations =====

    pub async fn create_recommendation(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Value, ApiError> {
        self.send(ApiRequest::post("/recommendations").json(request)?)
            .await
    }

    pub async fn create_manual_plan_entry(
        &self,
        entry: &ManualPlanEntry,
    ) -> Result<Option<Recommendation>, ApiError> {
        let request = ApiRequest::post("/recommendations/manual").json(entry)?;
        self.send_unwrapped(request, "recommendation", None).await
    }

    pub async fn update_recommendation(
        &self,
        id: &RecordId,
        update: &RecommendationUpdate,
    ) -> Result<Option<Recommendation>, ApiError> {
        require_id(id, "Recommendation")?;
        let request = ApiRequest::patch(format!("/recommendations/{}", encode_segment(id))).json(update)?;
        self.send_unwrapped(request, "recommendation", None).await
    }

    pub async fn delete_recommendation(&self, id: &RecordId) -> Result<(), ApiError> {
        require_id(id, "Recommendation")?;
        self.send(ApiRequest::delete(format!(
            "/recommendations/{}",
            encode_segment(id)
        )))
        .await?;
        Ok(())
    }

    /// List recommendations, e.g. `&[("limit", "30")]`.
    pub async fn list_recommendations(
        &self,
        query: &[(&str, &str)],
    ) -> Result<Vec<Recommendation>, ApiError> {
        let path = with_query("/recommendations", query);
        self.send_unwrapped(ApiRequest::get(path), "recommendations", Vec::new())
            .await
    }

    // ===== Feedback =====

    pub async fn submit_feedback(
        &self,
        feedback: &FeedbackRequest,
    ) -> Result<Option<Feedback>, ApiError> {
        let request = ApiRequest::post("/feedback").json(feedback)?;
        self.send_unwrapped(request, "feedback", None).await
    }

    pub async fn list_feedback(&self, limit: Option<u32>) -> Result<Vec<Feedback>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_FEEDBACK_LIMIT).to_string();
        let path = with_query("/feedback", &[("limit", limit.as_str())]);
        self.send_unwrapped(ApiRequest::get(path), "feedback", Vec::new())
            .await
    }

    // ===== Meals =====

    /// Fetch one meal. An empty id resolves to `None` without a request.
    pub async fn get_meal(&self, id: &RecordId) -> Result<Option<Meal>, ApiError> {
        if id.is_empty() {
            return Ok(None);
        }
        let path = format!("/meals/{}", encode_segment(id));
        self.send_unwrapped(ApiRequest::get(path), "meal", None).await
    }

    pub async fn get_meals(&self, query: &[(&str, &str)]) -> Result<Vec<Meal>, ApiError> {
        let path = with_query("/meals", query);
        self.send_unwrapped(ApiRequest::get(path), "meals", Vec::new())
            .await
    }

    // ===== Nutrition & dashboard =====

    pub async fn upsert_nutrition_log(&self, log: &Value) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/nutrition/logs").json(log)?;
        let body = self.send(request).await?;
        Ok(unwrap(&body, "log", Value::Null))
    }

    pub async fn get_dashboard(&self) -> Result<Value, ApiError> {
        self.send(ApiRequest::get("/dashboard")).await
    }

    // ===== Profile =====

    pub async fn get_profile(&self) -> Result<Option<Profile>, ApiError> {
        self.send_unwrapped(ApiRequest::get("/users/me"), "user", None)
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<Profile>, ApiError> {
        let request = ApiRequest::patch("/users/me").json(update)?;
        self.send_unwrapped(request, "user", None).await
    }

    pub async fn get_preferences(&self) -> Result<Option<Preferences>, ApiError> {
        self.send_unwrapped(ApiRequest::get("/users/preferences"), "preferences", None)
            .await
    }

    pub async fn update_preferences(
        &self,
        preferences: &Preferences,
    ) -> Result<Option<Preferences>, ApiError> {
        let request = ApiRequest::put("/users/preferences").json(preferences)?;
        self.send_unwrapped(request, "preferences", None).await
    }
}

/// Parse a response body: JSON when declared, text otherwise. Anything that
/// fails to parse becomes `Value::Null`.
fn parse_body(response: &HttpResponse) -> Value {
    if response.is_json() {
        serde_json::from_slice(&response.body).unwrap_or(Value::Null)
    } else {
        match String::from_utf8(response.body.clone()) {
            Ok(text) => Value::String(text),
            Err(_) => Value::Null,
        }
    }
}

fn with_query(path: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let pairs: Vec<String> = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{}?{}", path, pairs.join("&"))
}

fn encode_segment(id: &RecordId) -> String {
    urlencoding::encode(id.as_str()).into_owned()
}

fn require_id(id: &RecordId, what: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::InvalidRequest(format!("{} id is required", what)));
    }
    Ok(())
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
