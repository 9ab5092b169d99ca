//! REST API client module for the NutriAI backend.
//!
//! This module provides the `ApiClient`, the single choke point for every
//! request the client makes. The API uses bearer token authentication; the
//! token is obtained from the login and registration endpoints.

pub mod client;
pub mod envelope;
pub mod error;
pub mod transport;

pub use client::{ApiClient, ApiRequest, RequestBody, API_BASE_URL};
pub use envelope::unwrap;
pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
