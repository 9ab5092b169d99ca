//! Core library for the NutriAI client.
//!
//! This crate contains the session and API plumbing shared by every page of
//! the client:
//! - `api`: the authenticated request primitive and typed operations
//! - `auth`: credential storage backends
//! - `session`: page-load identity resolution and inactivity logout
//! - `navigation`: the redirect policy between login and landing pages
//! - `models`: request and response payloads
//! - `config`: configuration loading
//!
//! Host capabilities (navigation, notifications, activity signals, token
//! storage and the HTTP transport) are traits so the core runs the same in a
//! terminal, a webview shell or a test.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, ApiRequest};
pub use config::Config;
pub use navigation::{Navigator, Redirector};
pub use session::{Notifier, SessionController, SessionState};
