//! Page-level session management.
//!
//! `SessionController` resolves who is signed in when a page loads, keeps
//! the session alive while the user is active and ends it after a period of
//! inactivity. Sessions move through three states:
//!
//! ```text
//! Unknown ──identity check──▶ Authenticated ──logout / idle / 401──▶ Unauthenticated
//!    └──────────────no user or failure─────────────────────────────▶ Unauthenticated
//! ```

pub mod activity;
pub mod controller;

pub use activity::{Activity, ActivityFeed, ActivitySource, ActivitySubscription, SubscriptionId};
pub use controller::{LogoutReason, SessionController, INACTIVITY_MESSAGE};

use crate::models::Profile;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// The identity check has not resolved yet.
    #[default]
    Unknown,
    Authenticated(Profile),
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unknown)
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Host capability for telling the user something happened.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}
