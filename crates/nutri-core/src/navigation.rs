//! Page navigation and the redirect-loop guard.
//!
//! The host (browser shell, terminal, test) implements [`Navigator`]; both
//! the API client and the session controller redirect through a shared
//! [`Redirector`] so that repeated redirects to the same target from the
//! same page collapse into one navigation.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default login page.
pub const LOGIN_PATH: &str = "/login.html";

/// Default landing page for authenticated users.
pub const LANDING_PATH: &str = "/index.html";

/// Pages reachable without authentication.
pub const PUBLIC_PATHS: [&str; 3] = [LOGIN_PATH, "/legistration.html", "/registration.html"];

/// Host capability for reading and changing the current page.
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown, e.g. `/index.html`.
    fn current_path(&self) -> String;

    /// Leave the current page for `target`.
    fn navigate(&self, target: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routes {
    pub login: String,
    pub landing: String,
    pub public: Vec<String>,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            login: LOGIN_PATH.to_string(),
            landing: LANDING_PATH.to_string(),
            public: PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

pub struct Redirector {
    navigator: Arc<dyn Navigator>,
    routes: Routes,
    pending: Mutex<Option<PendingRedirect>>,
}

/// A navigation issued while the host was still showing `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRedirect {
    origin: String,
    target: String,
}

impl Redirector {
    pub fn new(navigator: Arc<dyn Navigator>, routes: Routes) -> Self {
        Self {
            navigator,
            routes,
            pending: Mutex::new(None),
        }
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }

    /// Whether the current path equals or ends with `target`.
    pub fn path_matches(&self, target: &str) -> bool {
        if target.is_empty() {
            return false;
        }
        let target = normalize(target);
        let path = self.navigator.current_path();
        if path.is_empty() {
            return false;
        }
        path == target || path.ends_with(target.as_str())
    }

    pub fn on_public_page(&self) -> bool {
        self.routes.public.iter().any(|p| self.path_matches(p))
    }

    /// Navigate to `target` unless the current page already satisfies it or
    /// the same navigation was already issued from this page. Returns
    /// whether a navigation was issued.
    pub fn redirect_to(&self, target: &str) -> bool {
        if self.path_matches(target) {
            debug!(target, "Already at redirect target");
            return false;
        }
        let redirect = PendingRedirect {
            origin: self.navigator.current_path(),
            target: normalize(target),
        };
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            if pending.as_ref() == Some(&redirect) {
                debug!(target = %redirect.target, "Redirect already pending");
                return false;
            }
            *pending = Some(redirect.clone());
        }
        info!(from = %redirect.origin, to = %redirect.target, "Redirecting");
        self.navigator.navigate(&redirect.target);
        true
    }

    pub fn redirect_to_login(&self) -> bool {
        let login = self.routes.login.clone();
        self.redirect_to(&login)
    }

    pub fn redirect_to_landing(&self) -> bool {
        let landing = self.routes.landing.clone();
        self.redirect_to(&landing)
    }

    /// Forget any pending navigation. Called when a new page has loaded and
    /// whenever a session starts, so the next logout redirects again.
    pub fn page_loaded(&self) {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

fn normalize(target: &str) -> String {
    if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{}", target)
    }
}
