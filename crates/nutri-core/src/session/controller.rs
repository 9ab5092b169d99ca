use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{LoginRequest, Profile, Registration};

use super::activity::{
    watch_inactivity, ActivitySource, ActivitySubscription, SubscriptionId, WatchEnd,
};
use super::{Notifier, SessionState};

/// Shown to the user when the inactivity timer ends the session.
pub const INACTIVITY_MESSAGE: &str = "You were logged out due to inactivity.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to sign out.
    Explicit,
    /// The inactivity window elapsed.
    Inactivity,
    /// The server rejected the credential on some request.
    CredentialRevoked,
}

/// Owner of the page's session state and its inactivity timer.
/// Clone is cheap; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    api: ApiClient,
    activity: Arc<dyn ActivitySource>,
    notifier: Arc<dyn Notifier>,
    window: Duration,
    state: watch::Sender<SessionState>,
    // Also serializes state transitions.
    timer: Mutex<Option<ArmedTimer>>,
    epoch: AtomicU64,
    // Set once the page-load identity check has run.
    loaded: tokio::sync::Mutex<bool>,
}

struct ArmedTimer {
    epoch: u64,
    subscription: SubscriptionId,
    handle: JoinHandle<()>,
}

impl SessionController {
    pub fn new(
        api: ApiClient,
        activity: Arc<dyn ActivitySource>,
        notifier: Arc<dyn Notifier>,
        inactivity_window: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            inner: Arc::new(Inner {
                api,
                activity,
                notifier,
                window: inactivity_window,
                state,
                timer: Mutex::new(None),
                epoch: AtomicU64::new(0),
                loaded: tokio::sync::Mutex::new(false),
            }),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Observe state changes, e.g. to toggle authenticated-only UI.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.inner.lock_timer().is_some()
    }

    /// Resolve the session for a freshly loaded page.
    ///
    /// Runs the identity check once; concurrent and later calls wait for it
    /// and return the current state. Failures of any kind resolve to
    /// `Unauthenticated`.
    pub async fn load(&self) -> SessionState {
        let mut loaded = self.inner.loaded.lock().await;
        if *loaded {
            return self.state();
        }
        let state = self.inner.resolve().await;
        *loaded = true;
        state
    }

    /// Log in, then re-derive the session from a fresh identity check.
    /// Errors from the login call itself are returned for the form to show.
    pub async fn sign_in(&self, request: &LoginRequest) -> Result<SessionState, ApiError> {
        self.inner.api.login(request).await?;
        Ok(self.inner.resolve().await)
    }

    /// Register, then re-derive the session from a fresh identity check.
    pub async fn sign_up(&self, registration: &Registration) -> Result<SessionState, ApiError> {
        self.inner.api.register(registration).await?;
        Ok(self.inner.resolve().await)
    }

    /// End the session at the user's request: no notification, straight to
    /// the login page.
    pub fn sign_out(&self) {
        self.inner.end_session(LogoutReason::Explicit, None);
    }
}

impl Inner {
    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<ArmedTimer>> {
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn resolve(self: &Arc<Self>) -> SessionState {
        match self.api.me().await {
            Ok(Some(profile)) => self.enter_authenticated(profile),
            Ok(None) => {
                debug!("Identity check returned no user");
                self.enter_unauthenticated()
            }
            Err(e) => {
                debug!(error = %e, "Identity check failed");
                self.enter_unauthenticated()
            }
        }
    }

    fn enter_authenticated(self: &Arc<Self>, profile: Profile) -> SessionState {
        let presence = self.api.credential_presence();
        if !*presence.borrow() {
            warn!("Identity check succeeded but no credential is held");
            return self.enter_unauthenticated();
        }

        let state = SessionState::Authenticated(profile);
        {
            let mut timer = self.lock_timer();
            if let Some(previous) = timer.take() {
                self.cancel(previous);
            }
            self.state.send_replace(state.clone());
            *timer = Some(self.arm(presence));
        }
        info!(
            user = state.profile().map(Profile::display_label).unwrap_or_default(),
            "Session authenticated"
        );

        let redirector = self.api.redirector();
        redirector.page_loaded();
        if redirector.on_public_page() {
            redirector.redirect_to_landing();
        }
        state
    }

    fn enter_unauthenticated(&self) -> SessionState {
        {
            let mut timer = self.lock_timer();
            if let Some(previous) = timer.take() {
                self.cancel(previous);
            }
            self.state.send_replace(SessionState::Unauthenticated);
        }
        info!("Session unauthenticated");

        let redirector = self.api.redirector();
        if !redirector.on_public_page() {
            redirector.redirect_to_login();
        }
        SessionState::Unauthenticated
    }

    fn arm(self: &Arc<Self>, presence: watch::Receiver<bool>) -> ArmedTimer {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let ActivitySubscription { id: subscription, events } = self.activity.subscribe();
        let deadline = Instant::now() + self.window;
        let window = self.window;
        let inner: Weak<Inner> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let end = watch_inactivity(deadline, window, events, presence).await;
            if let Some(inner) = inner.upgrade() {
                let reason = match end {
                    WatchEnd::Idle => LogoutReason::Inactivity,
                    WatchEnd::CredentialLost => LogoutReason::CredentialRevoked,
                };
                inner.end_session(reason, Some(epoch));
            }
        });
        debug!(epoch, window_secs = window.as_secs(), "Inactivity timer armed");

        ArmedTimer {
            epoch,
            subscription,
            handle,
        }
    }

    fn cancel(&self, timer: ArmedTimer) {
        self.activity.unsubscribe(timer.subscription);
        timer.handle.abort();
        debug!(epoch = timer.epoch, "Inactivity timer disarmed");
    }

    /// Leave the authenticated state. `epoch` is set when the timer task
    /// itself ends the session; a stale epoch makes the call a no-op so a
    /// timer racing an explicit logout never fires a second transition.
    fn end_session(&self, reason: LogoutReason, epoch: Option<u64>) {
        {
            let mut timer = self.lock_timer();
            match epoch {
                Some(epoch) => {
                    match timer.as_ref() {
                        Some(armed) if armed.epoch == epoch => {}
                        _ => return,
                    }
                    // Ending from inside the timer task: release the
                    // listener, let the task finish on its own.
                    if let Some(armed) = timer.take() {
                        self.activity.unsubscribe(armed.subscription);
                    }
                }
                None => {
                    if let Some(armed) = timer.take() {
                        self.cancel(armed);
                    }
                }
            }
            // Clear before publishing, so nobody reacting to the new state
            // can sign in and then lose the fresh credential.
            self.api.logout();
            self.state.send_replace(SessionState::Unauthenticated);
        }

        let redirector = self.api.redirector();
        match reason {
            LogoutReason::Explicit => {
                info!("Signed out");
                redirector.redirect_to_login();
            }
            LogoutReason::Inactivity => {
                info!(window_secs = self.window.as_secs(), "Signed out after inactivity");
                self.notifier.notify(INACTIVITY_MESSAGE);
                redirector.redirect_to_login();
            }
            LogoutReason::CredentialRevoked => {
                info!("Credential revoked, session ended");
                if !redirector.on_public_page() {
                    redirector.redirect_to_login();
                }
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let armed = self.timer.get_mut().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(armed) = armed {
            self.cancel(armed);
        }
    }
}
