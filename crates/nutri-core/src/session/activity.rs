//! User-activity signals and the inactivity countdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::trace;

/// Interaction that proves the user is still present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Click,
    KeyDown,
    PointerMove,
    Scroll,
    TouchStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct ActivitySubscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<Activity>,
}

/// Host capability delivering activity signals.
pub trait ActivitySource: Send + Sync {
    fn subscribe(&self) -> ActivitySubscription;

    /// Stop delivering to `id`. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// In-process activity source: the host calls [`ActivityFeed::emit`] from
/// its input handlers.
#[derive(Default)]
pub struct ActivityFeed {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<Activity>>>,
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `activity` to every listener; returns how many received it.
    pub fn emit(&self, activity: Activity) -> usize {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|_, tx| tx.send(activity).is_ok());
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl ActivitySource for ActivityFeed {
    fn subscribe(&self) -> ActivitySubscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, events) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);
        ActivitySubscription { id, events }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }
}

/// Why an inactivity watch stopped on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchEnd {
    /// The full window elapsed without activity.
    Idle,
    /// The credential was cleared underneath the session.
    CredentialLost,
}

/// Count down from `deadline`, pushing it to `now + window` on every
/// activity signal. Resolves when the window elapses or the credential
/// disappears, whichever comes first.
pub(crate) async fn watch_inactivity(
    deadline: Instant,
    window: Duration,
    mut events: mpsc::UnboundedReceiver<Activity>,
    mut presence: watch::Receiver<bool>,
) -> WatchEnd {
    let timer = sleep_until(deadline);
    tokio::pin!(timer);
    let mut listening = true;
    let mut tracking_credential = true;

    loop {
        tokio::select! {
            biased;

            event = events.recv(), if listening => match event {
                Some(activity) => {
                    trace!(?activity, "Activity, inactivity window reset");
                    timer.as_mut().reset(Instant::now() + window);
                }
                None => listening = false,
            },
            changed = presence.changed(), if tracking_credential => match changed {
                Ok(()) => {
                    if !*presence.borrow_and_update() {
                        return WatchEnd::CredentialLost;
                    }
                }
                Err(_) => tracking_credential = false,
            },
            () = &mut timer => return WatchEnd::Idle,
        }
    }
}
