//! [`Notifications`] channel of transient [`Message`]s.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
    time::Duration,
};

use common::DateTime;
use smart_default::SmartDefault;
use tokio::{runtime, sync::watch, task::JoinHandle, time};
use tracing as log;

use crate::domain::{message, Message};

/// [`Notifications`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Time a [`message::Kind::Success`] [`Message`] stays visible.
    #[default(Duration::from_secs(5))]
    pub success_timeout: Duration,

    /// Time a [`Message`] of any other [`message::Kind`] stays visible.
    #[default(Duration::from_secs(7))]
    pub timeout: Duration,
}

impl Config {
    /// Returns the time a [`Message`] of the provided [`message::Kind`] stays
    /// visible.
    #[must_use]
    pub const fn timeout_of(&self, kind: message::Kind) -> Duration {
        match kind {
            message::Kind::Success => self.success_timeout,
            message::Kind::Error
            | message::Kind::Warning
            | message::Kind::Info => self.timeout,
        }
    }
}

/// Channel showing at most one [`Message`] at a time.
///
/// Every new [`Message`] replaces the visible one and cancels its pending
/// dismissal. Clones share the same channel.
#[derive(Clone, Debug)]
pub struct Notifications(Arc<Inner>);

/// Shared state of [`Notifications`].
#[derive(Debug)]
struct Inner {
    /// [`Config`] of the channel.
    config: Config,

    /// Currently visible [`Message`].
    current: watch::Sender<Option<Message>>,

    /// Pending dismissal of the visible [`Message`].
    timer: Mutex<Option<JoinHandle<()>>>,

    /// Counter of issued [`message::Id`]s.
    last_id: AtomicU64,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Notifications {
    /// Creates new [`Notifications`] with the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        let (current, _) = watch::channel(None);
        Self(Arc::new(Inner {
            config,
            current,
            timer: Mutex::default(),
            last_id: AtomicU64::default(),
        }))
    }

    /// Shows a new [`Message`] dismissed automatically after the timeout of
    /// its [`message::Kind`].
    ///
    /// Outside of a Tokio runtime the [`Message`] stays until replaced.
    pub fn show(
        &self,
        text: impl Into<String>,
        kind: message::Kind,
    ) -> message::Id {
        self.replace(text.into(), kind, Some(self.0.config.timeout_of(kind)))
    }

    /// Shows a new [`Message`] staying until replaced or dismissed.
    pub fn show_sticky(
        &self,
        text: impl Into<String>,
        kind: message::Kind,
    ) -> message::Id {
        self.replace(text.into(), kind, None)
    }

    /// Returns the currently visible [`Message`], if any.
    #[must_use]
    pub fn current(&self) -> Option<Message> {
        self.0.current.borrow().clone()
    }

    /// Hides the currently visible [`Message`], if any.
    pub fn dismiss(&self) {
        let mut timer =
            self.0.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(t) = timer.take() {
            t.abort();
        }
        _ = self.0.current.send_replace(None);
    }

    /// Subscribes to changes of the visible [`Message`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Message>> {
        self.0.current.subscribe()
    }

    /// Replaces the visible [`Message`], scheduling its dismissal after the
    /// provided `timeout`, if any.
    fn replace(
        &self,
        text: String,
        kind: message::Kind,
        timeout: Option<Duration>,
    ) -> message::Id {
        let id = message::Id::from(
            self.0.last_id.fetch_add(1, Ordering::Relaxed) + 1,
        );
        let msg = Message {
            id,
            text,
            kind,
            created_at: DateTime::now().coerce(),
        };
        log::debug!(%id, %kind, text = %msg.text, "showing message");

        let mut timer =
            self.0.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(t) = timer.take() {
            t.abort();
        }
        _ = self.0.current.send_replace(Some(msg));

        if let Some(timeout) = timeout {
            match runtime::Handle::try_current() {
                Ok(rt) => {
                    let inner = Arc::downgrade(&self.0);
                    *timer = Some(rt.spawn(dismiss_after(inner, id, timeout)));
                }
                Err(e) => {
                    log::warn!(%id, "message won't be dismissed: {e}");
                }
            }
        }
        id
    }
}

/// Hides the [`Message`] with the provided [`message::Id`] after the
/// `timeout`, unless another one is visible by then.
async fn dismiss_after(inner: Weak<Inner>, id: message::Id, timeout: Duration) {
    time::sleep(timeout).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    _ = inner.current.send_if_modified(|current| {
        if current.as_ref().is_some_and(|m| m.id == id) {
            *current = None;
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use tokio::time;

    use crate::domain::message::Kind;

    use super::Notifications;

    #[tokio::test(start_paused = true)]
    async fn newer_message_survives_stale_timer() {
        let notifications = Notifications::default();

        _ = notifications.show("Saved", Kind::Success);
        time::sleep(Duration::from_secs(4)).await;
        _ = notifications.show("Oops", Kind::Error);

        time::sleep(Duration::from_millis(1500)).await;
        let visible = notifications.current().unwrap();
        assert_eq!(visible.text, "Oops");
        assert_eq!(visible.kind, Kind::Error);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            notifications.current().map(|m| m.text).as_deref(),
            Some("Oops"),
        );

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(notifications.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn dismisses_by_kind() {
        let notifications = Notifications::default();

        _ = notifications.show("Done", Kind::Success);
        time::sleep(Duration::from_millis(4900)).await;
        assert!(notifications.current().is_some());
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(notifications.current(), None);

        _ = notifications.show("Heads up", Kind::Warning);
        time::sleep(Duration::from_millis(6900)).await;
        assert!(notifications.current().is_some());
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(notifications.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn sticky_message_stays() {
        let notifications = Notifications::default();

        _ = notifications.show("Saved", Kind::Success);
        let id = notifications.show_sticky("Check your email", Kind::Info);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(notifications.current().map(|m| m.id), Some(id));

        notifications.dismiss();
        assert_eq!(notifications.current(), None);
    }

    #[tokio::test]
    async fn notifies_subscribers() {
        let notifications = Notifications::default();
        let mut rx = notifications.subscribe();

        let id = notifications.show("Saved", Kind::Success);
        rx.changed().await.unwrap();

        assert_eq!(rx.borrow_and_update().as_ref().map(|m| m.id), Some(id));
    }

    #[test]
    fn works_outside_runtime() {
        let notifications = Notifications::default();

        let first = notifications.show("Saved", Kind::Success);
        let second = notifications.show("Saved again", Kind::Success);

        assert!(second > first);
        assert_eq!(notifications.current().map(|m| m.id), Some(second));
    }
}
