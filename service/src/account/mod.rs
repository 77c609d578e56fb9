//! [`Account`] context of a single client.
//!
//! Composes the current [`Session`], the [`Subscription`] of its [`User`],
//! the [`Tier`] gate and the [`Notifications`] channel into one explicitly
//! constructed object.

pub mod command;
mod listener;

use std::{
    fmt,
    sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use common::operations::{By, Delete, Insert, Select};
use tokio::{sync::broadcast::error::RecvError, time::Instant};
use tracerr::Traced;
use tracing as log;
use url::Url;

use crate::{
    domain::{message, tier, user, Session, Subscription, Tier, User},
    error::{Categorize, Category},
    infra::{
        auth::{self, AuthEvent, Events},
        storage, Auth, Storage,
    },
    notification::{self, Notifications},
};

pub use self::{command::Command, listener::Unsubscribe};

/// Path the provider redirects to after an email confirmation or an OAuth
/// sign-in.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Path the provider redirects to from a password reset email.
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

/// Text shown when an external provider cannot be reached.
const NETWORK_ERROR: &str =
    "Network error. Please check your connection and try again.";

/// [`Account`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Public URL of the site, used to build redirect links.
    pub site_url: Url,

    /// Minimum length of a new password in characters.
    pub password_min_length: usize,

    /// Time without activity after which the current [`Session`] is
    /// considered ended.
    pub inactivity_timeout: Duration,

    /// [`Notifications`] configuration.
    pub notifications: notification::Config,
}

impl Config {
    /// Default [`Config::password_min_length`].
    pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 6;

    /// Default [`Config::inactivity_timeout`].
    pub const DEFAULT_INACTIVITY_TIMEOUT: Duration =
        Duration::from_secs(24 * 60 * 60);

    /// Creates a new [`Config`] for the provided `site_url` with default
    /// values of everything else.
    #[must_use]
    pub fn new(site_url: Url) -> Self {
        Self {
            site_url,
            password_min_length: Self::DEFAULT_PASSWORD_MIN_LENGTH,
            inactivity_timeout: Self::DEFAULT_INACTIVITY_TIMEOUT,
            notifications: notification::Config::default(),
        }
    }

    /// Returns the URL of the provided `path` on the site.
    #[must_use]
    pub fn redirect_to(&self, path: &str) -> Url {
        self.site_url.join(path).unwrap_or_else(|e| {
            log::warn!(site_url = %self.site_url, path, "bad redirect: {e}");
            self.site_url.clone()
        })
    }
}

/// [`Storage`] of [`Subscription`]s an [`Account`] relies on.
pub trait SubscriptionStorage:
    Storage<
        Select<By<Option<Subscription>, user::Id>>,
        Ok = Option<Subscription>,
        Err = Traced<storage::Error>,
    > + Storage<Insert<Subscription>, Ok = (), Err = Traced<storage::Error>>
    + Storage<
        Delete<By<Subscription, user::Id>>,
        Ok = (),
        Err = Traced<storage::Error>,
    >
{
}

impl<T> SubscriptionStorage for T where
    T: Storage<
            Select<By<Option<Subscription>, user::Id>>,
            Ok = Option<Subscription>,
            Err = Traced<storage::Error>,
        > + Storage<Insert<Subscription>, Ok = (), Err = Traced<storage::Error>>
        + Storage<
            Delete<By<Subscription, user::Id>>,
            Ok = (),
            Err = Traced<storage::Error>,
        >
{
}

/// Account state of a single client.
#[derive(Debug)]
pub struct Account<A, B, S> {
    /// [`Config`] of this [`Account`].
    config: Config,

    /// Authentication provider.
    auth: A,

    /// Payment gateway.
    billing: B,

    /// [`Subscription`]s storage.
    storage: S,

    /// Current [`State`].
    state: RwLock<State>,

    /// [`AuthEvent`]s not consumed by [`Account::listen()`] yet.
    events: Mutex<Option<Events>>,

    /// Listeners registered via [`Account::on_auth_change()`].
    listeners: listener::Registry,

    /// [`Notifications`] channel of this [`Account`].
    notifications: Notifications,
}

/// Mutable state of an [`Account`].
#[derive(Debug, Default)]
struct State {
    /// Current [`Session`] along with its [`User`].
    session: Option<Session>,

    /// [`Subscription`] of the [`Session`]'s [`User`].
    subscription: Option<Subscription>,

    /// Indicator whether a mutation is in progress.
    is_authenticating: bool,

    /// Indicator whether [`command::Initialize`] has completed.
    is_initialized: bool,

    /// Moment of the last activity within the current [`Session`].
    last_activity: Option<Instant>,
}

impl State {
    /// Indicates whether the current [`Session`] has seen no activity for
    /// longer than the provided `timeout`.
    fn is_idle(&self, timeout: Duration) -> bool {
        self.last_activity.is_some_and(|at| at.elapsed() > timeout)
    }

    /// Returns the current [`Session`], unless it has expired or has been
    /// idle for longer than the provided `timeout`.
    fn live_session(&self, timeout: Duration) -> Option<&Session> {
        if self.is_idle(timeout) {
            return None;
        }
        self.session.as_ref().filter(|s| !s.is_expired())
    }

    /// Returns the [`Subscription`] of the [`State::live_session()`].
    fn live_subscription(&self, timeout: Duration) -> Option<&Subscription> {
        self.live_session(timeout).and(self.subscription.as_ref())
    }
}

impl<A, B, S> Account<A, B, S> {
    /// Creates a new signed-out [`Account`].
    #[must_use]
    pub fn new(config: Config, auth: A, billing: B, storage: S) -> Self {
        let notifications = Notifications::new(config.notifications);
        Self {
            config,
            auth,
            billing,
            storage,
            state: RwLock::default(),
            events: Mutex::default(),
            listeners: listener::Registry::default(),
            notifications,
        }
    }

    /// Returns [`Config`] of this [`Account`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the authentication provider of this [`Account`].
    #[must_use]
    pub const fn auth(&self) -> &A {
        &self.auth
    }

    /// Returns the payment gateway of this [`Account`].
    #[must_use]
    pub const fn billing(&self) -> &B {
        &self.billing
    }

    /// Returns the [`Subscription`]s storage of this [`Account`].
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the [`Notifications`] channel of this [`Account`].
    #[must_use]
    pub const fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Returns the current [`Session`], if any.
    ///
    /// An expired or idle [`Session`] is never returned, even before
    /// [`command::RefreshSession`] ends it.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.read().live_session(self.idle_timeout()).cloned()
    }

    /// Returns the signed-in [`User`], if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read()
            .live_session(self.idle_timeout())
            .map(|s| s.user.clone())
    }

    /// Returns the [`Subscription`] of the signed-in [`User`], if loaded.
    #[must_use]
    pub fn subscription(&self) -> Option<Subscription> {
        self.read().live_subscription(self.idle_timeout()).cloned()
    }

    /// Returns the [`Tier`] the signed-in [`User`] is entitled to.
    #[must_use]
    pub fn tier(&self) -> Tier {
        let state = self.read();
        let timeout = self.idle_timeout();
        tier::tier_of(
            state.live_session(timeout).map(|s| &s.user),
            state.live_subscription(timeout),
        )
    }

    /// Indicates whether the current [`Tier`] grants features of the
    /// `required` one.
    #[must_use]
    pub fn can_access(&self, required: Tier) -> bool {
        tier::can_access(self.tier(), required)
    }

    /// Indicates whether the `word_count` exceeds the limit of the current
    /// [`Tier`].
    #[must_use]
    pub fn is_over_limit(&self, word_count: usize) -> bool {
        tier::is_over_limit(word_count, self.tier())
    }

    /// Returns the number of days left in the current [`Subscription`].
    #[must_use]
    pub fn days_remaining(&self) -> u32 {
        self.read()
            .live_subscription(self.idle_timeout())
            .map_or(0, Subscription::days_remaining)
    }

    /// Indicates whether the current [`Subscription`] is active.
    #[must_use]
    pub fn is_subscription_active(&self) -> bool {
        self.read()
            .live_subscription(self.idle_timeout())
            .is_some_and(Subscription::is_active)
    }

    /// Indicates whether a mutation is in progress, so another one would be
    /// rejected.
    #[must_use]
    pub fn is_authenticating(&self) -> bool {
        self.read().is_authenticating
    }

    /// Indicates whether [`command::Initialize`] has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.read().is_initialized
    }

    /// Registers the `listener` to be called on every [`AuthEvent`] applied
    /// by this [`Account`].
    ///
    /// The `listener` is removed once the returned [`Unsubscribe`] handle is
    /// dropped.
    pub fn on_auth_change(
        &self,
        listener: impl Fn(&AuthEvent) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.listeners.add(listener)
    }

    /// Records an activity of the signed-in [`User`], postponing the end of
    /// an idle [`Session`].
    ///
    /// Does nothing once the [`Session`] is idle or expired already.
    pub fn touch(&self) {
        let mut state = self.write();
        if state.live_session(self.idle_timeout()).is_some() {
            state.last_activity = Some(Instant::now());
        }
    }

    /// Returns [`Config::inactivity_timeout`].
    const fn idle_timeout(&self) -> Duration {
        self.config.inactivity_timeout
    }

    /// Locks the [`State`] for reading.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the [`State`] for writing.
    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a mutation as started, unless another one is in progress.
    fn begin(&self) -> Option<Authenticating<'_>> {
        let mut state = self.write();
        if state.is_authenticating {
            return None;
        }
        state.is_authenticating = true;
        if state.live_session(self.idle_timeout()).is_some() {
            state.last_activity = Some(Instant::now());
        }
        Some(Authenticating(&self.state))
    }

    /// Replaces the current [`Session`].
    ///
    /// Returns the [`user::Id`] whose [`Subscription`] should be loaded, if
    /// it isn't loaded already.
    fn set_session(&self, session: Session) -> Option<user::Id> {
        let user_id = session.user.id;
        let mut state = self.write();
        // Refreshing a live `Session` of the same `User` is no activity.
        if !state
            .live_session(self.idle_timeout())
            .is_some_and(|s| s.user.id == user_id)
        {
            state.last_activity = Some(Instant::now());
        }
        state.session = Some(session);
        if state
            .subscription
            .as_ref()
            .is_some_and(|s| s.user_id == user_id)
        {
            return None;
        }
        state.subscription = None;
        Some(user_id)
    }

    /// Replaces the [`User`] of the current [`Session`], if it's the same
    /// one.
    fn set_user(&self, user: User) {
        let mut state = self.write();
        if let Some(session) =
            state.session.as_mut().filter(|s| s.user.id == user.id)
        {
            session.user = user;
        }
    }

    /// Replaces the current [`Subscription`], if it belongs to the signed-in
    /// [`User`].
    fn set_subscription(&self, subscription: Subscription) {
        let mut state = self.write();
        if state
            .session
            .as_ref()
            .is_some_and(|s| s.user.id == subscription.user_id)
        {
            state.subscription = Some(subscription);
        }
    }

    /// Clears the current [`Session`] and [`Subscription`] together,
    /// returning the former.
    fn clear(&self) -> Option<Session> {
        let mut state = self.write();
        state.subscription = None;
        state.last_activity = None;
        state.session.take()
    }

    /// Shows a success [`message::Kind`] notification.
    fn succeeded(&self, text: impl Into<String>) {
        _ = self.notifications.show(text, message::Kind::Success);
    }

    /// Shows an error notification describing the failed `result`, if it has
    /// failed.
    fn report<T, E>(&self, result: Result<T, Traced<E>>) -> Result<T, Traced<E>>
    where
        E: Categorize + fmt::Display,
    {
        if let Err(e) = &result {
            let e = e.as_ref();
            let category = e.category();
            log::warn!(%category, "account operation failed: {e}");
            let text = match category {
                Category::Network => NETWORK_ERROR.to_owned(),
                Category::Validation
                | Category::Unauthorized
                | Category::Provider
                | Category::Conflict => e.to_string(),
            };
            _ = self.notifications.show(text, message::Kind::Error);
        }
        result
    }
}

impl<A, B, S> Account<A, B, S>
where
    S: SubscriptionStorage,
{
    /// Loads the [`Subscription`] of the provided [`User`], creating the
    /// default one if there is none.
    async fn load_subscription(
        &self,
        user_id: user::Id,
    ) -> Result<Subscription, Traced<storage::Error>> {
        let stored = self
            .storage
            .execute(Select(By::<Option<Subscription>, _>::new(user_id)))
            .await
            .map_err(tracerr::wrap!())?;
        let subscription = if let Some(s) = stored {
            s
        } else {
            let s = Subscription::basic(user_id);
            log::debug!(%user_id, "creating default subscription");
            self.storage
                .execute(Insert(s.clone()))
                .await
                .map_err(tracerr::wrap!())?;
            s
        };
        self.set_subscription(subscription.clone());
        Ok(subscription)
    }

    /// Clears the current [`Session`] and deletes the stored [`Subscription`]
    /// of its [`User`], returning the former.
    async fn end_session(
        &self,
    ) -> Result<Option<Session>, Traced<storage::Error>> {
        let Some(session) = self.clear() else {
            return Ok(None);
        };
        self.storage
            .execute(Delete(By::<Subscription, _>::new(session.user.id)))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Some(session))
    }

    /// Makes the provided [`Session`] current, loading the [`Subscription`]
    /// of its [`User`] if needed.
    async fn start_session(
        &self,
        session: Session,
    ) -> Result<(), Traced<storage::Error>> {
        if let Some(user_id) = self.set_session(session) {
            _ = self.load_subscription(user_id).await?;
        }
        Ok(())
    }
}

impl<A, B, S> Account<A, B, S>
where
    A: Auth<auth::Subscribe, Ok = Events, Err = Traced<auth::Error>>,
    Self: Command<
        command::ApplyAuthEvent,
        Ok = (),
        Err = Traced<command::apply_auth_event::ExecutionError>,
    >,
{
    /// Applies [`AuthEvent`]s pushed by the provider until it stops.
    ///
    /// Must be driven by the caller alongside the other operations.
    ///
    /// # Errors
    ///
    /// If subscribing to the provider fails.
    pub async fn listen(&self) -> Result<(), Traced<auth::Error>> {
        let taken = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let mut events = match taken {
            Some(rx) => rx,
            None => self
                .auth
                .execute(auth::Subscribe)
                .await
                .map_err(tracerr::wrap!())?,
        };

        loop {
            match events.recv().await {
                Ok(ev) => {
                    // Failures are reported by the command itself.
                    _ = self.execute(command::ApplyAuthEvent(ev)).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(skipped, "`AuthEvent`s were missed");
                }
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }
}

/// Mutation in progress, finished once dropped.
struct Authenticating<'s>(&'s RwLock<State>);

impl Drop for Authenticating<'_> {
    fn drop(&mut self) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticating = false;
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use secrecy::SecretString;
    use url::Url;

    use crate::{
        infra::{
            auth::{mock, Mock},
            billing::{self, Simulated},
            storage::Memory,
        },
        notification,
    };

    use super::{Account, Config};

    /// [`Account`] over in-memory collaborators used in tests.
    pub(crate) type TestAccount = Account<Mock, Simulated, Memory>;

    /// Creates a new [`TestAccount`] with instant billing.
    pub(crate) fn account(require_confirmation: bool) -> TestAccount {
        account_with(
            mock::Config {
                require_confirmation,
                ..auth_config()
            },
            billing::Config {
                charge_delay: Duration::ZERO,
                cancel_delay: Duration::ZERO,
                decline_charges: false,
            },
        )
    }

    /// Default [`Mock`] configuration of a [`TestAccount`].
    pub(crate) fn auth_config() -> mock::Config {
        mock::Config {
            require_confirmation: false,
            session_ttl: Duration::from_secs(3600),
            jwt_secret: SecretString::from("test-secret".to_owned()),
            authorize_url: "https://notecraft.test/auth/v1/authorize"
                .parse()
                .unwrap(),
        }
    }

    /// Creates a new [`TestAccount`] over the provided collaborators'
    /// configurations.
    pub(crate) fn account_with(
        auth: mock::Config,
        billing: billing::Config,
    ) -> TestAccount {
        let site_url = Url::parse("https://notecraft.test").unwrap();
        Account::new(
            Config {
                notifications: notification::Config::default(),
                ..Config::new(site_url)
            },
            Mock::new(auth),
            Simulated::new(billing),
            Memory::default(),
        )
    }

    #[test]
    fn builds_redirects() {
        let config =
            Config::new(Url::parse("https://notecraft.test/app/").unwrap());

        assert_eq!(
            config.redirect_to(super::CALLBACK_PATH).as_str(),
            "https://notecraft.test/auth/callback",
        );
        assert_eq!(config.password_min_length, 6);
        assert_eq!(
            config.inactivity_timeout,
            Duration::from_secs(24 * 60 * 60),
        );
    }

    #[test]
    fn signed_out_account_is_basic() {
        let account = account(false);

        assert_eq!(account.tier(), crate::domain::Tier::Basic);
        assert_eq!(account.days_remaining(), 0);
        assert!(!account.is_subscription_active());
        assert!(!account.is_over_limit(500));
        assert!(account.is_over_limit(501));
        assert!(account.user().is_none());
    }
}
