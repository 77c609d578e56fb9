//! [`Command`] for refreshing or ending a stale [`Session`].

use derive_more::{Display, Error, From};
use futures::future;
use tracerr::Traced;
use tracing as log;

use crate::{
    account::{Account, SubscriptionStorage},
    domain::{message, Session},
    error::{Categorize, Category},
    infra::{auth, storage, Auth},
};

use super::Command;

/// Text shown once a stale [`Session`] is ended.
pub const EXPIRED: &str = "Session expired. Please log in again.";

/// [`Command`] for refreshing the current [`Session`] once it has expired,
/// or ending it if it cannot be refreshed or has been idle for longer than
/// [`Config::inactivity_timeout`].
///
/// An ended [`Session`] is signed out of the provider, and the stored
/// [`Subscription`] of its [`User`] is deleted, the same way [`SignOut`]
/// does. Returns the live [`Session`], if any.
///
/// [`Config::inactivity_timeout`]: crate::account::Config::inactivity_timeout
/// [`SignOut`]: super::SignOut
/// [`Subscription`]: crate::domain::Subscription
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshSession;

impl<A, B, S> Command<RefreshSession> for Account<A, B, S>
where
    A: Auth<
            auth::GetSession,
            Ok = Option<Session>,
            Err = Traced<auth::Error>,
        > + Auth<auth::SignOut, Ok = (), Err = Traced<auth::Error>>,
    S: SubscriptionStorage,
{
    type Ok = Option<Session>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: RefreshSession) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let (held, is_idle) = {
                let state = self.read();
                let is_idle = state.is_idle(self.idle_timeout());
                (state.session.clone(), is_idle)
            };
            let Some(held) = held else {
                return Ok(None);
            };
            if !is_idle && !held.is_expired() {
                return Ok(Some(held));
            }

            if !is_idle {
                let fresh = self
                    .auth()
                    .execute(auth::GetSession)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .filter(|s| !s.is_expired() && s.user.id == held.user.id);
                if let Some(s) = fresh {
                    log::debug!(user_id = %s.user.id, "session refreshed");
                    self.start_session(s.clone())
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    return Ok(Some(s));
                }
            }

            log::info!(user_id = %held.user.id, is_idle, "session expired");
            let (remote, ended) = future::join(
                self.auth().execute(auth::SignOut),
                self.end_session(),
            )
            .await;
            _ = ended.map_err(tracerr::map_from_and_wrap!(=> E))?;
            remote.map_err(tracerr::map_from_and_wrap!(=> E))?;

            _ = self.notifications().show(EXPIRED, message::Kind::Error);
            Ok(None)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`RefreshSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Auth`] error.
    #[display("Failed to refresh session: {_0}")]
    Auth(auth::Error),

    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("Failed to update subscription: {_0}")]
    Storage(storage::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Auth(e) => e.category(),
            Self::Storage(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Select},
        Handler as _,
    };
    use secrecy::SecretString;
    use tokio::time;

    use crate::{
        account::{
            command::{SignUp, UpgradeSubscription},
            spec::{account, account_with, auth_config, TestAccount},
        },
        domain::{message, Subscription, Tier},
        infra::{
            auth::{self, mock},
            billing,
        },
    };

    use super::{RefreshSession, EXPIRED};

    fn instant_billing() -> billing::Config {
        billing::Config {
            charge_delay: Duration::ZERO,
            cancel_delay: Duration::ZERO,
            decline_charges: false,
        }
    }

    async fn sign_up_pro(account: &TestAccount) {
        _ = account
            .execute(SignUp {
                email: "writer@example.com".into(),
                password: SecretString::from("secret1".to_owned()),
                name: "Ada".into(),
                metadata: Default::default(),
            })
            .await
            .unwrap();
        _ = account
            .execute(UpgradeSubscription(Tier::Pro))
            .await
            .unwrap();
        assert_eq!(account.tier(), Tier::Pro);
    }

    #[tokio::test]
    async fn keeps_live_session() {
        let account = account(false);
        sign_up_pro(&account).await;

        let session = account.execute(RefreshSession).await.unwrap();

        assert_eq!(session, account.session());
        assert!(session.is_some());
    }

    #[tokio::test]
    async fn expired_session_grants_nothing_until_refreshed() {
        let account = account_with(
            mock::Config {
                session_ttl: Duration::from_secs(1),
                ..auth_config()
            },
            instant_billing(),
        );
        sign_up_pro(&account).await;

        time::sleep(Duration::from_millis(2100)).await;

        assert!(account.session().is_none());
        assert!(account.user().is_none());
        assert_eq!(account.tier(), Tier::Basic);
        assert_eq!(account.days_remaining(), 0);

        let refreshed = account.execute(RefreshSession).await.unwrap();

        assert!(refreshed.is_some_and(|s| !s.is_expired()));
        assert_eq!(account.tier(), Tier::Pro);
    }

    #[tokio::test(start_paused = true)]
    async fn ends_idle_session() {
        let account = account(false);
        sign_up_pro(&account).await;
        let user_id = account.user().unwrap().id;

        time::advance(Duration::from_secs(12 * 60 * 60)).await;
        account.touch();
        time::advance(Duration::from_secs(23 * 60 * 60)).await;
        assert_eq!(account.tier(), Tier::Pro);

        time::advance(Duration::from_secs(2 * 60 * 60)).await;
        assert!(account.user().is_none());
        assert_eq!(account.tier(), Tier::Basic);

        account.touch();
        assert!(account.user().is_none());

        assert_eq!(account.execute(RefreshSession).await.unwrap(), None);

        let shown = account.notifications().current().unwrap();
        assert_eq!(shown.text, EXPIRED);
        assert_eq!(shown.kind, message::Kind::Error);
        assert_eq!(
            account.auth().execute(auth::GetSession).await.unwrap(),
            None,
        );
        let stored = account
            .storage()
            .execute(Select(By::<Option<Subscription>, _>::new(user_id)))
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn does_nothing_when_signed_out() {
        let account = account(false);

        assert_eq!(account.execute(RefreshSession).await.unwrap(), None);
        assert!(account.notifications().current().is_none());
    }
}
