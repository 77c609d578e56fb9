//! [`Command`] for restoring the [`Session`] kept by the provider.

use std::sync::PoisonError;

use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    account::{Account, SubscriptionStorage},
    domain::Session,
    error::{Categorize, Category},
    infra::{
        auth::{self, Events},
        storage, Auth,
    },
};

use super::Command;

/// [`Command`] for restoring the [`Session`] kept by the provider, if any,
/// along with the [`Subscription`] of its [`User`].
///
/// Subscribes to [`AuthEvent`]s first, so the ones emitted meanwhile are
/// applied once [`Account::listen()`] is driven.
///
/// [`AuthEvent`]: auth::AuthEvent
/// [`Subscription`]: crate::domain::Subscription
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug, Default)]
pub struct Initialize;

impl<A, B, S> Command<Initialize> for Account<A, B, S>
where
    A: Auth<auth::Subscribe, Ok = Events, Err = Traced<auth::Error>>
        + Auth<
            auth::GetSession,
            Ok = Option<Session>,
            Err = Traced<auth::Error>,
        >,
    S: SubscriptionStorage,
{
    type Ok = Option<Session>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: Initialize) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let events = self
                .auth()
                .execute(auth::Subscribe)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            _ = self
                .events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(events);

            let session = self
                .auth()
                .execute(auth::GetSession)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(s) = &session {
                log::debug!(user_id = %s.user.id, "session restored");
                self.start_session(s.clone())
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
            }
            Ok(session)
        }
        .await;

        self.write().is_initialized = true;
        self.report(res)
    }
}

/// Error of [`Initialize`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Auth`] error.
    #[display("Failed to restore session: {_0}")]
    Auth(auth::Error),

    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("Failed to load subscription: {_0}")]
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
    use common::Handler as _;
    use secrecy::SecretString;

    use crate::{
        account::{command::SignUp, spec::account},
        domain::Tier,
    };

    use super::Initialize;

    #[tokio::test]
    async fn signed_out_provider_yields_nothing() {
        let account = account(false);
        assert!(!account.is_initialized());

        let session = account.execute(Initialize).await.unwrap();

        assert!(session.is_none());
        assert!(account.is_initialized());
        assert_eq!(account.tier(), Tier::Basic);
    }

    #[tokio::test]
    async fn restores_provider_session() {
        let account = account(false);
        _ = account
            .execute(SignUp {
                email: "writer@example.com".into(),
                password: SecretString::from("secret1".to_owned()),
                name: "Ada".into(),
                metadata: Default::default(),
            })
            .await
            .unwrap();
        let user_id = account.user().unwrap().id;
        // Fresh client over the same provider.
        _ = account.clear();
        assert!(account.user().is_none());

        let restored = account.execute(Initialize).await.unwrap().unwrap();

        assert_eq!(restored.user.id, user_id);
        assert_eq!(account.subscription().unwrap().user_id, user_id);
        assert!(account.is_subscription_active());
    }
}
