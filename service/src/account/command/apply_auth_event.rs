//! [`Command`] for applying an [`AuthEvent`] pushed by the provider.

use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    account::{Account, SubscriptionStorage},
    error::{Categorize, Category},
    infra::{auth::AuthEvent, storage},
};

use super::Command;

/// [`Command`] for applying an [`AuthEvent`] pushed by the provider, and
/// notifying listeners registered via [`Account::on_auth_change()`] about it.
///
/// Applying the same [`AuthEvent`] twice has no further effect, so events
/// racing with the [`Command`] that caused them are harmless.
///
/// [`AuthEvent::SignedOut`] ends the [`Session`] the same way
/// [`SignOut`] does, deleting the stored [`Subscription`].
///
/// [`Session`]: crate::domain::Session
/// [`SignOut`]: super::SignOut
/// [`Subscription`]: crate::domain::Subscription
#[derive(Clone, Debug)]
pub struct ApplyAuthEvent(pub AuthEvent);

impl<A, B, S> Command<ApplyAuthEvent> for Account<A, B, S>
where
    S: SubscriptionStorage,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ApplyAuthEvent(event): ApplyAuthEvent,
    ) -> Result<Self::Ok, Self::Err> {
        let res = if let Some(session) = event.session() {
            log::debug!(user_id = %session.user.id, "applying `AuthEvent`");
            self.start_session(session.clone())
                .await
                .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
        } else {
            self.end_session()
                .await
                .map(|ended| {
                    if let Some(s) = ended {
                        log::debug!(
                            user_id = %s.user.id,
                            "signed out by provider",
                        );
                    }
                })
                .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
        };

        self.listeners.notify(&event);
        self.report(res)
    }
}

/// Error of [`ApplyAuthEvent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("Failed to update subscription: {_0}")]
    Storage(storage::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Storage(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::sync::{Arc, Mutex};

    use common::{
        operations::{By, Select},
        Handler as _,
    };
    use secrecy::SecretBox;
    use tokio::task;

    use crate::{
        account::{command::Initialize, spec::account},
        domain::{user, Subscription, Tier},
        infra::auth::{self, AuthEvent},
    };

    use super::ApplyAuthEvent;

    #[tokio::test]
    async fn applies_provider_transitions() {
        let account = account(false);
        _ = account.execute(Initialize).await.unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _listener = account.on_auth_change({
            let seen = Arc::clone(&seen);
            move |ev| seen.lock().unwrap().push(ev.clone())
        });

        tokio::select! {
            res = account.listen() => panic!("stopped listening: {res:?}"),
            () = async {
                // Bypasses the `Account`, as another tab would.
                _ = account
                    .auth()
                    .execute(auth::SignUp {
                        email: user::Email::new("writer@example.com")
                            .unwrap(),
                        password: SecretBox::new(Box::new(
                            user::Password::new("secret1").unwrap(),
                        )),
                        metadata: user::Metadata::default(),
                        redirect_to: None,
                    })
                    .await
                    .unwrap();
                while !account.is_subscription_active() {
                    task::yield_now().await;
                }

                account.auth().execute(auth::SignOut).await.unwrap();
                while account.user().is_some() {
                    task::yield_now().await;
                }
            } => {}
        }

        assert_eq!(account.tier(), Tier::Basic);
        assert!(account.subscription().is_none());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], AuthEvent::SignedIn(_)));
        assert_eq!(seen[1], AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn applying_twice_is_idempotent() {
        let account = account(false);
        let session = account
            .auth()
            .execute(auth::SignUp {
                email: user::Email::new("writer@example.com").unwrap(),
                password: SecretBox::new(Box::new(
                    user::Password::new("secret1").unwrap(),
                )),
                metadata: user::Metadata::default(),
                redirect_to: None,
            })
            .await
            .unwrap();
        let auth::SignedUp::SignedIn(session) = session else {
            panic!("confirmation is not required");
        };

        let event = AuthEvent::SignedIn(session);
        account.execute(ApplyAuthEvent(event.clone())).await.unwrap();
        let first = account.subscription().unwrap();
        account.execute(ApplyAuthEvent(event)).await.unwrap();

        assert_eq!(account.subscription(), Some(first));
    }

    #[tokio::test]
    async fn provider_sign_out_deletes_stored_subscription() {
        let account = account(false);
        let signed_up = account
            .auth()
            .execute(auth::SignUp {
                email: user::Email::new("writer@example.com").unwrap(),
                password: SecretBox::new(Box::new(
                    user::Password::new("secret1").unwrap(),
                )),
                metadata: user::Metadata::default(),
                redirect_to: None,
            })
            .await
            .unwrap();
        let auth::SignedUp::SignedIn(session) = signed_up else {
            panic!("confirmation is not required");
        };
        let user_id = session.user.id;
        account
            .execute(ApplyAuthEvent(AuthEvent::SignedIn(session)))
            .await
            .unwrap();
        let stored = account
            .storage()
            .execute(Select(By::<Option<Subscription>, _>::new(user_id)))
            .await
            .unwrap();
        assert!(stored.is_some());

        account
            .execute(ApplyAuthEvent(AuthEvent::SignedOut))
            .await
            .unwrap();

        assert!(account.user().is_none());
        let stored = account
            .storage()
            .execute(Select(By::<Option<Subscription>, _>::new(user_id)))
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn unsubscribed_listener_is_not_called() {
        let account = account(false);
        let calls = Arc::new(Mutex::new(0));
        let listener = account.on_auth_change({
            let calls = Arc::clone(&calls);
            move |_| *calls.lock().unwrap() += 1
        });

        account
            .execute(ApplyAuthEvent(AuthEvent::SignedOut))
            .await
            .unwrap();
        listener.unsubscribe();
        account
            .execute(ApplyAuthEvent(AuthEvent::SignedOut))
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
