//! [`Command`] for cancelling the current [`Subscription`].

use common::operations::{By, Delete, Insert};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    account::{Account, SubscriptionStorage},
    domain::{user, Subscription},
    error::{Categorize, Category},
    infra::{billing, storage, Billing},
};

use super::Command;

/// [`Command`] for cancelling the current [`Subscription`].
///
/// The cancelled [`Subscription`] is kept, granting nothing until replaced.
#[derive(Clone, Copy, Debug, Default)]
pub struct CancelSubscription;

impl<A, B, S> Command<CancelSubscription> for Account<A, B, S>
where
    B: Billing<
        Delete<By<Subscription, user::Id>>,
        Ok = (),
        Err = Traced<billing::Error>,
    >,
    S: SubscriptionStorage,
{
    type Ok = Subscription;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: CancelSubscription,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let mut subscription = self
                .subscription()
                .filter(Subscription::is_active)
                .ok_or(E::NoActiveSubscription)
                .map_err(tracerr::wrap!())?;
            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            let user_id = subscription.user_id;
            self.billing()
                .execute(Delete(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            subscription.cancel();
            self.storage()
                .execute(Insert(subscription.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            self.set_subscription(subscription.clone());
            log::info!(%user_id, "subscription cancelled");

            self.succeeded("Subscription cancelled successfully");
            Ok(subscription)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`CancelSubscription`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// There is no active [`Subscription`].
    #[display("No active subscription to cancel")]
    NoActiveSubscription,

    /// Another operation is in progress.
    #[display("Another operation is in progress")]
    InProgress,

    /// [`Billing`] error.
    #[display("Failed to cancel subscription: {_0}")]
    #[from]
    Billing(billing::Error),

    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("Failed to save subscription: {_0}")]
    #[from]
    Storage(storage::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::NoActiveSubscription | Self::InProgress => Category::Conflict,
            Self::Billing(e) => e.category(),
            Self::Storage(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Handler as _,
    };
    use secrecy::SecretString;

    use crate::{
        account::{command::SignUp, spec::account},
        domain::{subscription, Subscription},
        error::{Categorize as _, Category},
    };

    use super::CancelSubscription;

    #[tokio::test]
    async fn requires_active_subscription() {
        let account = account(false);

        let err = account.execute(CancelSubscription).await.unwrap_err();

        assert_eq!(err.category(), Category::Conflict);
        assert_eq!(
            err.as_ref().to_string(),
            "No active subscription to cancel",
        );
    }

    #[tokio::test]
    async fn keeps_cancelled_record() {
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

        let cancelled = account.execute(CancelSubscription).await.unwrap();

        assert_eq!(cancelled.status, subscription::Status::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        let stored = account
            .storage()
            .execute(Select(By::<Option<Subscription>, _>::new(user_id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(cancelled));

        let err = account.execute(CancelSubscription).await.unwrap_err();
        assert_eq!(err.category(), Category::Conflict);
    }
}
