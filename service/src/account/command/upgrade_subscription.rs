//! [`Command`] for upgrading the [`Subscription`] of the signed-in [`User`].

use common::operations::{Insert, Perform};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    account::{Account, SubscriptionStorage},
    domain::{subscription::PaymentReference, Subscription, Tier},
    error::{Categorize, Category},
    infra::{
        billing::{self, Charge},
        storage, Billing,
    },
};

use super::Command;

/// [`Command`] for upgrading the [`Subscription`] of the signed-in [`User`]
/// to the provided [`Tier`].
///
/// Replaces the current [`Subscription`] with a new active one, starting a
/// fresh [`Subscription::PERIOD`].
///
/// Nothing is stored if the [`User`] signs out while the payment is being
/// processed.
#[derive(Clone, Copy, Debug)]
pub struct UpgradeSubscription(pub Tier);

impl<A, B, S> Command<UpgradeSubscription> for Account<A, B, S>
where
    B: Billing<
        Perform<Charge>,
        Ok = PaymentReference,
        Err = Traced<billing::Error>,
    >,
    S: SubscriptionStorage,
{
    type Ok = Subscription;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        UpgradeSubscription(plan): UpgradeSubscription,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let user = self
                .user()
                .ok_or(E::Unauthorized)
                .map_err(tracerr::wrap!())?;
            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            let reference = self
                .billing()
                .execute(Perform(Charge {
                    user_id: user.id,
                    plan,
                }))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            if !self.user().is_some_and(|u| u.id == user.id) {
                log::warn!(
                    user_id = %user.id,
                    %reference,
                    "signed out before the upgrade was saved",
                );
                return Err(tracerr::new!(E::Interrupted));
            }
            let subscription =
                Subscription::new(user.id, plan, Some(reference));
            self.storage()
                .execute(Insert(subscription.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            self.set_subscription(subscription.clone());
            log::info!(user_id = %user.id, %plan, "subscription upgraded");

            self.succeeded(format!("Successfully upgraded to {plan}!"));
            Ok(subscription)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`UpgradeSubscription`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// No [`User`] is signed in.
    #[display("Please log in to upgrade your subscription")]
    Unauthorized,

    /// Another operation is in progress.
    #[display("Another operation is in progress")]
    InProgress,

    /// [`User`] signed out while the payment was being processed.
    #[display("Signed out before the upgrade was completed")]
    Interrupted,

    /// [`Billing`] error.
    #[display("Failed to process payment: {_0}")]
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
            Self::Unauthorized => Category::Unauthorized,
            Self::InProgress | Self::Interrupted => Category::Conflict,
            Self::Billing(e) => e.category(),
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
            command::{ApplyAuthEvent, CancelSubscription, SignUp},
            spec::{account, account_with, auth_config, TestAccount},
        },
        domain::{message, Subscription, Tier},
        error::{Categorize as _, Category},
        infra::{auth::AuthEvent, billing},
    };

    use super::UpgradeSubscription;

    async fn sign_up(account: &TestAccount) {
        _ = account
            .execute(SignUp {
                email: "writer@example.com".into(),
                password: SecretString::from("secret1".to_owned()),
                name: "Ada".into(),
                metadata: Default::default(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn requires_user() {
        let account = account(false);

        let err = account
            .execute(UpgradeSubscription(Tier::Pro))
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Unauthorized);
        assert_eq!(
            account.notifications().current().unwrap().text,
            "Please log in to upgrade your subscription",
        );
    }

    #[tokio::test]
    async fn upgrades_then_cancels() {
        let account = account(false);
        sign_up(&account).await;
        assert_eq!(account.tier(), Tier::Basic);

        let sub = account
            .execute(UpgradeSubscription(Tier::Pro))
            .await
            .unwrap();

        assert_eq!(account.tier(), Tier::Pro);
        assert!(account.can_access(Tier::Pro));
        assert!(!account.can_access(Tier::Ultra));
        assert!(sub.payment_reference.is_some());
        assert_eq!(account.days_remaining(), 30);
        assert_eq!(
            account.notifications().current().unwrap().kind,
            message::Kind::Success,
        );

        _ = account.execute(CancelSubscription).await.unwrap();

        assert_eq!(account.tier(), Tier::Basic);
        assert_eq!(account.days_remaining(), 0);
        assert!(!account.is_subscription_active());
    }

    #[tokio::test]
    async fn reports_declined_payment() {
        let account = account_with(
            auth_config(),
            billing::Config {
                charge_delay: Duration::ZERO,
                cancel_delay: Duration::ZERO,
                decline_charges: true,
            },
        );
        sign_up(&account).await;

        let err = account
            .execute(UpgradeSubscription(Tier::Ultra))
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Provider);
        assert_eq!(account.tier(), Tier::Basic);
        assert_eq!(
            account.notifications().current().unwrap().text,
            "Failed to process payment: payment declined: card was declined",
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_during_payment_discards_upgrade() {
        let account = account_with(auth_config(), billing::Config::default());
        sign_up(&account).await;
        let user_id = account.user().unwrap().id;

        let (upgraded, ()) = tokio::join!(
            account.execute(UpgradeSubscription(Tier::Pro)),
            async {
                time::sleep(Duration::from_secs(1)).await;
                account
                    .execute(ApplyAuthEvent(AuthEvent::SignedOut))
                    .await
                    .unwrap();
            },
        );

        let err = upgraded.unwrap_err();
        assert_eq!(err.category(), Category::Conflict);
        assert_eq!(
            err.as_ref().to_string(),
            "Signed out before the upgrade was completed",
        );
        let stored = account
            .storage()
            .execute(Select(By::<Option<Subscription>, _>::new(user_id)))
            .await
            .unwrap();
        assert!(stored.is_none());
    }
}
