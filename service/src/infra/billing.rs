//! [`Billing`]-related implementations.

use std::time::Duration;

use common::operations::{By, Delete, Perform};
use derive_more::{Display, Error as StdError};
use smart_default::SmartDefault;
use tokio::time;
use tracerr::Traced;
use tracing as log;
use uuid::Uuid;

use crate::domain::{subscription::PaymentReference, user, Subscription, Tier};

/// Payment gateway operation.
pub use common::Handler as Billing;

/// Request to charge a [`user::Id`] for a [`Tier`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Charge {
    /// ID of the charged [`User`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// [`Tier`] being paid for.
    pub plan: Tier,
}

/// [`Billing`] error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// Payment gateway declined the operation.
    #[display("payment declined: {_0}")]
    Declined(#[error(not(source))] String),
}

/// [`Simulated`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Time a charge takes to be processed.
    #[default(Duration::from_secs(2))]
    pub charge_delay: Duration,

    /// Time a cancellation takes to be processed.
    #[default(Duration::from_secs(1))]
    pub cancel_delay: Duration,

    /// Indicator whether every charge is declined, after the
    /// [`Config::charge_delay`].
    pub decline_charges: bool,
}

/// [`Billing`] pretending to process payments, without charging anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Simulated {
    /// [`Config`] of this [`Simulated`] gateway.
    config: Config,
}

impl Simulated {
    /// Creates a new [`Simulated`] gateway with the provided [`Config`].
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Billing<Perform<Charge>> for Simulated {
    type Ok = PaymentReference;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(charge): Perform<Charge>,
    ) -> Result<Self::Ok, Self::Err> {
        time::sleep(self.config.charge_delay).await;

        if self.config.decline_charges {
            log::info!(
                user_id = %charge.user_id,
                plan = %charge.plan,
                "simulated charge declined",
            );
            return Err(tracerr::new!(Error::Declined(
                "card was declined".into(),
            )));
        }

        let reference = PaymentReference::from(format!(
            "sim_{}",
            Uuid::new_v4().simple(),
        ));
        log::info!(
            user_id = %charge.user_id,
            plan = %charge.plan,
            price = %charge.plan.price(),
            %reference,
            "simulated charge",
        );
        Ok(reference)
    }
}

impl Billing<Delete<By<Subscription, user::Id>>> for Simulated {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Subscription, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        time::sleep(self.config.cancel_delay).await;

        log::info!(user_id = %by.into_inner(), "simulated cancellation");
        Ok(())
    }
}
