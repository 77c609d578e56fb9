//! [`Command`] for loading the [`Subscription`] of a [`User`].

use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    account::{Account, SubscriptionStorage},
    domain::{user, Subscription},
    error::{Categorize, Category},
    infra::storage,
};

use super::Command;

/// [`Command`] for loading the [`Subscription`] of a [`User`].
///
/// Creates the default [`Tier::Basic`] one if the [`User`] has none yet, and
/// never overwrites an existing one.
///
/// [`Tier::Basic`]: crate::domain::Tier::Basic
#[derive(Clone, Copy, Debug)]
pub struct LoadSubscription(pub user::Id);

impl<A, B, S> Command<LoadSubscription> for Account<A, B, S>
where
    S: SubscriptionStorage,
{
    type Ok = Subscription;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        LoadSubscription(user_id): LoadSubscription,
    ) -> Result<Self::Ok, Self::Err> {
        let res = self
            .load_subscription(user_id)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError));
        self.report(res)
    }
}

/// Error of [`LoadSubscription`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("Failed to load subscription: {_0}")]
    Storage(storage::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Storage(e) => e.category(),
        }
    }
}
