//! [`Command`] for ending the current [`Session`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use futures::future;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Session;
use crate::{
    account::{Account, SubscriptionStorage},
    domain::Subscription,
    error::{Categorize, Category},
    infra::{auth, storage, Auth},
};

use super::Command;

/// [`Command`] for ending the current [`Session`].
///
/// Local state is cleared first, so the [`Session`] is gone even if the
/// provider cannot be reached. Does nothing when signed out already.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignOut;

impl<A, B, S> Command<SignOut> for Account<A, B, S>
where
    A: Auth<auth::SignOut, Ok = (), Err = Traced<auth::Error>>,
    S: SubscriptionStorage,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: SignOut) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            if self.session().is_none() {
                return Ok(());
            }
            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            let Some(session) = self.clear() else {
                return Ok(());
            };
            let user_id = session.user.id;
            log::debug!(%user_id, "signing out");

            let (remote, stored) = future::join(
                self.auth().execute(auth::SignOut),
                self.storage()
                    .execute(Delete(By::<Subscription, _>::new(user_id))),
            )
            .await;
            remote.map_err(tracerr::map_from_and_wrap!(=> E))?;
            stored.map_err(tracerr::map_from_and_wrap!(=> E))?;

            self.succeeded("Signed out successfully");
            Ok(())
        }
        .await;

        self.report(res)
    }
}

/// Error of [`SignOut`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Another operation is in progress.
    #[display("Another operation is in progress")]
    InProgress,

    /// [`Auth`] error.
    #[display("Failed to logout: {_0}")]
    #[from]
    Auth(auth::Error),

    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("Failed to forget subscription: {_0}")]
    #[from]
    Storage(storage::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::InProgress => Category::Conflict,
            Self::Auth(e) => e.category(),
            Self::Storage(e) => e.category(),
        }
    }
}
