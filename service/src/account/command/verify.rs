//! [`Command`] for following a link sent by email.

use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    account::{Account, SubscriptionStorage},
    domain::{message, Session},
    error::{Categorize, Category},
    infra::{
        auth::{self, VerificationKind},
        storage, Auth,
    },
};

use super::Command;

/// [`Command`] for following a link sent by email, confirming the email or
/// starting a password recovery.
#[derive(Clone, Debug)]
pub struct Verify {
    /// [`VerificationKind`] of the link.
    pub kind: VerificationKind,

    /// Token hash from the link.
    pub token_hash: String,
}

impl<A, B, S> Command<Verify> for Account<A, B, S>
where
    A: Auth<auth::Verify, Ok = Session, Err = Traced<auth::Error>>,
    S: SubscriptionStorage,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: Verify) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let Verify { kind, token_hash } = cmd;
            if token_hash.trim().is_empty() {
                return Err(tracerr::new!(E::MissingToken));
            }
            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            let session = self
                .auth()
                .execute(auth::Verify { kind, token_hash })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            self.start_session(session.clone())
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            match kind {
                VerificationKind::Signup => {
                    self.succeeded("Email confirmed! Welcome aboard.");
                }
                VerificationKind::Recovery => {
                    _ = self.notifications().show_sticky(
                        "Please choose a new password",
                        message::Kind::Info,
                    );
                }
            }
            Ok(session)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`Verify`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Token is missing.
    #[display("Verification link is incomplete")]
    MissingToken,

    /// Another operation is in progress.
    #[display("Another operation is in progress")]
    InProgress,

    /// [`Auth`] error.
    #[display("{_0}")]
    #[from]
    Auth(auth::Error),

    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("Failed to load subscription: {_0}")]
    #[from]
    Storage(storage::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::MissingToken => Category::Validation,
            Self::InProgress => Category::Conflict,
            Self::Auth(e) => e.category(),
            Self::Storage(e) => e.category(),
        }
    }
}
