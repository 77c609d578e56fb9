//! [`Command`] for requesting a password reset link.

use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    account::{Account, RESET_PASSWORD_PATH},
    domain::user,
    error::{Categorize, Category},
    infra::{auth, Auth},
};

use super::Command;

/// [`Command`] for requesting a password reset link.
#[derive(Clone, Debug)]
pub struct ResetPassword {
    /// Email address to send the link to.
    pub email: String,
}

impl<A, B, S> Command<ResetPassword> for Account<A, B, S>
where
    A: Auth<auth::ResetPassword, Ok = (), Err = Traced<auth::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ResetPassword) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let email = user::Email::new(cmd.email.trim())
                .ok_or(E::InvalidEmail)
                .map_err(tracerr::wrap!())?;

            self.auth()
                .execute(auth::ResetPassword {
                    email,
                    redirect_to: self.config().redirect_to(RESET_PASSWORD_PATH),
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            self.succeeded("Password reset email sent");
            Ok(())
        }
        .await;

        self.report(res)
    }
}

/// Error of [`ResetPassword`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Email is malformed.
    #[display("Please enter a valid email address")]
    InvalidEmail,

    /// [`Auth`] error.
    #[display("{_0}")]
    #[from]
    Auth(auth::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::InvalidEmail => Category::Validation,
            Self::Auth(e) => e.category(),
        }
    }
}
