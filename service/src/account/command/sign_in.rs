//! [`Command`] for signing in with an email and a password.

use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox, SecretString};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    account::{Account, SubscriptionStorage},
    domain::{user, Session},
    error::{Categorize, Category},
    infra::{auth, storage, Auth},
};

use super::Command;

/// [`Command`] for signing in with an email and a password.
#[derive(Clone, Debug)]
pub struct SignIn {
    /// Email address of the [`User`].
    pub email: String,

    /// Password of the [`User`].
    pub password: SecretString,
}

impl<A, B, S> Command<SignIn> for Account<A, B, S>
where
    A: Auth<auth::SignIn, Ok = Session, Err = Traced<auth::Error>>,
    S: SubscriptionStorage,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SignIn) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let SignIn { email, password } = cmd;
            let email = email.trim();
            let password = password.expose_secret();

            if email.is_empty() || password.is_empty() {
                return Err(tracerr::new!(E::MissingCredentials));
            }
            let email = user::Email::new(email)
                .ok_or(E::InvalidEmail)
                .map_err(tracerr::wrap!())?;
            // Length policy applies to new passwords only.
            let password = user::Password::new(password)
                .ok_or(E::InvalidCredentials)
                .map_err(tracerr::wrap!())?;

            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            let session = self
                .auth()
                .execute(auth::SignIn {
                    email,
                    password: SecretBox::new(Box::new(password)),
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            self.start_session(session.clone())
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            self.succeeded("Signed in successfully!");
            Ok(session)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`SignIn`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Email or password is missing.
    #[display("Email and password are required")]
    MissingCredentials,

    /// Email is malformed.
    #[display("Please enter a valid email address")]
    InvalidEmail,

    /// Password cannot belong to any [`User`].
    #[display("Invalid login credentials")]
    InvalidCredentials,

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
            Self::MissingCredentials
            | Self::InvalidEmail
            | Self::InvalidCredentials => Category::Validation,
            Self::InProgress => Category::Conflict,
            Self::Auth(e) => e.category(),
            Self::Storage(e) => e.category(),
        }
    }
}
