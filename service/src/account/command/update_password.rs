//! [`Command`] for changing the password of the signed-in [`User`].

use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox, SecretString};
use tracerr::Traced;

use crate::{
    account::Account,
    domain::{user, User},
    error::{Categorize, Category},
    infra::{auth, Auth},
};

use super::Command;

/// [`Command`] for changing the password of the signed-in [`User`], as done
/// at the end of a password recovery.
#[derive(Clone, Debug)]
pub struct UpdatePassword(pub SecretString);

impl<A, B, S> Command<UpdatePassword> for Account<A, B, S>
where
    A: Auth<auth::UpdateUser, Ok = User, Err = Traced<auth::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        UpdatePassword(password): UpdatePassword,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            if self.session().is_none() {
                return Err(tracerr::new!(E::Unauthorized));
            }
            let password = password.expose_secret();
            let min = self.config().password_min_length;
            if password.chars().count() < min {
                return Err(tracerr::new!(E::PasswordTooShort(min)));
            }
            let password = user::Password::new(password)
                .ok_or(E::PasswordTooLong)
                .map_err(tracerr::wrap!())?;

            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            let user = self
                .auth()
                .execute(auth::UpdateUser {
                    metadata: user::Metadata::default(),
                    password: Some(SecretBox::new(Box::new(password))),
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            self.set_user(user);

            self.succeeded("Password updated successfully");
            Ok(())
        }
        .await;

        self.report(res)
    }
}

/// Error of [`UpdatePassword`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// No [`User`] is signed in.
    #[display("User not authenticated")]
    Unauthorized,

    /// Password is shorter than allowed.
    #[display("Password must be at least {_0} characters long")]
    PasswordTooShort(#[error(not(source))] usize),

    /// Password is longer than allowed.
    #[display("Password is too long")]
    PasswordTooLong,

    /// Another operation is in progress.
    #[display("Another operation is in progress")]
    InProgress,

    /// [`Auth`] error.
    #[display("{_0}")]
    #[from]
    Auth(auth::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Unauthorized => Category::Unauthorized,
            Self::PasswordTooShort(_) | Self::PasswordTooLong => {
                Category::Validation
            }
            Self::InProgress => Category::Conflict,
            Self::Auth(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use secrecy::SecretString;

    use crate::{
        account::{
            command::{SignIn, SignOut, SignUp},
            spec::account,
        },
        error::{Categorize as _, Category},
    };

    use super::UpdatePassword;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[tokio::test]
    async fn new_password_signs_in() {
        let account = account(false);
        _ = account
            .execute(SignUp {
                email: "writer@example.com".into(),
                password: secret("secret1"),
                name: "Ada".into(),
                metadata: Default::default(),
            })
            .await
            .unwrap();

        let err = account
            .execute(UpdatePassword(secret("abc")))
            .await
            .unwrap_err();
        assert_eq!(err.category(), Category::Validation);

        account
            .execute(UpdatePassword(secret("better-secret")))
            .await
            .unwrap();
        account.execute(SignOut).await.unwrap();

        assert!(account
            .execute(SignIn {
                email: "writer@example.com".into(),
                password: secret("secret1"),
            })
            .await
            .is_err());
        assert!(account
            .execute(SignIn {
                email: "writer@example.com".into(),
                password: secret("better-secret"),
            })
            .await
            .is_ok());
    }
}
