//! [`Command`] for sending the email confirmation link again.

use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    account::Account,
    domain::user,
    error::{Categorize, Category},
    infra::{auth, Auth},
};

use super::Command;

/// [`Command`] for sending the email confirmation link again.
///
/// Never touches the current [`Session`].
///
/// [`Session`]: crate::domain::Session
#[derive(Clone, Debug)]
pub struct ResendVerification {
    /// Email address to send the link to.
    pub email: String,
}

impl<A, B, S> Command<ResendVerification> for Account<A, B, S>
where
    A: Auth<auth::ResendConfirmation, Ok = (), Err = Traced<auth::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ResendVerification,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let email = user::Email::new(cmd.email.trim())
                .ok_or(E::InvalidEmail)
                .map_err(tracerr::wrap!())?;

            self.auth()
                .execute(auth::ResendConfirmation { email })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            self.succeeded("Verification email sent! Please check your inbox.");
            Ok(())
        }
        .await;

        self.report(res)
    }
}

/// Error of [`ResendVerification`] [`Command`] execution.
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

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use secrecy::SecretString;

    use crate::{
        account::{command::SignUp, spec::account},
        domain::user,
        infra::auth::VerificationKind,
    };

    use super::ResendVerification;

    #[tokio::test]
    async fn sends_another_link() {
        let account = account(true);
        _ = account
            .execute(SignUp {
                email: "writer@example.com".into(),
                password: SecretString::from("secret1".to_owned()),
                name: "Ada".into(),
                metadata: Default::default(),
            })
            .await
            .unwrap();

        account
            .execute(ResendVerification {
                email: "writer@example.com".into(),
            })
            .await
            .unwrap();

        let email = user::Email::new("writer@example.com").unwrap();
        let mails = account.auth().mails(&email);
        assert_eq!(mails.len(), 2);
        assert!(mails.iter().all(|m| m.kind == VerificationKind::Signup));
        assert!(account.session().is_none());
    }
}
