//! [`Command`] for registering a new [`User`].

use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox, SecretString};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    account::{Account, SubscriptionStorage, CALLBACK_PATH},
    domain::{message, user},
    error::{Categorize, Category},
    infra::{auth, storage, Auth},
};

use super::Command;

/// [`Command`] for registering a new [`User`].
#[derive(Clone, Debug)]
pub struct SignUp {
    /// Email address of the new [`User`].
    pub email: String,

    /// Password of the new [`User`].
    pub password: SecretString,

    /// Display name of the new [`User`].
    pub name: String,

    /// Additional [`user::Metadata`] of the new [`User`].
    pub metadata: user::Metadata,
}

impl<A, B, S> Command<SignUp> for Account<A, B, S>
where
    A: Auth<auth::SignUp, Ok = auth::SignedUp, Err = Traced<auth::Error>>,
    S: SubscriptionStorage,
{
    type Ok = auth::SignedUp;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SignUp) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let res: Result<Self::Ok, Self::Err> = async {
            let SignUp {
                email,
                password,
                name,
                mut metadata,
            } = cmd;
            let (email, name) = (email.trim(), name.trim());
            let password = password.expose_secret();

            if email.is_empty() || password.is_empty() || name.is_empty() {
                return Err(tracerr::new!(E::MissingFields));
            }
            let email = user::Email::new(email)
                .ok_or(E::InvalidEmail)
                .map_err(tracerr::wrap!())?;
            let min = self.config().password_min_length;
            if password.chars().count() < min {
                return Err(tracerr::new!(E::PasswordTooShort(min)));
            }
            let password = user::Password::new(password)
                .ok_or(E::PasswordTooLong)
                .map_err(tracerr::wrap!())?;
            let name = user::Name::new(name)
                .ok_or(E::InvalidName)
                .map_err(tracerr::wrap!())?;

            let _in_progress =
                self.begin().ok_or(E::InProgress).map_err(tracerr::wrap!())?;

            _ = metadata.insert(user::Metadata::FULL_NAME, name.to_string());
            let outcome = self
                .auth()
                .execute(auth::SignUp {
                    email,
                    password: SecretBox::new(Box::new(password)),
                    metadata,
                    redirect_to: Some(self.config().redirect_to(CALLBACK_PATH)),
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            match &outcome {
                auth::SignedUp::SignedIn(session) => {
                    self.start_session(session.clone())
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    self.succeeded("Account created successfully!");
                }
                auth::SignedUp::ConfirmationRequired(_) => {
                    _ = self.notifications().show_sticky(
                        "Please check your email for a confirmation link",
                        message::Kind::Info,
                    );
                }
            }
            Ok(outcome)
        }
        .await;

        self.report(res)
    }
}

/// Error of [`SignUp`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Email, password or name is missing.
    #[display("All fields are required")]
    MissingFields,

    /// Email is malformed.
    #[display("Please enter a valid email address")]
    InvalidEmail,

    /// Password is shorter than allowed.
    #[display("Password must be at least {_0} characters long")]
    PasswordTooShort(#[error(not(source))] usize),

    /// Password is longer than allowed.
    #[display("Password is too long")]
    PasswordTooLong,

    /// Name is malformed.
    #[display("Please enter a valid name")]
    InvalidName,

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
            Self::MissingFields
            | Self::InvalidEmail
            | Self::PasswordTooShort(_)
            | Self::PasswordTooLong
            | Self::InvalidName => Category::Validation,
            Self::InProgress => Category::Conflict,
            Self::Auth(e) => e.category(),
            Self::Storage(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use secrecy::SecretString;

    use crate::{
        account::spec::account,
        domain::{message, Tier},
        error::{Categorize as _, Category},
        infra::auth::SignedUp,
    };

    use super::SignUp;

    fn sign_up(password: &str) -> SignUp {
        SignUp {
            email: "writer@example.com".into(),
            password: SecretString::from(password.to_owned()),
            name: "Ada".into(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn short_password_fails_validation() {
        let account = account(false);

        let err = account.execute(sign_up("short")).await.unwrap_err();

        assert_eq!(err.category(), Category::Validation);
        assert_eq!(
            err.as_ref().to_string(),
            "Password must be at least 6 characters long",
        );
        let msg = account.notifications().current().unwrap();
        assert_eq!(msg.kind, message::Kind::Error);
        assert!(msg.text.contains("at least 6"));
        assert!(account.session().is_none());
    }

    #[tokio::test]
    async fn minimum_length_is_configurable() {
        let mut account = account(false);
        account.config.password_min_length = 8;

        let err = account.execute(sign_up("secret1")).await.unwrap_err();
        assert_eq!(err.category(), Category::Validation);

        assert!(account.execute(sign_up("secret12")).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_input() {
        let account = account(false);

        for cmd in [
            SignUp {
                name: "  ".into(),
                ..sign_up("secret1")
            },
            SignUp {
                email: "writer.example.com".into(),
                ..sign_up("secret1")
            },
        ] {
            let err = account.execute(cmd).await.unwrap_err();
            assert_eq!(err.category(), Category::Validation);
        }
    }

    #[tokio::test]
    async fn signs_in_new_user() {
        let account = account(false);

        let out = account.execute(sign_up("secret1")).await.unwrap();

        let SignedUp::SignedIn(session) = out else {
            panic!("expected a session");
        };
        let user = account.user().unwrap();
        assert_eq!(user.id, session.user.id);
        assert_eq!(user.name.unwrap().to_string(), "Ada");
        assert_eq!(account.tier(), Tier::Basic);
        assert!(account.is_subscription_active());
        assert!(!account.is_authenticating());
    }

    #[tokio::test]
    async fn requires_confirmation() {
        let account = account(true);

        let out = account.execute(sign_up("secret1")).await.unwrap();

        assert!(matches!(out, SignedUp::ConfirmationRequired(_)));
        assert!(account.session().is_none());
        assert_eq!(
            account.notifications().current().unwrap().kind,
            message::Kind::Info,
        );
    }

    #[tokio::test]
    async fn reports_duplicate() {
        let account = account(false);
        _ = account.execute(sign_up("secret1")).await.unwrap();

        let err = account.execute(sign_up("secret1")).await.unwrap_err();

        assert_eq!(err.category(), Category::Provider);
        assert_eq!(
            account.notifications().current().unwrap().text,
            "User already registered",
        );
    }
}
