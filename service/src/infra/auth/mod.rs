//! [`Auth`]-related implementations.

pub mod backend;
pub mod mock;
pub mod supabase;

use common::define_kind;
use derive_more::{Display, Error as StdError, From};
use secrecy::SecretBox;
use tokio::sync::broadcast;
use url::Url;

use crate::domain::{
    user::{self, Session},
    User,
};

pub use self::{backend::Backend, mock::Mock, supabase::Supabase};

/// Authentication provider operation.
pub use common::Handler as Auth;

/// Capacity of the [`AuthEvent`]s channel of a provider.
pub const EVENTS_CAPACITY: usize = 16;

/// Operation registering a new [`User`].
#[derive(Clone, Debug)]
pub struct SignUp {
    /// [`user::Email`] of the new [`User`].
    pub email: user::Email,

    /// [`user::Password`] of the new [`User`].
    pub password: SecretBox<user::Password>,

    /// Initial [`user::Metadata`] of the new [`User`].
    pub metadata: user::Metadata,

    /// URL the confirmation link should lead to.
    pub redirect_to: Option<Url>,
}

/// Outcome of a [`SignUp`].
#[derive(Clone, Debug, PartialEq)]
pub enum SignedUp {
    /// [`User`] is registered and signed in already.
    SignedIn(Session),

    /// [`User`] is registered, but must confirm the [`user::Email`] first.
    ConfirmationRequired(User),
}

/// Operation exchanging credentials for a [`Session`].
#[derive(Clone, Debug)]
pub struct SignIn {
    /// [`user::Email`] of the [`User`].
    pub email: user::Email,

    /// [`user::Password`] of the [`User`].
    pub password: SecretBox<user::Password>,
}

/// Operation ending the current [`Session`], if any.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignOut;

/// Operation returning the current [`Session`], refreshing it if expired.
#[derive(Clone, Copy, Debug, Default)]
pub struct GetSession;

/// Operation updating the signed-in [`User`].
#[derive(Clone, Debug, Default)]
pub struct UpdateUser {
    /// [`user::Metadata`] to merge into the existing one.
    pub metadata: user::Metadata,

    /// New [`user::Password`], if it should be changed.
    pub password: Option<SecretBox<user::Password>>,
}

/// Operation requesting a password reset email.
#[derive(Clone, Debug)]
pub struct ResetPassword {
    /// [`user::Email`] to send the reset link to.
    pub email: user::Email,

    /// URL the reset link should lead to.
    pub redirect_to: Url,
}

/// Operation requesting the confirmation email to be sent again.
#[derive(Clone, Debug)]
pub struct ResendConfirmation {
    /// [`user::Email`] to send the confirmation link to.
    pub email: user::Email,
}

/// Operation verifying a one-time token sent by email.
#[derive(Clone, Debug)]
pub struct Verify {
    /// [`VerificationKind`] of the token.
    pub kind: VerificationKind,

    /// Token hash from the email link.
    pub token_hash: String,
}

define_kind! {
    #[doc = "Purpose of a one-time token sent by email."]
    enum VerificationKind {
        #[doc = "Confirms the email of a new [`User`]."]
        Signup = 1,

        #[doc = "Lets a [`User`] set a new password."]
        Recovery = 2,
    }
}

/// Operation building the URL to start an OAuth sign-in at.
#[derive(Clone, Debug)]
pub struct AuthorizeUrl {
    /// [`OAuthProvider`] to sign in with.
    pub provider: OAuthProvider,

    /// URL the provider should redirect back to.
    pub redirect_to: Url,
}

define_kind! {
    #[doc = "Third-party identity provider."]
    enum OAuthProvider {
        #[doc = "Google account."]
        Google = 1,

        #[doc = "GitHub account."]
        Github = 2,
    }
}

/// Operation subscribing to [`AuthEvent`]s of a provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct Subscribe;

/// Receiver of [`AuthEvent`]s returned by [`Subscribe`].
pub type Events = broadcast::Receiver<AuthEvent>;

/// Transition of the authentication state reported by a provider.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthEvent {
    /// New [`Session`] has started.
    SignedIn(Session),

    /// Current [`Session`] has ended.
    SignedOut,

    /// Tokens of the current [`Session`] were refreshed.
    TokenRefreshed(Session),

    /// [`User`] of the current [`Session`] was updated.
    UserUpdated(Session),

    /// [`Session`] started from a password recovery link.
    PasswordRecovery(Session),
}

impl AuthEvent {
    /// Returns the [`Session`] carried by this [`AuthEvent`], if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(s)
            | Self::TokenRefreshed(s)
            | Self::UserUpdated(s)
            | Self::PasswordRecovery(s) => Some(s),
            Self::SignedOut => None,
        }
    }

    /// Returns the [`User`] carried by this [`AuthEvent`], if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }
}

/// [`Auth`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Provider refused the operation.
    #[display("{_0}")]
    #[from(ignore)]
    Rejected(#[error(not(source))] String),

    /// Operation requires a signed-in [`User`].
    #[display("no `User` is signed in")]
    Unauthenticated,

    /// Request to the provider failed.
    #[display("request failed: {_0}")]
    Request(reqwest::Error),

    /// Provider responded with something unexpected.
    #[display("malformed response: {_0}")]
    #[from(ignore)]
    Malformed(#[error(not(source))] String),

    /// Session token couldn't be issued or verified.
    #[display("invalid session token: {_0}")]
    Jwt(jsonwebtoken::errors::Error),
}

impl Error {
    /// Creates a new [`Error::Rejected`] with the provided `reason`.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}
