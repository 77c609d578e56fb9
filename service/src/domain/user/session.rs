//! [`Session`] definitions.

use common::{unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Debug, Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::{user, User};

/// Live credential of an authenticated [`User`].
///
/// A [`Session`] always carries the [`User`] it belongs to, so both are
/// replaced together.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// [`User`] this [`Session`] belongs to.
    pub user: User,

    /// Access [`Token`] of this [`Session`].
    pub access_token: Token,

    /// [`Token`] to refresh this [`Session`] with, if any.
    pub refresh_token: Option<Token>,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Indicates whether this [`Session`] has expired already.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= DateTime::now().coerce()
    }
}

/// Claims of an access [`Token`] issued by the in-memory provider.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Claims {
    /// ID of the [`User`] the [`Token`] is issued for.
    #[serde(rename = "sub")]
    pub user_id: user::Id,

    /// [`DateTime`] when the [`Token`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Opaque token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, FromStr, PartialEq)]
#[as_ref(str)]
#[debug("Token(..)")]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] out of the provided string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::domain::{user, User};

    use super::{Session, Token};

    #[test]
    fn token_is_not_printed_in_debug() {
        let token = Token::new("secret.jwt.value");

        assert_eq!(format!("{token:?}"), "Token(..)");
        assert_eq!(token.to_string(), "secret.jwt.value");
    }

    #[test]
    fn expires_by_wall_clock() {
        let user = User {
            id: user::Id::new(),
            email: user::Email::new("writer@example.com").unwrap(),
            name: None,
            email_verified: true,
            avatar_url: None,
            metadata: user::Metadata::default(),
            created_at: DateTime::now().coerce(),
        };
        let mut session = Session {
            user,
            access_token: Token::new("access"),
            refresh_token: None,
            expires_at: (DateTime::now() - Duration::from_secs(1)).coerce(),
        };
        assert!(session.is_expired());

        session.expires_at =
            (DateTime::now() + Duration::from_secs(60)).coerce();
        assert!(!session.is_expired());
    }
}
