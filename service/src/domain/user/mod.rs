//! [`User`] definitions.

pub mod session;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Debug, Display, From, FromStr, Into};
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;
use xxhash_rust::xxh3;

pub use self::session::Session;

/// Identity of a person using the application.
///
/// Owned by the authentication provider, so only the latest snapshot of it is
/// ever kept locally.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Email`] of this [`User`].
    pub email: Email,

    /// Display [`Name`] of this [`User`], if any.
    pub name: Option<Name>,

    /// Indicator whether the [`Email`] of this [`User`] has been verified.
    pub email_verified: bool,

    /// URL of this [`User`]'s avatar image, if any.
    pub avatar_url: Option<Url>,

    /// Free-form [`Metadata`] of this [`User`].
    pub metadata: Metadata,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Display name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl std::str::FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[as_ref(str)]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    ///
    /// Only the presence of a single `@` separating non-empty parts is
    /// required, the provider performs the real verification.
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        address.trim() == address
            && address.len() <= 320
            && address.split_once('@').is_some_and(|(local, domain)| {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            })
    }
}

impl std::str::FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[debug("Password(..)")]
pub struct Password(String);

impl Password {
    /// Maximum allowed length of a [`Password`] in characters.
    pub const MAX_LENGTH: usize = 128;

    /// Creates a new [`Password`] if the given `password` is valid.
    ///
    /// Minimum length is a policy of the caller, see [`Password::len()`].
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Returns the length of this [`Password`] in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Indicates whether this [`Password`] is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        !password.is_empty() && password.chars().count() <= Self::MAX_LENGTH
    }
}

impl std::str::FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Password hash of a [`User`], as kept by the in-memory provider.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Creates a new [`PasswordHash`] from the given [`Password`] salted with
    /// the [`Email`] it belongs to.
    #[must_use]
    pub fn new(email: &Email, password: &Password) -> Self {
        // TODO: Use `argon2` once a real credential store replaces the
        //       in-memory provider.
        let mut hasher = xxh3::Xxh3::new();
        hasher.update(email.as_ref().as_bytes());
        hasher.update(&[0]);
        hasher.update(password.as_ref().as_bytes());
        Self(format!("{:032x}", hasher.digest128()))
    }
}

/// Free-form metadata of a [`User`].
#[derive(
    AsRef, Clone, Debug, Default, Deserialize, Eq, From, Into, PartialEq,
    Serialize,
)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Key of the display name inside [`Metadata`].
    pub const FULL_NAME: &'static str = "full_name";

    /// Key of the avatar URL inside [`Metadata`].
    pub const AVATAR_URL: &'static str = "avatar_url";

    /// Key of the nested preferences object inside [`Metadata`].
    pub const PREFERENCES: &'static str = "preferences";

    /// Returns the value stored under the provided `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the string stored under the provided `key`, if any.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Sets the `value` under the provided `key`, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Merges the `other` [`Metadata`] into this one, overwriting top-level
    /// keys.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Merges the provided `preferences` into the nested
    /// [`Metadata::PREFERENCES`] object key by key.
    ///
    /// A non-object value stored under [`Metadata::PREFERENCES`] is replaced.
    pub fn merge_preferences(&mut self, preferences: Map<String, Value>) {
        let entry = self
            .0
            .entry(Self::PREFERENCES)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(existing) = entry {
            existing.extend(preferences);
        } else {
            *entry = Value::Object(preferences);
        }
    }

    /// Returns the display [`Name`] stored in this [`Metadata`], if any.
    #[must_use]
    pub fn name(&self) -> Option<Name> {
        self.get_str(Self::FULL_NAME).and_then(Name::new)
    }

    /// Returns the avatar URL stored in this [`Metadata`], if any.
    #[must_use]
    pub fn avatar_url(&self) -> Option<Url> {
        self.get_str(Self::AVATAR_URL).and_then(|u| u.parse().ok())
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;
