//! [`Message`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, From, Into};

/// Transient status notification shown to a user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    /// ID of this [`Message`].
    pub id: Id,

    /// Human-readable text of this [`Message`].
    pub text: String,

    /// [`Kind`] of this [`Message`].
    pub kind: Kind,

    /// [`DateTime`] when this [`Message`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Message`].
///
/// Increases monotonically within a single notification channel.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
pub struct Id(u64);

define_kind! {
    #[doc = "Kind of a [`Message`]."]
    enum Kind {
        #[doc = "Operation succeeded."]
        Success = 1,

        #[doc = "Operation failed."]
        Error = 2,

        #[doc = "Something requires attention."]
        Warning = 3,

        #[doc = "Neutral information."]
        Info = 4,
    }
}

/// [`DateTime`] when a [`Message`] was created.
pub type CreationDateTime = DateTimeOf<(Message, unit::Creation)>;
