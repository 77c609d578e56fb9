//! [`Tier`] definitions and access gating.

use common::{define_kind, money::Currency, Money};

use crate::domain::{Subscription, User};

define_kind! {
    #[doc = "Subscription level controlling word limits and feature access."]
    enum Tier {
        #[doc = "Free level."]
        Basic = 0,

        #[doc = "Paid level with advanced features."]
        Pro = 1,

        #[doc = "Highest paid level."]
        Ultra = 2,
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::Basic
    }
}

impl Tier {
    /// Returns the static [`Definition`] of this [`Tier`].
    #[must_use]
    pub const fn definition(self) -> &'static Definition {
        match self {
            Self::Basic => &Definition::BASIC,
            Self::Pro => &Definition::PRO,
            Self::Ultra => &Definition::ULTRA,
        }
    }

    /// Returns the maximum number of words processable on this [`Tier`].
    #[must_use]
    pub const fn word_limit(self) -> usize {
        self.definition().word_limit
    }

    /// Returns the features available on this [`Tier`].
    #[must_use]
    pub const fn features(self) -> &'static [&'static str] {
        self.definition().features
    }

    /// Returns the monthly price of this [`Tier`].
    #[must_use]
    pub const fn price(self) -> Money {
        self.definition().price
    }
}

/// Static properties of a [`Tier`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Definition {
    /// Maximum number of words processable at once.
    pub word_limit: usize,

    /// Human-readable features.
    pub features: &'static [&'static str],

    /// Monthly price.
    pub price: Money,
}

impl Definition {
    /// [`Definition`] of [`Tier::Basic`].
    pub const BASIC: Self = Self {
        word_limit: 500,
        features: &[
            "Basic humanization",
            "Word count",
            "Reading time",
            "Auto-save",
        ],
        price: Money::new(0, 0, Currency::Usd),
    };

    /// [`Definition`] of [`Tier::Pro`].
    pub const PRO: Self = Self {
        word_limit: 2000,
        features: &[
            "Advanced humanization",
            "AI detection",
            "Export options",
            "Style customization",
        ],
        price: Money::new(2999, 2, Currency::Usd),
    };

    /// [`Definition`] of [`Tier::Ultra`].
    pub const ULTRA: Self = Self {
        word_limit: 10_000,
        features: &[
            "Ultra humanization",
            "All Pro features",
            "Bulk processing",
            "Priority support",
        ],
        price: Money::new(5999, 2, Currency::Usd),
    };
}

/// Returns the [`Tier`] granted to the provided [`User`] by the provided
/// [`Subscription`].
///
/// Anything short of a signed-in [`User`] with an active [`Subscription`]
/// yields [`Tier::Basic`].
#[must_use]
pub fn tier_of(
    user: Option<&User>,
    subscription: Option<&Subscription>,
) -> Tier {
    match (user, subscription) {
        (Some(_), Some(sub)) if sub.is_active() => sub.plan,
        (None | Some(_), None | Some(_)) => Tier::Basic,
    }
}

/// Indicates whether the `current` [`Tier`] grants features of the `required`
/// one.
#[must_use]
pub const fn can_access(current: Tier, required: Tier) -> bool {
    current.u8() >= required.u8()
}

/// Indicates whether the `word_count` exceeds the limit of the provided
/// [`Tier`].
///
/// The limit itself is allowed.
#[must_use]
pub const fn is_over_limit(word_count: usize, tier: Tier) -> bool {
    word_count > tier.word_limit()
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{subscription, user, Subscription, User};

    use super::{can_access, is_over_limit, tier_of, Tier};

    fn user() -> User {
        User {
            id: user::Id::new(),
            email: user::Email::new("writer@example.com").unwrap(),
            name: None,
            email_verified: true,
            avatar_url: None,
            metadata: user::Metadata::default(),
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn access_is_ordered_by_rank() {
        for &current in Tier::ALL {
            for &required in Tier::ALL {
                assert_eq!(
                    can_access(current, required),
                    current >= required,
                    "{current} vs {required}",
                );
            }
        }
        assert!(can_access(Tier::Ultra, Tier::Pro));
        assert!(!can_access(Tier::Basic, Tier::Pro));
    }

    #[test]
    fn limit_is_inclusive() {
        assert!(!is_over_limit(500, Tier::Basic));
        assert!(is_over_limit(501, Tier::Basic));
        assert!(!is_over_limit(2000, Tier::Pro));
        assert!(is_over_limit(2001, Tier::Pro));
        assert!(!is_over_limit(10_000, Tier::Ultra));
        assert!(is_over_limit(10_001, Tier::Ultra));
        assert!(!is_over_limit(0, Tier::Basic));
    }

    #[test]
    fn tier_requires_user_and_active_subscription() {
        let user = user();
        let mut sub = Subscription::new(user.id, Tier::Pro, None);

        assert_eq!(tier_of(None, None), Tier::Basic);
        assert_eq!(tier_of(Some(&user), None), Tier::Basic);
        assert_eq!(tier_of(None, Some(&sub)), Tier::Basic);
        assert_eq!(tier_of(Some(&user), Some(&sub)), Tier::Pro);

        sub.cancel();
        assert_eq!(sub.status, subscription::Status::Cancelled);
        assert_eq!(tier_of(Some(&user), Some(&sub)), Tier::Basic);
    }

    #[test]
    fn definitions_table() {
        assert_eq!(Tier::Basic.word_limit(), 500);
        assert_eq!(Tier::Pro.word_limit(), 2000);
        assert_eq!(Tier::Ultra.word_limit(), 10_000);

        assert!(Tier::Basic.price().is_free());
        assert_eq!(Tier::Pro.price().to_string(), "29.99USD");
        assert_eq!(Tier::Ultra.price().to_string(), "59.99USD");

        assert!(Tier::Pro.features().contains(&"AI detection"));
        assert_eq!(Tier::Ultra.features().len(), 4);
    }

    #[test]
    fn parses_lowercase_names() {
        assert_eq!("ultra".parse::<Tier>(), Ok(Tier::Ultra));
        assert_eq!(Tier::Pro.to_string(), "pro");
        assert!("gold".parse::<Tier>().is_err());
    }
}
