//! Classification of errors by their origin.

use common::define_kind;
use tracerr::Traced;

use crate::infra::{auth, billing, language, storage};

define_kind! {
    #[doc = "Category an error belongs to."]
    enum Category {
        #[doc = "Input is missing or malformed. Retrying won't help."]
        Validation = 1,

        #[doc = "Operation requires a signed-in `User`."]
        Unauthorized = 2,

        #[doc = "External provider refused or failed the operation."]
        Provider = 3,

        #[doc = "External provider couldn't be reached."]
        Network = 4,

        #[doc = "Operation conflicts with the current state."]
        Conflict = 5,
    }
}

/// Classification of an error into a [`Category`].
pub trait Categorize {
    /// Returns the [`Category`] of this error.
    fn category(&self) -> Category;
}

impl<E: Categorize> Categorize for Traced<E> {
    fn category(&self) -> Category {
        self.as_ref().category()
    }
}

impl Categorize for billing::Error {
    fn category(&self) -> Category {
        match self {
            Self::Declined(_) => Category::Provider,
        }
    }
}

impl Categorize for auth::Error {
    fn category(&self) -> Category {
        match self {
            Self::Unauthenticated => Category::Unauthorized,
            Self::Request(e) if e.is_decode() => Category::Provider,
            Self::Request(_) => Category::Network,
            Self::Rejected(_) | Self::Malformed(_) | Self::Jwt(_) => {
                Category::Provider
            }
        }
    }
}

impl Categorize for storage::Error {
    fn category(&self) -> Category {
        Category::Provider
    }
}

impl Categorize for language::Error {
    fn category(&self) -> Category {
        if self.is_unreachable() {
            Category::Network
        } else {
            Category::Provider
        }
    }
}

#[cfg(test)]
mod spec {
    use tracerr::Traced;

    use crate::infra::{auth, language};

    use super::{Categorize as _, Category};

    #[test]
    fn categorizes_auth_errors() {
        assert_eq!(
            auth::Error::Unauthenticated.category(),
            Category::Unauthorized,
        );
        assert_eq!(
            auth::Error::rejected("Invalid login credentials").category(),
            Category::Provider,
        );
    }

    #[test]
    fn traced_keeps_category() {
        let err: Traced<language::Error> =
            tracerr::new!(language::Error::EmptyCompletion);

        assert_eq!(err.category(), Category::Provider);
    }
}
