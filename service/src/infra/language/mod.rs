//! [`Language`]-related implementations.

pub mod http;

use derive_more::{Display, Error as StdError, From};

use crate::domain::Text;

pub use self::http::Http;

/// Language model and grammar checker operation.
pub use common::Handler as Language;

/// Request of a single chat completion.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    /// System prompt instructing the model.
    pub system: String,

    /// User message to complete.
    pub user: Text,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum number of tokens to produce.
    pub max_tokens: u32,
}

/// Request of a grammar check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrammarCheck {
    /// [`Text`] to check.
    pub text: Text,

    /// Language code of the [`Text`].
    pub language: &'static str,
}

/// [`Language`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Request couldn't be performed or its response couldn't be decoded.
    #[display("request failed: {_0}")]
    Request(reqwest::Error),

    /// Upstream responded with a non-success status.
    #[display("upstream responded with `{status}`: {body}")]
    #[from(ignore)]
    Status {
        /// HTTP status code of the response.
        status: u16,

        /// Body of the response.
        body: String,
    },

    /// Upstream returned a chat completion without any content.
    #[display("chat completion has no content")]
    EmptyCompletion,
}

impl Error {
    /// Indicates whether the upstream couldn't be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            Self::Status { .. } | Self::EmptyCompletion => false,
        }
    }
}
