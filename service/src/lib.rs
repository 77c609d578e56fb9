//! Service contains the business logic of the application: [`Account`]s of
//! clients and the text processing [`Service`].
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod account;
pub mod command;
pub mod domain;
pub mod error;
pub mod infra;
pub mod notification;

#[cfg(doc)]
use infra::Language;

pub use self::{
    account::Account,
    command::Command,
    error::{Categorize, Category},
    notification::Notifications,
};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// Indicator whether a rule-based rewrite is returned when the language
    /// model cannot be reached.
    pub fallback: bool,
}

/// Text processing service.
#[derive(Clone, Debug)]
pub struct Service<Lang> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Language`] of this [`Service`].
    language: Lang,
}

impl<Lang> Service<Lang> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub const fn new(config: Config, language: Lang) -> Self {
        Self { config, language }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Language`] of this [`Service`].
    #[must_use]
    pub const fn language(&self) -> &Lang {
        &self.language
    }
}
