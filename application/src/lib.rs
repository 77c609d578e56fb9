//! Application provides HTTP API for interacting with the [`Service`].

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

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use axum::{
    routing::{get, post},
    Extension, Router,
};
// Used in binary.
use axum_client_ip as _;
use tokio as _;
use tower_http as _;
use tracing_subscriber as _;
#[cfg(test)]
use {reqwest as _, serde_json as _};

pub use self::{
    args::Args,
    config::Config,
    context::Context,
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::language::Http>;

/// Builds the [`Router`] of the HTTP API over the provided [`Context`].
#[must_use]
pub fn router(context: Context) -> Router {
    Router::new()
        .route("/api/health", get(api::health::health))
        .route("/api/humanize", post(api::humanize::humanize))
        .route(
            "/api/humanize-advanced",
            post(api::humanize::humanize_advanced),
        )
        .route("/api/detect", post(api::detect::detect))
        .route("/api/grammar", post(api::grammar::grammar))
        .layer(Extension(context))
}
