//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts};
use tracing as log;

use crate::{Error, Service};

/// Application context shared by every request handler.
#[derive(Clone, Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Indicator whether [`Error::details`] are sent to clients.
    expose_error_details: bool,
}

impl Context {
    /// Creates a new [`Context`] over the provided [`Service`].
    #[must_use]
    pub const fn new(service: Service, expose_error_details: bool) -> Self {
        Self {
            service,
            expose_error_details,
        }
    }

    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }

    /// Helper method preparing an [`Error`] to be sent to a client inside
    /// [`Result::map_err()`] closure.
    ///
    /// Server errors are logged, and [`Error::details`] are withheld unless
    /// exposing them is enabled.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |mut err| {
            if err.status_code.is_server_error() {
                log::error!("{err}");
            } else {
                log::debug!("{err}");
            }
            if !self.expose_error_details {
                err.details = None;
            }
            err
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Context` extension"))
    }
}
