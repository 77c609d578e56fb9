//! HTTP API definitions.

pub mod detect;
pub mod grammar;
pub mod health;
pub mod humanize;

use axum::{extract::rejection::JsonRejection, Json};
use service::domain::Text;

use crate::{define_error, AsError as _, Error};

define_error! {
    enum RequestError {
        #[code = "TEXT_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Text is required"]
        TextRequired,

        #[code = "INVALID_TARGET_AUDIENCE"]
        #[status = BAD_REQUEST]
        #[message = "Target audience must be 1 to 200 characters long"]
        InvalidAudience,
    }
}

define_error! {
    enum UpstreamError {
        #[code = "HUMANIZE_FAILED"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Failed to humanize text"]
        Humanize,

        #[code = "DETECT_FAILED"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Failed to analyze text"]
        Detect,

        #[code = "GRAMMAR_FAILED"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Failed to check grammar"]
        Grammar,
    }
}

/// Unwraps the JSON body of a request.
///
/// # Errors
///
/// If the body is not a valid JSON of the expected shape.
fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    body.map(|Json(b)| b).map_err(|e| e.as_error())
}

/// Parses the submitted `text`.
///
/// # Errors
///
/// With [`RequestError::TextRequired`] if the `text` is blank.
fn text(text: String) -> Result<Text, Error> {
    Text::new(text).ok_or_else(|| RequestError::TextRequired.into())
}
