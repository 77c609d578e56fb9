//! Humanization endpoints.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use service::{
    command::{humanize_text, Command as _, HumanizeText},
    domain::text::{
        self,
        humanize::{self, Audience, Creativity, Length, Style, Tone},
    },
};

use crate::{AsError, Context, Error};

use super::{RequestError, UpstreamError};

/// Body of a `POST /api/humanize` request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Request {
    /// Text to rewrite.
    pub text: String,

    /// [`Tone`] to keep.
    pub tone: Tone,

    /// [`Style`] to keep.
    pub style: Style,

    /// Desired [`Length`].
    pub length: Length,
}

/// Body of a `POST /api/humanize-advanced` request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvancedRequest {
    /// Basic options.
    #[serde(flatten)]
    pub basic: Request,

    /// Intended readers of the text.
    pub target_audience: Option<String>,

    /// Allowed [`Creativity`].
    pub creativity: Creativity,
}

/// Body of a successful humanization response.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Always `true`.
    pub success: bool,

    /// Submitted text.
    pub original_text: String,

    /// Rewritten text.
    pub humanized_text: String,

    /// Number of words in the rewritten text.
    pub word_count: usize,

    /// Number of characters in the rewritten text.
    pub character_count: usize,

    /// Indicator whether the rewrite is rule-based.
    pub fallback: bool,

    /// Applied [`Settings`] of an advanced humanization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

/// Settings applied by an advanced humanization.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Applied [`Tone`].
    pub tone: Tone,

    /// Applied [`Style`].
    pub style: Style,

    /// Applied [`Audience`].
    pub target_audience: Audience,

    /// Applied [`Length`].
    pub length: Length,

    /// Applied [`Creativity`].
    pub creativity: Creativity,
}

/// `POST /api/humanize` handler.
///
/// # Errors
///
/// If the request is malformed or the text cannot be rewritten.
pub async fn humanize(
    ctx: Context,
    req: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, Error> {
    let Request {
        text,
        tone,
        style,
        length,
    } = super::body(req).map_err(ctx.error())?;
    let text = super::text(text).map_err(ctx.error())?;
    let original = text.to_string();

    let out = ctx
        .service()
        .execute(HumanizeText {
            text,
            options: humanize::Options {
                tone,
                style,
                length,
            },
            advanced: None,
        })
        .await
        .map_err(AsError::into_error)
        .map_err(ctx.error())?;

    Ok(Json(Response {
        success: true,
        original_text: original,
        word_count: text::word_count(&out.text),
        character_count: text::character_count(&out.text),
        humanized_text: out.text,
        fallback: out.fallback,
        settings: None,
    }))
}

/// `POST /api/humanize-advanced` handler.
///
/// # Errors
///
/// If the request is malformed or the text cannot be rewritten.
pub async fn humanize_advanced(
    ctx: Context,
    req: Result<Json<AdvancedRequest>, JsonRejection>,
) -> Result<Json<Response>, Error> {
    let AdvancedRequest {
        basic:
            Request {
                text,
                tone,
                style,
                length,
            },
        target_audience,
        creativity,
    } = super::body(req).map_err(ctx.error())?;
    let text = super::text(text).map_err(ctx.error())?;
    let audience = match target_audience {
        Some(a) => Audience::new(a)
            .ok_or_else(|| Error::from(RequestError::InvalidAudience))
            .map_err(ctx.error())?,
        None => Audience::default(),
    };
    let original = text.to_string();

    let options = humanize::Options {
        tone,
        style,
        length,
    };
    let advanced = humanize::Advanced {
        audience,
        creativity,
    };
    let out = ctx
        .service()
        .execute(HumanizeText {
            text,
            options,
            advanced: Some(advanced.clone()),
        })
        .await
        .map_err(AsError::into_error)
        .map_err(ctx.error())?;

    Ok(Json(Response {
        success: true,
        original_text: original,
        word_count: text::word_count(&out.text),
        character_count: text::character_count(&out.text),
        humanized_text: out.text,
        fallback: out.fallback,
        settings: Some(Settings {
            tone,
            style,
            target_audience: advanced.audience,
            length,
            creativity,
        }),
    }))
}

impl AsError for humanize_text::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Language(e) => {
                Some(Error::from(UpstreamError::Humanize).with_details(e))
            }
        }
    }
}
