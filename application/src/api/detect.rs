//! AI detection endpoint.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use service::{
    command::{detect_ai, Command as _, DetectAi},
    domain::text::detection::{Assessment, Score},
};

use crate::{AsError, Context, Error};

use super::UpstreamError;

/// Body of a `POST /api/detect` request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Request {
    /// Text to analyze.
    pub text: String,
}

/// Body of a successful `POST /api/detect` response.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Always `true`.
    pub success: bool,

    /// Likelihood of the text being AI-generated.
    pub ai_score: Score,

    /// Likelihood of the text being human-written.
    pub human_score: Score,

    /// Verdict on the [`Response::ai_score`].
    pub assessment: Assessment,
}

/// `POST /api/detect` handler.
///
/// # Errors
///
/// If the request is malformed or the text cannot be analyzed.
pub async fn detect(
    ctx: Context,
    req: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, Error> {
    let Request { text } = super::body(req).map_err(ctx.error())?;
    let text = super::text(text).map_err(ctx.error())?;

    let report = ctx
        .service()
        .execute(DetectAi(text))
        .await
        .map_err(AsError::into_error)
        .map_err(ctx.error())?;

    Ok(Json(Response {
        success: true,
        ai_score: report.ai_score,
        human_score: report.human_score,
        assessment: report.assessment,
    }))
}

impl AsError for detect_ai::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Language(e) => {
                Some(Error::from(UpstreamError::Detect).with_details(e))
            }
        }
    }
}
