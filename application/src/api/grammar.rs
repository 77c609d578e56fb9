//! Grammar check endpoint.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use service::{
    command::{check_grammar, CheckGrammar, Command as _},
    domain::text::grammar::Issue,
};

use crate::{AsError, Context, Error};

use super::UpstreamError;

/// Body of a `POST /api/grammar` request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Request {
    /// Text to check.
    pub text: String,
}

/// Body of a successful `POST /api/grammar` response.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Always `true`.
    pub success: bool,

    /// Found [`Issue`]s.
    pub issues: Vec<Issue>,

    /// Number of the found [`Issue`]s.
    pub issue_count: usize,
}

/// `POST /api/grammar` handler.
///
/// # Errors
///
/// If the request is malformed or the text cannot be checked.
pub async fn grammar(
    ctx: Context,
    req: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, Error> {
    let Request { text } = super::body(req).map_err(ctx.error())?;
    let text = super::text(text).map_err(ctx.error())?;

    let issues = ctx
        .service()
        .execute(CheckGrammar(text))
        .await
        .map_err(AsError::into_error)
        .map_err(ctx.error())?;

    Ok(Json(Response {
        success: true,
        issue_count: issues.len(),
        issues,
    }))
}

impl AsError for check_grammar::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Language(e) => {
                Some(Error::from(UpstreamError::Grammar).with_details(e))
            }
        }
    }
}
