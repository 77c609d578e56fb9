//! [`Language`] implementation over HTTP APIs.

use std::time::Duration;

use common::operations::Perform;
use derive_more::Debug;
use reqwest::Client;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use tracerr::Traced;
use tracing as log;
use url::Url;

use crate::domain::text::grammar;

use super::{Completion, Error, GrammarCheck, Language};

/// [`Http`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// URL of an OpenAI-compatible chat completions endpoint.
    pub completions_url: Url,

    /// API key of the chat completions endpoint.
    #[debug(skip)]
    pub api_key: SecretString,

    /// Model to request completions from.
    pub model: String,

    /// URL of a LanguageTool-compatible `check` endpoint.
    pub grammar_url: Url,

    /// Timeout of a single outbound request.
    pub timeout: Duration,
}

/// [`Language`] talking to remote HTTP APIs.
#[derive(Clone, Debug)]
pub struct Http {
    /// HTTP client performing the requests.
    client: Client,

    /// [`Config`] of this [`Http`].
    config: Config,
}

impl Http {
    /// Creates a new [`Http`] with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self { client, config })
    }

    /// Turns a non-success `response` into an [`Error::Status`].
    async fn check(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl Language<Perform<Completion>> for Http {
    type Ok = String;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(req): Perform<Completion>,
    ) -> Result<Self::Ok, Self::Err> {
        log::debug!(
            model = %self.config.model,
            temperature = req.temperature,
            max_tokens = req.max_tokens,
            "requesting chat completion",
        );

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &req.system,
                },
                ChatMessage {
                    role: "user",
                    content: req.user.as_str(),
                },
            ],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };
        let resp = self
            .client
            .post(self.config.completions_url.clone())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let resp: ChatResponse = Self::check(resp)
            .await
            .map_err(tracerr::wrap!())?
            .json()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(Error::EmptyCompletion)
            .map_err(tracerr::wrap!())
    }
}

impl Language<Perform<GrammarCheck>> for Http {
    type Ok = Vec<grammar::Issue>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(req): Perform<GrammarCheck>,
    ) -> Result<Self::Ok, Self::Err> {
        log::debug!(language = req.language, "checking grammar");

        let resp = self
            .client
            .post(self.config.grammar_url.clone())
            .form(&[("text", req.text.as_str()), ("language", req.language)])
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let resp: GrammarResponse = Self::check(resp)
            .await
            .map_err(tracerr::wrap!())?
            .json()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        Ok(resp.matches)
    }
}

/// Body of a chat completion request.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

/// Single message of a [`ChatRequest`].
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Body of a chat completion response.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Single choice of a [`ChatResponse`].
#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

/// Message of a [`ChatChoice`].
#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Body of a grammar check response.
#[derive(Deserialize)]
struct GrammarResponse {
    matches: Vec<grammar::Issue>,
}
