//! [`Command`] for humanizing a [`Text`].

use common::operations::Perform;
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{text::humanize, Text},
    error::{Categorize, Category},
    infra::{
        language::{self, Completion},
        Language,
    },
    Service,
};

use super::Command;

/// [`Command`] for rewriting a [`Text`] so it sounds human-written.
#[derive(Clone, Debug)]
pub struct HumanizeText {
    /// [`Text`] to rewrite.
    pub text: Text,

    /// Basic [`humanize::Options`].
    pub options: humanize::Options,

    /// [`humanize::Advanced`] options, if requested.
    pub advanced: Option<humanize::Advanced>,
}

/// Rewritten [`Text`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Humanized {
    /// Rewritten text.
    pub text: String,

    /// Indicator whether the rewrite was produced by [`humanize::fallback()`]
    /// instead of a language model.
    pub fallback: bool,
}

impl<Lang> Command<HumanizeText> for Service<Lang>
where
    Lang: Language<
        Perform<Completion>,
        Ok = String,
        Err = Traced<language::Error>,
    >,
{
    type Ok = Humanized;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: HumanizeText,
    ) -> Result<Self::Ok, Self::Err> {
        let HumanizeText {
            text,
            options,
            advanced,
        } = cmd;

        let (system, temperature) = match &advanced {
            Some(adv) => (
                humanize::advanced_prompt(&options, adv),
                adv.creativity.temperature(),
            ),
            None => (humanize::prompt(&options), humanize::TEMPERATURE),
        };
        let res = self
            .language()
            .execute(Perform(Completion {
                system,
                user: text.clone(),
                temperature,
                max_tokens: humanize::MAX_TOKENS,
            }))
            .await;

        match res {
            Ok(reply) => Ok(Humanized {
                text: reply.trim().to_owned(),
                fallback: false,
            }),
            Err(e)
                if advanced.is_none()
                    && self.config().fallback
                    && e.as_ref().is_unreachable() =>
            {
                log::warn!(
                    "language model unreachable, falling back: {}",
                    e.as_ref(),
                );
                Ok(Humanized {
                    text: humanize::fallback(text.as_str()),
                    fallback: true,
                })
            }
            Err(e) => {
                Err(e).map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
            }
        }
    }
}

/// Error of [`HumanizeText`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Language`] error.
    #[display("Failed to humanize text: {_0}")]
    Language(language::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Language(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::Handler as _;
    use secrecy::SecretString;

    use crate::{
        command::spec::{service, Recorder},
        domain::{
            text::humanize::{self, Creativity, Tone},
            Text,
        },
        error::{Categorize as _, Category},
        infra::language::{http, Http},
        Config, Service,
    };

    use super::HumanizeText;

    fn unreachable() -> Http {
        // Nothing listens on the discard port.
        let url = "http://127.0.0.1:9/".parse::<url::Url>().unwrap();
        Http::new(http::Config {
            completions_url: url.clone(),
            api_key: SecretString::from("key".to_owned()),
            model: "gpt-test".into(),
            grammar_url: url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_prompt_with_options() {
        let svc = service(Recorder::replying("  Hey there!  "));

        let out = svc
            .execute(HumanizeText {
                text: Text::new("Greetings.").unwrap(),
                options: humanize::Options {
                    tone: Tone::Friendly,
                    ..humanize::Options::default()
                },
                advanced: None,
            })
            .await
            .unwrap();

        assert_eq!(out.text, "Hey there!");
        assert!(!out.fallback);
        let req = svc.language().last().unwrap();
        assert!(req.system.contains("- Keep the tone: friendly"));
        assert!((req.temperature - humanize::TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, humanize::MAX_TOKENS);
        assert_eq!(req.user.as_str(), "Greetings.");
    }

    #[tokio::test]
    async fn advanced_uses_creativity_temperature() {
        let svc = service(Recorder::replying("ok"));

        _ = svc
            .execute(HumanizeText {
                text: Text::new("Greetings.").unwrap(),
                options: humanize::Options::default(),
                advanced: Some(humanize::Advanced {
                    creativity: Creativity::Creative,
                    ..humanize::Advanced::default()
                }),
            })
            .await
            .unwrap();

        let req = svc.language().last().unwrap();
        assert!((req.temperature - 0.9).abs() < f32::EPSILON);
        assert!(req.system.contains("- Target Audience: general"));
    }

    #[tokio::test]
    async fn falls_back_when_unreachable() {
        let svc = Service::new(Config { fallback: true }, unreachable());

        let out = svc
            .execute(HumanizeText {
                text: Text::new("However, we utilize it.").unwrap(),
                options: humanize::Options::default(),
                advanced: None,
            })
            .await
            .unwrap();

        assert!(out.fallback);
        assert_eq!(out.text, "But, we use it.");
    }

    #[tokio::test]
    async fn fails_when_fallback_disabled() {
        let svc = Service::new(Config { fallback: false }, unreachable());

        let err = svc
            .execute(HumanizeText {
                text: Text::new("However, we utilize it.").unwrap(),
                options: humanize::Options::default(),
                advanced: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Network);
    }
}
