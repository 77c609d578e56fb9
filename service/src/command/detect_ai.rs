//! [`Command`] for estimating whether a [`Text`] is AI-generated.

use common::operations::Perform;
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        text::detection::{self, Report, Score},
        Text,
    },
    error::{Categorize, Category},
    infra::{
        language::{self, Completion},
        Language,
    },
    Service,
};

use super::Command;

/// [`Command`] for estimating whether a [`Text`] is AI-generated.
#[derive(Clone, Debug, From)]
pub struct DetectAi(pub Text);

impl<Lang> Command<DetectAi> for Service<Lang>
where
    Lang: Language<
        Perform<Completion>,
        Ok = String,
        Err = Traced<language::Error>,
    >,
{
    type Ok = Report;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DetectAi(text): DetectAi,
    ) -> Result<Self::Ok, Self::Err> {
        let reply = self
            .language()
            .execute(Perform(Completion {
                system: detection::PROMPT.to_owned(),
                user: text,
                temperature: detection::TEMPERATURE,
                max_tokens: detection::MAX_TOKENS,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        Ok(Score::parse(&reply).into())
    }
}

/// Error of [`DetectAi`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Language`] error.
    #[display("Failed to analyze text: {_0}")]
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
    use common::Handler as _;

    use crate::{
        command::spec::{service, Recorder},
        domain::{
            text::detection::{self, Assessment},
            Text,
        },
    };

    use super::DetectAi;

    #[tokio::test]
    async fn parses_model_reply() {
        let svc = service(Recorder::replying("85% likely"));

        let report = svc
            .execute(DetectAi(Text::new("Sample.").unwrap()))
            .await
            .unwrap();

        assert_eq!(u8::from(report.ai_score), 85);
        assert_eq!(u8::from(report.human_score), 15);
        assert_eq!(report.assessment, Assessment::LikelyAi);
        let req = svc.language().last().unwrap();
        assert_eq!(req.system, detection::PROMPT);
        assert_eq!(req.max_tokens, detection::MAX_TOKENS);
    }

    #[tokio::test]
    async fn unparsable_reply_is_uncertain() {
        let svc = service(Recorder::replying("I cannot tell."));

        let report = svc
            .execute(DetectAi(Text::new("Sample.").unwrap()))
            .await
            .unwrap();

        assert_eq!(u8::from(report.ai_score), 50);
        assert_eq!(report.assessment, Assessment::Uncertain);
    }
}
