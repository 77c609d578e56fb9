//! [`Command`] definition.

pub mod check_grammar;
pub mod detect_ai;
pub mod humanize_text;

/// [`Command`] of the [`Service`] or an [`Account`].
///
/// [`Account`]: crate::Account
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    check_grammar::CheckGrammar, detect_ai::DetectAi,
    humanize_text::HumanizeText,
};

#[cfg(test)]
pub(crate) mod spec {
    use std::sync::{Mutex, PoisonError};

    use common::operations::Perform;
    use tracerr::Traced;

    use crate::{
        domain::text::grammar,
        infra::{
            language::{self, Completion, GrammarCheck},
            Language,
        },
        Config, Service,
    };

    /// [`Language`] replying with a fixed text and recording requests.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        /// Reply to every [`Completion`].
        reply: String,

        /// Received [`Completion`]s.
        completions: Mutex<Vec<Completion>>,

        /// Received [`GrammarCheck`]s.
        checks: Mutex<Vec<GrammarCheck>>,
    }

    impl Recorder {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_owned(),
                ..Self::default()
            }
        }

        pub(crate) fn last(&self) -> Option<Completion> {
            self.completions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .cloned()
        }

        pub(crate) fn last_grammar(&self) -> Option<GrammarCheck> {
            self.checks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .cloned()
        }
    }

    impl Language<Perform<Completion>> for Recorder {
        type Ok = String;
        type Err = Traced<language::Error>;

        async fn execute(
            &self,
            Perform(req): Perform<Completion>,
        ) -> Result<Self::Ok, Self::Err> {
            self.completions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(req);
            Ok(self.reply.clone())
        }
    }

    impl Language<Perform<GrammarCheck>> for Recorder {
        type Ok = Vec<grammar::Issue>;
        type Err = Traced<language::Error>;

        async fn execute(
            &self,
            Perform(req): Perform<GrammarCheck>,
        ) -> Result<Self::Ok, Self::Err> {
            self.checks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(req);
            Ok(vec![grammar::Issue {
                message: "Did you mean \"There\"?".into(),
                short_message: String::new(),
                offset: 0,
                length: 5,
                context: grammar::Context {
                    text: "Their is a cat.".into(),
                    offset: 0,
                    length: 5,
                },
                rule: grammar::Rule {
                    id: "THEIR_IS".into(),
                    description: "their/there confusion".into(),
                    issue_type: None,
                    category: None,
                },
                replacements: vec![grammar::Replacement {
                    value: "There".into(),
                }],
            }])
        }
    }

    /// Creates a new [`Service`] over the provided [`Recorder`].
    pub(crate) fn service(language: Recorder) -> Service<Recorder> {
        Service::new(Config { fallback: true }, language)
    }
}
