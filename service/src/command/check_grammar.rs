//! [`Command`] for checking grammar of a [`Text`].

use common::operations::Perform;
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{text::grammar, Text},
    error::{Categorize, Category},
    infra::{
        language::{self, GrammarCheck},
        Language,
    },
    Service,
};

use super::Command;

/// [`Command`] for checking grammar of a [`Text`].
#[derive(Clone, Debug, From)]
pub struct CheckGrammar(pub Text);

impl<Lang> Command<CheckGrammar> for Service<Lang>
where
    Lang: Language<
        Perform<GrammarCheck>,
        Ok = Vec<grammar::Issue>,
        Err = Traced<language::Error>,
    >,
{
    type Ok = Vec<grammar::Issue>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        CheckGrammar(text): CheckGrammar,
    ) -> Result<Self::Ok, Self::Err> {
        self.language()
            .execute(Perform(GrammarCheck {
                text,
                language: grammar::LANGUAGE,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
    }
}

/// Error of [`CheckGrammar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Language`] error.
    #[display("Failed to check grammar: {_0}")]
    Language(language::Error),
}

impl Categorize for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Language(e) => e.category(),
        }
    }
}
