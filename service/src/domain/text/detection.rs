//! AI-likelihood detection definitions.

use derive_more::{Display, Into};
use serde::Serialize;

/// System prompt asking a language model to rate a text.
pub const PROMPT: &str = "Analyze the following text and rate how likely it \
    is to be AI-generated on a scale of 0-100. Consider factors like:\n\
    - Repetitive patterns\n\
    - Unnatural transitions\n\
    - Overly formal or robotic language\n\
    - Lack of personal voice\n\
    - Generic phrasing\n\n\
    Return only a number between 0-100, where 0 = definitely human, 100 = \
    definitely AI-generated.";

/// Sampling temperature of a detection request.
pub const TEMPERATURE: f32 = 0.3;

/// Maximum number of tokens a detection reply may contain.
pub const MAX_TOKENS: u32 = 10;

/// Likelihood of a text being AI-generated, in percent.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// [`Score`] assumed when a model reply cannot be understood.
    pub const UNKNOWN: Self = Self(50);

    /// Maximum [`Score`].
    pub const MAX: Self = Self(100);

    /// Creates a new [`Score`] clamping the provided `percent` to `0..=100`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "clamped to `0..=100`"
    )]
    #[must_use]
    pub fn clamped(percent: i64) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    /// Parses a [`Score`] from the leading integer of a model `reply`.
    ///
    /// Leading whitespace and a sign are allowed, anything after the digits
    /// is ignored. Falls back to [`Score::UNKNOWN`] if there are no digits.
    #[must_use]
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim_start();
        let (negative, rest) = match reply.as_bytes().first() {
            Some(b'-') => (true, &reply[1..]),
            Some(b'+') => (false, &reply[1..]),
            _ => (false, reply),
        };
        let digits = rest.len()
            - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return Self::UNKNOWN;
        }
        if negative {
            return Self(0);
        }
        rest[..digits]
            .parse::<i64>()
            .map_or(Self::MAX, Self::clamped)
    }

    /// Returns the complementary human-likelihood [`Score`].
    #[must_use]
    pub const fn inverse(self) -> Self {
        Self(100 - self.0)
    }

    /// Returns the [`Assessment`] of this [`Score`].
    #[must_use]
    pub const fn assessment(self) -> Assessment {
        match self.0 {
            0..30 => Assessment::LikelyHuman,
            30..60 => Assessment::Uncertain,
            _ => Assessment::LikelyAi,
        }
    }
}

/// Human-readable verdict on a [`Score`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum Assessment {
    /// Below 30%.
    #[display("Likely Human")]
    #[serde(rename = "Likely Human")]
    LikelyHuman,

    /// From 30% to 60%.
    #[display("Uncertain")]
    #[serde(rename = "Uncertain")]
    Uncertain,

    /// 60% and above.
    #[display("Likely AI")]
    #[serde(rename = "Likely AI")]
    LikelyAi,
}

/// Result of analyzing a text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Report {
    /// Likelihood of the text being AI-generated.
    pub ai_score: Score,

    /// Likelihood of the text being human-written.
    pub human_score: Score,

    /// Verdict on the [`Report::ai_score`].
    pub assessment: Assessment,
}

impl From<Score> for Report {
    fn from(ai_score: Score) -> Self {
        Self {
            ai_score,
            human_score: ai_score.inverse(),
            assessment: ai_score.assessment(),
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{Assessment, Report, Score};

    fn parse(s: &str) -> u8 {
        Score::parse(s).into()
    }

    #[test]
    fn parses_leading_integer() {
        assert_eq!(parse("85"), 85);
        assert_eq!(parse(" 42\n"), 42);
        assert_eq!(parse("73%"), 73);
        assert_eq!(parse("12 out of 100"), 12);
        assert_eq!(parse("+7"), 7);
        assert_eq!(parse("0"), 0);
    }

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(parse("250"), 100);
        assert_eq!(parse("99999999999999999999999"), 100);
        assert_eq!(parse("-20"), 0);
    }

    #[test]
    fn defaults_when_unparsable() {
        assert_eq!(parse(""), 50);
        assert_eq!(parse("Score: 85"), 50);
        assert_eq!(parse("high"), 50);
        assert_eq!(parse("-"), 50);
    }

    #[test]
    fn assessment_thresholds() {
        assert_eq!(Score::clamped(0).assessment(), Assessment::LikelyHuman);
        assert_eq!(Score::clamped(29).assessment(), Assessment::LikelyHuman);
        assert_eq!(Score::clamped(30).assessment(), Assessment::Uncertain);
        assert_eq!(Score::clamped(59).assessment(), Assessment::Uncertain);
        assert_eq!(Score::clamped(60).assessment(), Assessment::LikelyAi);
        assert_eq!(Score::clamped(100).assessment(), Assessment::LikelyAi);
    }

    #[test]
    fn report_complements_scores() {
        let report = Report::from(Score::clamped(72));

        assert_eq!(u8::from(report.human_score), 28);
        assert_eq!(report.assessment, Assessment::LikelyAi);
        assert_eq!(
            serde_json::to_value(report.assessment).unwrap(),
            "Likely AI",
        );
    }
}
