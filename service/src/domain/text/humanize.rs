//! Humanization options, prompts and the rule-based fallback.

use std::{fmt::Write as _, sync::LazyLock};

use common::define_kind;
use derive_more::{AsRef, Display};
use regex::{Captures, Regex};
use serde::Serialize;

define_kind! {
    #[doc = "Tone of a humanized text."]
    enum Tone {
        #[doc = "No particular emotional coloring."]
        Neutral = 1,

        #[doc = "Warm and approachable."]
        Friendly = 2,

        #[doc = "Reserved and official."]
        Formal = 3,

        #[doc = "Energetic and excited."]
        Enthusiastic = 4,

        #[doc = "Assertive and self-assured."]
        Confident = 5,
    }
}

define_kind! {
    #[doc = "Writing style of a humanized text."]
    enum Style {
        #[doc = "Business-like writing."]
        Professional = 1,

        #[doc = "Everyday conversational writing."]
        Casual = 2,

        #[doc = "Scholarly writing."]
        Academic = 3,

        #[doc = "Expressive, literary writing."]
        Creative = 4,

        #[doc = "Precise, domain-specific writing."]
        Technical = 5,
    }
}

define_kind! {
    #[doc = "Desired length of a humanized text relative to the original."]
    enum Length {
        #[doc = "Keep roughly the same length."]
        Maintain = 1,

        #[doc = "Make it more concise."]
        Shorter = 2,

        #[doc = "Expand with more detail."]
        Longer = 3,
    }
}

define_kind! {
    #[doc = "How freely a text may be rewritten."]
    enum Creativity {
        #[doc = "Stay close to the original wording."]
        Conservative = 1,

        #[doc = "Moderate rewording."]
        Balanced = 2,

        #[doc = "Free rewording."]
        Creative = 3,
    }
}

impl Default for Tone {
    fn default() -> Self {
        Self::Neutral
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::Professional
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::Maintain
    }
}

impl Default for Creativity {
    fn default() -> Self {
        Self::Balanced
    }
}

impl Length {
    /// Returns the prompt instruction for this [`Length`].
    #[must_use]
    pub const fn instruction(self) -> &'static str {
        match self {
            Self::Maintain => "Maintain similar length",
            Self::Shorter => "Make it more concise",
            Self::Longer => "Expand with more detail",
        }
    }
}

impl Creativity {
    /// Returns the sampling temperature matching this [`Creativity`].
    #[must_use]
    pub const fn temperature(self) -> f32 {
        match self {
            Self::Conservative => 0.5,
            Self::Balanced => 0.7,
            Self::Creative => 0.9,
        }
    }
}

/// Free-form description of the intended readers of a text.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[serde(transparent)]
pub struct Audience(String);

impl Audience {
    /// Maximum length of an [`Audience`] in characters.
    pub const MAX_LENGTH: usize = 200;

    /// Creates a new [`Audience`] if the given `audience` is valid.
    #[must_use]
    pub fn new(audience: impl Into<String>) -> Option<Self> {
        let audience = audience.into();
        Self::check(&audience).then_some(Self(audience))
    }

    /// Checks whether the given `audience` is a valid [`Audience`].
    fn check(audience: impl AsRef<str>) -> bool {
        let audience = audience.as_ref();
        audience.trim() == audience
            && !audience.is_empty()
            && audience.chars().count() <= Self::MAX_LENGTH
    }
}

impl Default for Audience {
    fn default() -> Self {
        Self("general".into())
    }
}

impl std::str::FromStr for Audience {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Audience`")
    }
}

/// Basic humanization options.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Options {
    /// [`Tone`] to keep.
    pub tone: Tone,

    /// [`Style`] to keep.
    pub style: Style,

    /// Desired [`Length`].
    pub length: Length,
}

/// Additional options of an advanced humanization.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Advanced {
    /// Intended [`Audience`].
    pub audience: Audience,

    /// Allowed [`Creativity`].
    pub creativity: Creativity,
}

/// Sampling temperature of a basic humanization.
pub const TEMPERATURE: f32 = 0.7;

/// Maximum number of tokens a humanization may produce.
pub const MAX_TOKENS: u32 = 4000;

/// Builds the system prompt of a basic humanization.
#[must_use]
pub fn prompt(opts: &Options) -> String {
    let Options {
        tone,
        style,
        length,
    } = opts;

    let mut p = String::from(
        "You are an expert AI humanizer. Your task is to rewrite the given \
         text to make it sound more human and natural while preserving the \
         original meaning and intent.\n\n\
         Guidelines:\n\
         - Maintain the original message and key points\n\
         - Use natural, conversational language\n\
         - Avoid repetitive or robotic patterns\n\
         - Add appropriate transitions and flow\n",
    );
    // Writing into a `String` never fails.
    _ = writeln!(p, "- Keep the tone: {tone}");
    _ = writeln!(p, "- Maintain writing style: {style}");
    _ = writeln!(p, "- {}", length.instruction());
    p.push_str(
        "\nImportant: Focus on making the text sound genuinely \
         human-written, not AI-generated.",
    );
    p
}

/// Builds the system prompt of an advanced humanization.
#[must_use]
pub fn advanced_prompt(opts: &Options, advanced: &Advanced) -> String {
    let Options {
        tone,
        style,
        length,
    } = opts;
    let Advanced {
        audience,
        creativity,
    } = advanced;

    let mut p = String::from(
        "You are an expert AI humanizer specializing in making AI-generated \
         text sound natural and human-written.\n\n\
         TASK: Rewrite the given text to sound more human while preserving \
         the original meaning.\n\n\
         STYLE GUIDELINES:\n",
    );
    _ = writeln!(p, "- Tone: {tone}");
    _ = writeln!(p, "- Writing Style: {style}");
    _ = writeln!(p, "- Target Audience: {audience}");
    _ = writeln!(p, "- Length: {}", length.instruction());
    _ = writeln!(p, "- Creativity Level: {creativity}");
    p.push_str(
        "\nTECHNIQUES TO USE:\n\
         - Add natural transitions and flow\n\
         - Use varied sentence structures\n\
         - Include appropriate contractions and informal language where \
         suitable\n\
         - Avoid repetitive patterns\n\
         - Add personality and voice\n\
         - Make it sound conversational and engaging\n\n\
         IMPORTANT: The goal is to make the text sound genuinely \
         human-written, not AI-generated.",
    );
    p
}

/// Casual connectives substituted for formal ones by [`fallback()`], in
/// rotation order.
pub const CONNECTIVES: [&str; 5] =
    ["But", "Also", "Plus", "What's more", "On top of that"];

/// Rewrites the provided `text` with simple word substitutions, for when no
/// language model is reachable.
///
/// Formal connectives are replaced with [`CONNECTIVES`] in rotation, so the
/// result is deterministic.
#[must_use]
pub fn fallback(text: &str) -> String {
    static CONNECTIVE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\b(?:however|moreover|furthermore|additionally)\b")
            .expect("valid regex")
    });
    static UTILIZE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\butiliz(?:e|es|ed)\b").expect("valid regex")
    });
    static COMMENCE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\bcommenc(?:e|es|ed)\b").expect("valid regex")
    });

    let mut n = 0;
    let text = CONNECTIVE.replace_all(text, |_: &Captures<'_>| {
        let alt = CONNECTIVES[n % CONNECTIVES.len()];
        n += 1;
        alt
    });
    let text = UTILIZE.replace_all(&text, "use");
    COMMENCE.replace_all(&text, "start").into_owned()
}

#[cfg(test)]
mod spec {
    use super::{
        advanced_prompt, fallback, prompt, Advanced, Audience, Creativity,
        Length, Options, Style, Tone,
    };

    #[test]
    fn defaults() {
        assert_eq!(
            Options::default(),
            Options {
                tone: Tone::Neutral,
                style: Style::Professional,
                length: Length::Maintain,
            },
        );
        assert_eq!(Audience::default().as_ref(), "general");
        assert_eq!(Advanced::default().creativity, Creativity::Balanced);
    }

    #[test]
    fn parses_closed_options() {
        assert_eq!("enthusiastic".parse::<Tone>(), Ok(Tone::Enthusiastic));
        assert_eq!("technical".parse::<Style>(), Ok(Style::Technical));
        assert_eq!("shorter".parse::<Length>(), Ok(Length::Shorter));
        assert!("business".parse::<Style>().is_err());
        assert!("sarcastic".parse::<Tone>().is_err());
    }

    #[test]
    fn creativity_sets_temperature() {
        assert!((Creativity::Conservative.temperature() - 0.5).abs() < 1e-6);
        assert!((Creativity::Balanced.temperature() - 0.7).abs() < 1e-6);
        assert!((Creativity::Creative.temperature() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn prompt_embeds_options() {
        let p = prompt(&Options {
            tone: Tone::Friendly,
            style: Style::Casual,
            length: Length::Longer,
        });

        assert!(p.contains("- Keep the tone: friendly\n"));
        assert!(p.contains("- Maintain writing style: casual\n"));
        assert!(p.contains("- Expand with more detail\n"));
    }

    #[test]
    fn advanced_prompt_embeds_audience() {
        let p = advanced_prompt(
            &Options::default(),
            &Advanced {
                audience: Audience::new("high school students").unwrap(),
                creativity: Creativity::Creative,
            },
        );

        assert!(p.contains("- Target Audience: high school students\n"));
        assert!(p.contains("- Creativity Level: creative\n"));
        assert!(p.contains("- Length: Maintain similar length\n"));
    }

    #[test]
    fn audience_is_bounded() {
        assert!(Audience::new("").is_none());
        assert!(Audience::new(" kids").is_none());
        assert!(Audience::new("x".repeat(Audience::MAX_LENGTH + 1)).is_none());
    }

    #[test]
    fn fallback_rotates_connectives() {
        assert_eq!(
            fallback(
                "However, it works. Moreover, it scales. FURTHERMORE it is \
                 cheap. Additionally, fast. however, done. Moreover, again.",
            ),
            "But, it works. Also, it scales. Plus it is cheap. What's more, \
             fast. On top of that, done. But, again.",
        );
    }

    #[test]
    fn fallback_simplifies_verbs() {
        assert_eq!(
            fallback("We utilize tools. She utilized it. Utilizes? Commenced."),
            "We use tools. She use it. use? start.",
        );
        assert_eq!(
            fallback("commences the utilization"),
            "start the utilization",
        );
    }

    #[test]
    fn fallback_keeps_other_text() {
        assert_eq!(
            fallback("Nothing to change here."),
            "Nothing to change here.",
        );
        assert_eq!(fallback("Howevers"), "Howevers");
    }
}
