//! [`Text`] definitions and statistics.

pub mod detection;
pub mod grammar;
pub mod humanize;

use derive_more::{AsRef, Display, Into};

/// Non-blank text submitted for processing.
#[derive(AsRef, Clone, Debug, Display, Eq, Into, PartialEq)]
#[as_ref(str)]
pub struct Text(String);

impl Text {
    /// Words read per minute, used to estimate [`reading_time()`].
    pub const WORDS_PER_MINUTE: usize = 200;

    /// Creates a new [`Text`] if the given `text` contains anything but
    /// whitespace.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Text`].
    fn check(text: impl AsRef<str>) -> bool {
        !text.as_ref().trim().is_empty()
    }

    /// Returns this [`Text`] as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number of words in this [`Text`].
    #[must_use]
    pub fn word_count(&self) -> usize {
        word_count(&self.0)
    }
}

/// Counts whitespace-separated words in the provided `text`.
///
/// Blank text has zero words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Counts characters in the provided `text`.
#[must_use]
pub fn character_count(text: &str) -> usize {
    text.chars().count()
}

/// Estimates reading time of the provided `text` in whole minutes, rounding
/// up.
#[must_use]
pub fn reading_time(text: &str) -> usize {
    word_count(text).div_ceil(Text::WORDS_PER_MINUTE)
}

#[cfg(test)]
mod spec {
    use super::{character_count, reading_time, word_count, Text};

    #[test]
    fn rejects_blank() {
        assert!(Text::new("").is_none());
        assert!(Text::new(" \n\t ").is_none());
        assert!(Text::new(" hi ").is_some());
    }

    #[test]
    fn counts_words() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  one two\n\nthree\tfour "), 4);
        assert_eq!(Text::new("a b c").unwrap().word_count(), 3);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(character_count("héllo"), 5);
        assert_eq!(character_count(""), 0);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(""), 0);
        assert_eq!(reading_time("word"), 1);
        assert_eq!(reading_time(&"word ".repeat(200)), 1);
        assert_eq!(reading_time(&"word ".repeat(201)), 2);
    }
}
