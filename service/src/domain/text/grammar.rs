//! Grammar [`Issue`] definitions.

use serde::{Deserialize, Serialize};

/// Language every grammar check is performed in.
pub const LANGUAGE: &str = "en-US";

/// Grammar or style problem found in a text.
///
/// Deserializes from a LanguageTool `match` object, ignoring fields not
/// listed here.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Full description of this [`Issue`].
    pub message: String,

    /// Short description of this [`Issue`], possibly empty.
    #[serde(default)]
    pub short_message: String,

    /// Offset of the problematic fragment in characters.
    pub offset: usize,

    /// Length of the problematic fragment in characters.
    pub length: usize,

    /// Surrounding [`Context`] of the problematic fragment.
    pub context: Context,

    /// [`Rule`] this [`Issue`] violates.
    pub rule: Rule,

    /// Suggested [`Replacement`]s, best first.
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

/// Excerpt of a text around an [`Issue`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Context {
    /// Excerpt itself.
    pub text: String,

    /// Offset of the problematic fragment inside the excerpt.
    pub offset: usize,

    /// Length of the problematic fragment inside the excerpt.
    pub length: usize,
}

/// Rule violated by an [`Issue`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// ID of this [`Rule`].
    pub id: String,

    /// Description of this [`Rule`].
    #[serde(default)]
    pub description: String,

    /// Type of problems this [`Rule`] detects, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,

    /// [`Category`] of this [`Rule`], if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Category of a [`Rule`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Category {
    /// ID of this [`Category`].
    pub id: String,

    /// Human-readable name of this [`Category`].
    pub name: String,
}

/// Suggested replacement of a problematic fragment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Replacement {
    /// Replacing text.
    pub value: String,
}
