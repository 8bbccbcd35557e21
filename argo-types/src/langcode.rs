//! Language codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A language tag such as `en`, `de-DE` or `zh-hant`.
///
/// Two sentinels mark content that has no language: [`Langcode::NOT_SPECIFIED`]
/// (`und`) and [`Langcode::NOT_APPLICABLE`] (`zxx`). Such content cannot be
/// translated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Langcode(String);

impl Langcode {
    pub const NOT_SPECIFIED: &'static str = "und";
    pub const NOT_APPLICABLE: &'static str = "zxx";

    /// Parses a langcode. Accepts ASCII letters, digits, `-` and `_`,
    /// starting with a letter.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let valid = s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(TypesError::InvalidLangcode(s.to_string()))
        }
    }

    /// The `und` sentinel.
    #[must_use]
    pub fn not_specified() -> Self {
        Self(Self::NOT_SPECIFIED.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the `und` and `zxx` sentinels.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.0 == Self::NOT_SPECIFIED || self.0 == Self::NOT_APPLICABLE
    }
}

impl fmt::Display for Langcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Langcode {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Langcode {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Langcode> for String {
    fn from(value: Langcode) -> Self {
        value.0
    }
}

impl AsRef<str> for Langcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
