use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Languages the bot speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    Uz,
}

impl Language {
    pub const ALL: [Self; 3] = [Self::Ru, Self::En, Self::Uz];

    /// Parse an ISO 639-1 code or an IETF tag such as `en-US`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "ru" => Some(Self::Ru),
            "en" => Some(Self::En),
            "uz" => Some(Self::Uz),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::En => "en",
            Self::Uz => "uz",
        }
    }

    /// Name of the language in itself, for the language picker.
    #[must_use]
    pub fn native_name(self) -> &'static str {
        match self {
            Self::Ru => "Русский",
            Self::En => "English",
            Self::Uz => "O'zbek",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unsupported language `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("ru", Some(Language::Ru))]
    #[case("EN", Some(Language::En))]
    #[case("en-US", Some(Language::En))]
    #[case("uz_Latn", Some(Language::Uz))]
    #[case("de", None)]
    #[case("", None)]
    fn parses_platform_language_codes(#[case] code: &str, #[case] expected: Option<Language>) {
        assert_eq!(Language::from_code(code), expected);
    }
}
