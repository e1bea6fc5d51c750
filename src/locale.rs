//! The fixed language set of CV dialog resources and the locales built on it.
//!
//! A dialog is localized into exactly three languages. The extra [`Locale::Any`]
//! names the shared master resource that linked languages fall back to.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// One of the three languages a dialog is localized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    German,
    Japanese,
}

impl Language {
    /// Every supported language, in guard-chain order.
    pub const ALL: [Language; 3] = [Language::English, Language::German, Language::Japanese];

    /// The preprocessor macro guarding this language's string file.
    pub fn macro_name(self) -> &'static str {
        match self {
            Language::English => "RES_US",
            Language::German => "RES_GERMAN",
            Language::Japanese => "RES_JAPAN",
        }
    }

    pub fn from_macro_name(name: &str) -> Option<Language> {
        Language::ALL
            .into_iter()
            .find(|language| language.macro_name() == name)
    }

    /// BCP 47 tag used in CSV headers and JSON caches.
    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::German => "de-DE",
            Language::Japanese => "ja-JP",
        }
    }

    pub fn language_identifier(self) -> LanguageIdentifier {
        // The tags above are static and well-formed.
        self.tag()
            .parse()
            .unwrap_or_else(|_| LanguageIdentifier::default())
    }

    /// Encoding label string files of this language are stored in when the
    /// caller does not say otherwise.
    pub fn default_encoding(self) -> &'static str {
        match self {
            Language::English | Language::German => "windows-1252",
            Language::Japanese => "shift_jis",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Accepts the short codes used on the command line (`us`, `de`, `jp`), the
/// English names, or any language identifier whose primary subtag is `en`,
/// `de` or `ja`.
impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" | "english" => return Ok(Language::English),
            "german" => return Ok(Language::German),
            "jp" | "japanese" => return Ok(Language::Japanese),
            _ => {}
        }

        let identifier: LanguageIdentifier = s
            .parse()
            .map_err(|_| Error::invalid_resource(format!("unknown language `{}`", s)))?;
        match identifier.language.as_str() {
            "en" => Ok(Language::English),
            "de" => Ok(Language::German),
            "ja" => Ok(Language::Japanese),
            _ => Err(Error::invalid_resource(format!(
                "unsupported language `{}`",
                s
            ))),
        }
    }
}

/// Either the master locale or one specific language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    Any,
    English,
    German,
    Japanese,
}

impl Locale {
    /// The master locale first, then every language locale.
    pub const ALL: [Locale; 4] = [
        Locale::Any,
        Locale::English,
        Locale::German,
        Locale::Japanese,
    ];

    pub fn language(self) -> Option<Language> {
        match self {
            Locale::Any => None,
            Locale::English => Some(Language::English),
            Locale::German => Some(Language::German),
            Locale::Japanese => Some(Language::Japanese),
        }
    }

    pub fn is_master(self) -> bool {
        self == Locale::Any
    }

    /// Iterates over the language locales, master excluded.
    pub fn languages() -> impl Iterator<Item = Locale> {
        Language::ALL.into_iter().map(Locale::from)
    }
}

impl From<Language> for Locale {
    fn from(language: Language) -> Self {
        match language {
            Language::English => Locale::English,
            Language::German => Locale::German,
            Language::Japanese => Locale::Japanese,
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.language() {
            Some(language) => write!(f, "{}", language),
            None => write!(f, "any"),
        }
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" | "master" => Ok(Locale::Any),
            _ => s.parse::<Language>().map(Locale::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_names_roundtrip() {
        for language in Language::ALL {
            assert_eq!(Language::from_macro_name(language.macro_name()), Some(language));
        }
        assert_eq!(Language::from_macro_name("RES_FRENCH"), None);
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("us".parse::<Language>().unwrap(), Language::English);
        assert_eq!("de".parse::<Language>().unwrap(), Language::German);
        assert_eq!("ja-JP".parse::<Language>().unwrap(), Language::Japanese);
        assert_eq!("JP".parse::<Language>().unwrap(), Language::Japanese);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("any".parse::<Locale>().unwrap(), Locale::Any);
        assert_eq!("master".parse::<Locale>().unwrap(), Locale::Any);
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::English);
    }

    #[test]
    fn test_locale_language() {
        assert_eq!(Locale::Any.language(), None);
        assert_eq!(Locale::German.language(), Some(Language::German));
        assert_eq!(Locale::languages().count(), 3);
        assert!(Locale::languages().all(|locale| !locale.is_master()));
    }

    #[test]
    fn test_language_identifier() {
        let identifier = Language::Japanese.language_identifier();
        assert_eq!(identifier.language.as_str(), "ja");
        assert_eq!(Locale::English.to_string(), "en-US");
        assert_eq!(Locale::Any.to_string(), "any");
    }
}
