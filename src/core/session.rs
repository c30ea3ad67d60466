//! Per-caller context: who is acting and which language they prefer.
//!
//! A `Session` is built explicitly from the identity provider's actor id and
//! whatever language preference the caller persisted. Nothing here touches
//! process-wide state; persisting a changed preference is left to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::core::errors::SantaError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn parse(value: &str) -> Option<Language> {
        match value.trim().to_ascii_lowercase().as_str() {
            "es" => Some(Language::Es),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Reads the primary subtag of a locale such as `en-US` or `es_ES.UTF-8`.
    pub fn from_locale(locale: &str) -> Option<Language> {
        locale
            .split(|c| c == '-' || c == '_' || c == '.' || c == ',' || c == ';')
            .next()
            .and_then(Language::parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Session {
    actor: Option<String>,
    language: Language,
}

impl Session {
    /// Persisted preference wins, then the environment locale, then `default`.
    pub fn initialize(
        actor: Option<String>,
        persisted: Option<&str>,
        environment_locale: Option<&str>,
        default: Language,
    ) -> Self {
        let language = persisted
            .and_then(Language::parse)
            .or_else(|| environment_locale.and_then(Language::from_locale))
            .unwrap_or(default);
        Session {
            actor: actor.filter(|a| !a.trim().is_empty()),
            language,
        }
    }

    pub fn actor(&self) -> Result<&str, SantaError> {
        self.actor.as_deref().ok_or(SantaError::MissingActor)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switches language and returns the value the caller should persist.
    pub fn set_language(&mut self, language: Language) -> &'static str {
        self.language = language;
        language.as_str()
    }
}
