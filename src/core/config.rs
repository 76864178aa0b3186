/// Engine configuration, loaded from RON and passed in explicitly.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::language::Language;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("base language {0:?} is not among the configured languages")]
    UnknownBaseLanguage(String),
}

/// External translation provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub active: bool,
    /// Provider subscription key. Empty disables translation.
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            active: false,
            key: String::new(),
            endpoint: default_translation_endpoint(),
            region: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Dictionary/thesaurus reference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub dictionary_key: String,
    #[serde(default)]
    pub thesaurus_key: String,
    /// Requests allowed per endpoint over the client's lifetime.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            dictionary_key: String::new(),
            thesaurus_key: String::new(),
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_translation_endpoint() -> String {
    "https://api.cognitive.microsofttranslator.com".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_attempts() -> u32 {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// Language new words are registered in when none is given.
    pub base_language: String,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    /// Seed for synonym tie-breaking.
    #[serde(default)]
    pub seed: u64,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            base_language: "English".to_string(),
            languages: vec![Language::new("English", "en")],
            translation: TranslationConfig::default(),
            reference: ReferenceConfig::default(),
            seed: 0,
        }
    }
}

impl LexicalConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(ron_str: &str) -> Result<Self, ConfigError> {
        let config: LexicalConfig = ron::from_str(ron_str)?;
        if !config.languages.is_empty() && config.base().is_none() {
            return Err(ConfigError::UnknownBaseLanguage(config.base_language));
        }
        Ok(config)
    }

    pub fn language(&self, name: &str) -> Option<&Language> {
        self.languages
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn base(&self) -> Option<&Language> {
        self.language(&self.base_language)
    }

    /// Translation runs only when switched on and given a credential.
    pub fn translation_enabled(&self) -> bool {
        self.translation.active && !self.translation.key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = LexicalConfig::parse_ron(r#"(base_language: "English")"#).unwrap();
        assert_eq!(config.base_language, "English");
        assert!(config.languages.is_empty());
        assert_eq!(config.translation.timeout_ms, 5000);
        assert_eq!(config.reference.max_attempts, 1000);
        assert!(!config.translation_enabled());
    }

    #[test]
    fn translation_needs_active_and_key() {
        let mut config = LexicalConfig::default();
        config.translation.active = true;
        assert!(!config.translation_enabled());
        config.translation.key = "  ".to_string();
        assert!(!config.translation_enabled());
        config.translation.key = "abc123".to_string();
        assert!(config.translation_enabled());
        config.translation.active = false;
        assert!(!config.translation_enabled());
    }

    #[test]
    fn unknown_base_language_rejected() {
        let ron_str = r#"(
            base_language: "Klingon",
            languages: [(name: "English", code: "en")],
        )"#;
        assert!(matches!(
            LexicalConfig::parse_ron(ron_str),
            Err(ConfigError::UnknownBaseLanguage(_))
        ));
    }

    #[test]
    fn language_lookup_ignores_case() {
        let config = LexicalConfig::default();
        assert_eq!(config.language("english").map(|l| l.code.as_str()), Some("en"));
        assert!(config.language("Spanish").is_none());
        assert!(config.base().is_some());
    }

    #[test]
    fn load_fixture() {
        let path = std::path::PathBuf::from("tests/fixtures/lexical_config.ron");
        let config = LexicalConfig::load_from_ron(&path).unwrap();
        assert_eq!(config.base_language, "English");
        assert_eq!(config.languages.len(), 2);
        let spanish = config.language("Spanish").unwrap();
        assert!(spanish.precedent_punctuation);
        assert_eq!(config.seed, 42);
    }
}
