/// Orchestration: grammar tree in, finished prose out.
///
/// Registers unknown words, swaps in target-language synonyms, composes the
/// sentences and applies the language's finishing rules.

use log::{debug, warn};
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;

use crate::core::composer::NarrativeOptions;
use crate::core::config::{ConfigError, LexicalConfig};
use crate::core::dictionary::{Dictionary, DictionaryError};
use crate::core::lexica::Lexica;
use crate::core::store::{MemoryStore, RonStore, StoreError, WordStore};
use crate::core::thesaurus::{LexicalContext, Thesaurus};
use crate::core::translator::{DisabledTranslator, HttpTranslator, Translator};
use crate::schema::dictata::Dictata;
use crate::schema::language::Language;

#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The top-level rendering engine. Built via `Narrator::builder()`.
pub struct Narrator {
    config: LexicalConfig,
    dictionary: Dictionary,
    thesaurus: Thesaurus,
}

/// Builder for constructing a `Narrator`.
#[derive(Default)]
pub struct NarratorBuilder {
    config: Option<LexicalConfig>,
    config_path: Option<String>,
    store: Option<Box<dyn WordStore>>,
    dictionary_dir: Option<String>,
    translator: Option<Box<dyn Translator>>,
    seed: Option<u64>,
}

/// Map verbosity (0-100) onto the elegance register (-5..=5).
fn elegance_for(verbosity: u8) -> i32 {
    (i32::from(verbosity.min(100)) - 50) / 10
}

impl Narrator {
    pub fn builder() -> NarratorBuilder {
        NarratorBuilder::default()
    }

    pub fn config(&self) -> &LexicalConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn thesaurus(&self) -> &Thesaurus {
        &self.thesaurus
    }

    /// Render `tree` as prose in `language` (the base language when `None`).
    ///
    /// Never fails: unknown words render literally, and translation problems
    /// leave the base-language phrase in place.
    pub fn narrate(&self, tree: &Lexica, options: &NarrativeOptions, language: Option<&str>) -> String {
        self.verify(tree);

        let base = self.config.base_language.as_str();
        let target = language.unwrap_or(base);
        let target_language = match self.config.language(target) {
            Some(lang) => lang.clone(),
            None => {
                if !target.eq_ignore_ascii_case(base) {
                    debug!("language {:?} is not configured; narrating in {}", target, base);
                }
                self.config
                    .base()
                    .cloned()
                    .unwrap_or_else(|| Language::new(base, ""))
            }
        };

        let punctuate = |kind, sentence: &str| target_language.punctuate(kind, sentence);
        let text = if target_language.name.eq_ignore_ascii_case(base) {
            tree.describe_with(options, &punctuate)
        } else {
            // Translate each planned fragment, so planner-added words are covered.
            tree.describe_mapped(
                options,
                &|fragment| {
                    self.verify(fragment);
                    Cow::Owned(self.translate_tree(fragment, options, &target_language.name))
                },
                &punctuate,
            )
        };
        target_language.finish(&text)
    }

    /// Register every word in the tree that the dictionary does not know yet.
    fn verify(&self, tree: &Lexica) {
        tree.walk(&mut |node| {
            if node.is_silent() || node.get_dictata(&self.dictionary).is_some() {
                return;
            }
            let word = Dictata::new(&self.config.base_language, node.lexical_type, &node.phrase);
            match self.dictionary.add_form(word) {
                Ok(stored) => debug!("registered unknown word {}", stored.key()),
                Err(e) => warn!("could not register {:?}: {}", node.phrase, e),
            }
        });
    }

    fn translate_tree(&self, tree: &Lexica, options: &NarrativeOptions, language: &str) -> Lexica {
        let mut translated = tree.clone();
        translated.walk_mut(&mut |node| {
            if node.is_silent() {
                return;
            }
            let Some(word) = node.get_dictata(&self.dictionary) else {
                return;
            };
            let mut context = LexicalContext::from_dictata(&word, language);
            context.tense = options.tense;
            context.perspective = options.perspective;
            context.elegance = elegance_for(options.verbosity);

            if let Cow::Owned(synonym) = self.thesaurus.get_synonym(&self.dictionary, &word, &context) {
                node.phrase = synonym.phrase;
            }
        });
        translated
    }

    /// Fill every other UI language for every base-language lexeme.
    pub fn fill_languages(&self) -> usize {
        self.dictionary
            .lexemes()
            .iter()
            .filter(|l| l.language == self.config.base_language)
            .map(|l| self.thesaurus.fill_languages(&self.dictionary, l))
            .sum()
    }
}

impl NarratorBuilder {
    pub fn config(mut self, config: LexicalConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Persist word forms under this directory (one RON file per lexeme).
    pub fn dictionary_dir(mut self, path: &str) -> Self {
        self.dictionary_dir = Some(path.to_string());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide a store directly (for testing without files).
    pub fn with_store(mut self, store: Box<dyn WordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Provide a translator directly (for testing without a network).
    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn build(self) -> Result<Narrator, NarratorError> {
        let mut config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => LexicalConfig::load_from_ron(Path::new(path))?,
            (None, None) => LexicalConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        let store: Box<dyn WordStore> = match (self.store, &self.dictionary_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Box::new(RonStore::open(dir)?),
            (None, None) => Box::new(MemoryStore::new()),
        };

        let translator: Box<dyn Translator> = match self.translator {
            Some(translator) => translator,
            None if config.translation_enabled() => match HttpTranslator::new(&config.translation) {
                Ok(http) => Box::new(http),
                Err(e) => {
                    warn!("translation disabled, client setup failed: {}", e);
                    Box::new(DisabledTranslator)
                }
            },
            None => Box::new(DisabledTranslator),
        };

        let dictionary = Dictionary::open(&config.base_language, store)?;
        let thesaurus = Thesaurus::new(config.clone(), translator);

        Ok(Narrator {
            config,
            dictionary,
            thesaurus,
        })
    }
}
