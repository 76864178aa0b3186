/// Synonym and translation resolution.
///
/// Picks the registered synonym that best fits a lexical context, and falls
/// back to machine translation (recording the result as a new form) when
/// none exists and translation is permitted.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use std::borrow::Cow;
use std::sync::{Mutex, PoisonError};

use crate::core::config::LexicalConfig;
use crate::core::dictionary::Dictionary;
use crate::core::translator::Translator;
use crate::schema::dictata::{Dictata, Relation};
use crate::schema::language::Language;
use crate::schema::lexeme::Lexeme;
use crate::schema::lexical::{LexicalTense, LexicalType, NarrativePerspective};

/// What a replacement word should look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalContext {
    /// Target language name.
    pub language: String,
    pub tense: LexicalTense,
    pub perspective: NarrativePerspective,
    pub positional: bool,
    pub determinant: bool,
    pub plural: bool,
    pub possessive: bool,
    pub feminine: bool,
    pub semantics: FxHashSet<String>,
    pub quality: i32,
    pub severity: i32,
    pub elegance: i32,
}

impl LexicalContext {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            tense: LexicalTense::None,
            perspective: NarrativePerspective::None,
            positional: false,
            determinant: false,
            plural: false,
            possessive: false,
            feminine: false,
            semantics: FxHashSet::default(),
            quality: 0,
            severity: 0,
            elegance: 0,
        }
    }

    /// A context asking for a word just like `word`, in `language`.
    pub fn from_dictata(word: &Dictata, language: &str) -> Self {
        Self {
            language: language.to_string(),
            tense: word.tense,
            perspective: word.perspective,
            positional: word.positional,
            determinant: word.determinant,
            plural: word.plural,
            possessive: word.possessive,
            feminine: word.feminine,
            semantics: word.semantics.clone(),
            quality: word.quality,
            severity: word.severity,
            elegance: word.elegance,
        }
    }
}

/// How well `candidate` fits `context`. Higher is better.
pub fn fitness(candidate: &Dictata, context: &LexicalContext) -> i64 {
    let mut score: i64 = 0;

    if !context.semantics.is_empty() && candidate.has_semantics(&context.semantics) {
        score += 100;
    } else {
        let shared = context
            .semantics
            .iter()
            .filter(|tag| candidate.semantics.contains(*tag))
            .count();
        score += 10 * shared as i64;
    }

    let matches = [
        candidate.tense == context.tense,
        candidate.perspective == context.perspective,
        candidate.positional == context.positional,
        candidate.determinant == context.determinant,
        candidate.plural == context.plural,
        candidate.possessive == context.possessive,
        candidate.feminine == context.feminine,
    ];
    score += 5 * matches.iter().filter(|m| **m).count() as i64;

    score -= i64::from((candidate.quality - context.quality).abs());
    score -= i64::from((candidate.severity - context.severity).abs());
    score -= i64::from((candidate.elegance - context.elegance).abs());
    score
}

pub struct Thesaurus {
    config: LexicalConfig,
    translator: Box<dyn Translator>,
    rng: Mutex<StdRng>,
}

impl Thesaurus {
    pub fn new(config: LexicalConfig, translator: Box<dyn Translator>) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            translator,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &LexicalConfig {
        &self.config
    }

    /// The best replacement for `word` in `context`.
    ///
    /// Returns `Cow::Borrowed(word)` when nothing better exists, so callers
    /// can detect the fallback with `std::ptr::eq` or by matching the variant.
    pub fn get_synonym<'a>(
        &self,
        dictionary: &Dictionary,
        word: &'a Dictata,
        context: &LexicalContext,
    ) -> Cow<'a, Dictata> {
        if let Some(best) = self.best_synonym(dictionary, word, context) {
            return Cow::Owned(best);
        }

        match self.translation_languages(word, &context.language) {
            Some((source, target)) => match self.translate(dictionary, word, source, target) {
                Some(translated) => Cow::Owned(translated),
                None => Cow::Borrowed(word),
            },
            None => Cow::Borrowed(word),
        }
    }

    fn best_synonym(
        &self,
        dictionary: &Dictionary,
        word: &Dictata,
        context: &LexicalContext,
    ) -> Option<Dictata> {
        let candidates: Vec<Dictata> = word
            .synonyms
            .iter()
            .filter(|k| k.lexical_type == word.lexical_type && k.language == context.language)
            .filter_map(|k| dictionary.get_dictata(k))
            .collect();

        let top = candidates.iter().map(|c| fitness(c, context)).max()?;
        let best: Vec<&Dictata> = candidates
            .iter()
            .filter(|c| fitness(c, context) == top)
            .collect();

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        best.choose(&mut *rng).map(|d| (*d).clone())
    }

    /// Source and target languages, when translating `word` into `target` is allowed.
    fn translation_languages(&self, word: &Dictata, target: &str) -> Option<(&Language, &Language)> {
        if word.language.eq_ignore_ascii_case(target) {
            return None;
        }
        if !self.config.translation_enabled() {
            return None;
        }
        if word.lexical_type == LexicalType::ProperNoun {
            return None;
        }
        if !word.language.eq_ignore_ascii_case(&self.config.base_language) {
            return None;
        }

        let source = self.config.language(&word.language)?;
        if !source.ui_only || !source.suitable_for_use {
            return None;
        }
        let target = self.config.language(target)?;
        if !target.suitable_for_use {
            return None;
        }
        Some((source, target))
    }

    fn translate(
        &self,
        dictionary: &Dictionary,
        word: &Dictata,
        source: &Language,
        target: &Language,
    ) -> Option<Dictata> {
        let text = match self.translator.translate(&word.phrase, &source.code, &target.code) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("no translation for {:?} into {}", word.phrase, target.name);
                return None;
            }
            Err(e) => {
                warn!("translation of {:?} into {} failed: {}", word.phrase, target.name, e);
                return None;
            }
        };

        let mut form = Dictata::new(&target.name, word.lexical_type, &text);
        form.inherit_attributes(word);
        let stored = match dictionary.add_form(form) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("could not store translation {:?}: {}", text, e);
                return None;
            }
        };

        if let Err(e) = dictionary.relate(&word.key(), &stored.key(), Relation::Synonym) {
            warn!("could not link {} to translation {}: {}", word.key(), stored.key(), e);
        }
        Some(dictionary.get_dictata(&stored.key()).unwrap_or(stored))
    }

    /// Resolve every form of a base-language lexeme into each other usable
    /// UI language, translating where no synonym exists yet.
    ///
    /// Returns how many (form, language) pairs now have a counterpart.
    pub fn fill_languages(&self, dictionary: &Dictionary, lexeme: &Lexeme) -> usize {
        if lexeme.has_proper_noun()
            || !lexeme.language.eq_ignore_ascii_case(&self.config.base_language)
        {
            return 0;
        }

        let mut resolved = 0;
        for language in &self.config.languages {
            if language.name.eq_ignore_ascii_case(&lexeme.language)
                || !language.ui_only
                || !language.suitable_for_use
            {
                continue;
            }
            for form in &lexeme.word_forms {
                let current = dictionary.get_dictata(&form.key()).unwrap_or_else(|| form.clone());
                let context = LexicalContext::from_dictata(&current, &language.name);
                if let Cow::Owned(_) = self.get_synonym(dictionary, &current, &context) {
                    resolved += 1;
                }
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::translator::{DisabledTranslator, TranslationError};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CannedTranslator {
        answers: HashMap<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl Translator for CannedTranslator {
        fn translate(&self, phrase: &str, _from: &str, _to: &str) -> Result<Option<String>, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answers.get(phrase).cloned())
        }
    }

    struct FailingTranslator;

    impl Translator for FailingTranslator {
        fn translate(&self, _phrase: &str, _from: &str, _to: &str) -> Result<Option<String>, TranslationError> {
            Err(TranslationError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
        }
    }

    fn make_config() -> LexicalConfig {
        let mut config = LexicalConfig::default();
        config.languages.push(Language::new("Spanish", "es"));
        config.translation.active = true;
        config.translation.key = "test-key".to_string();
        config
    }

    fn make_canned(calls: Arc<AtomicUsize>) -> Box<dyn Translator> {
        let mut answers = HashMap::new();
        answers.insert("sword".to_string(), "espada".to_string());
        answers.insert("shield".to_string(), "escudo".to_string());
        Box::new(CannedTranslator { answers, calls })
    }

    fn make_noun(phrase: &str, tags: &[&str]) -> Dictata {
        Dictata::new("English", LexicalType::Noun, phrase).with_semantics(tags)
    }

    #[test]
    fn fallback_is_the_same_reference() {
        let dict = Dictionary::in_memory("English");
        let thesaurus = Thesaurus::new(LexicalConfig::default(), Box::new(DisabledTranslator));
        let sword = dict.add_form(make_noun("sword", &["weapon"])).unwrap();

        let context = LexicalContext::from_dictata(&sword, "English");
        let result = thesaurus.get_synonym(&dict, &sword, &context);
        assert!(std::ptr::eq(result.as_ref(), &sword));
    }

    #[test]
    fn prefers_semantic_superset() {
        let dict = Dictionary::in_memory("English");
        let thesaurus = Thesaurus::new(LexicalConfig::default(), Box::new(DisabledTranslator));
        let sword = dict.add_form(make_noun("sword", &["weapon"])).unwrap();
        let blade = dict.add_form(make_noun("blade", &["weapon", "sharp", "metal"])).unwrap();
        let steel = dict.add_form(make_noun("steel", &["metal"])).unwrap();
        dict.relate(&sword.key(), &blade.key(), Relation::Synonym).unwrap();
        dict.relate(&sword.key(), &steel.key(), Relation::Synonym).unwrap();
        let sword = dict.get_dictata(&sword.key()).unwrap();

        let mut context = LexicalContext::new("English");
        context.semantics.insert("weapon".to_string());
        context.semantics.insert("sharp".to_string());

        let result = thesaurus.get_synonym(&dict, &sword, &context);
        assert_eq!(result.phrase, "blade");
    }

    #[test]
    fn register_distance_breaks_ties() {
        let dict = Dictionary::in_memory("English");
        let thesaurus = Thesaurus::new(LexicalConfig::default(), Box::new(DisabledTranslator));
        let walk = dict.add_form(Dictata::new("English", LexicalType::Verb, "walk")).unwrap();
        let mut stroll = Dictata::new("English", LexicalType::Verb, "stroll");
        stroll.elegance = 4;
        let stroll = dict.add_form(stroll).unwrap();
        let mut trudge = Dictata::new("English", LexicalType::Verb, "trudge");
        trudge.elegance = -3;
        let trudge = dict.add_form(trudge).unwrap();
        dict.relate(&walk.key(), &stroll.key(), Relation::Synonym).unwrap();
        dict.relate(&walk.key(), &trudge.key(), Relation::Synonym).unwrap();
        let walk = dict.get_dictata(&walk.key()).unwrap();

        let mut context = LexicalContext::new("English");
        context.elegance = 5;
        assert_eq!(thesaurus.get_synonym(&dict, &walk, &context).phrase, "stroll");
        context.elegance = -5;
        assert_eq!(thesaurus.get_synonym(&dict, &walk, &context).phrase, "trudge");
    }

    #[test]
    fn other_types_are_not_candidates() {
        let dict = Dictionary::in_memory("English");
        let thesaurus = Thesaurus::new(LexicalConfig::default(), Box::new(DisabledTranslator));
        let sword = dict.add_form(make_noun("sword", &[])).unwrap();
        let slash = dict.add_form(Dictata::new("English", LexicalType::Verb, "slash")).unwrap();
        dict.relate(&sword.key(), &slash.key(), Relation::Synonym).unwrap();
        let sword = dict.get_dictata(&sword.key()).unwrap();

        let context = LexicalContext::new("English");
        assert!(matches!(thesaurus.get_synonym(&dict, &sword, &context), Cow::Borrowed(_)));
    }

    #[test]
    fn translation_creates_mutual_synonym() {
        let dict = Dictionary::in_memory("English");
        let calls = Arc::new(AtomicUsize::new(0));
        let thesaurus = Thesaurus::new(make_config(), make_canned(calls.clone()));
        let sword = dict.add_form(make_noun("sword", &["weapon"])).unwrap();

        let context = LexicalContext::from_dictata(&sword, "Spanish");
        let espada = thesaurus.get_synonym(&dict, &sword, &context).into_owned();
        assert_eq!(espada.phrase, "espada");
        assert_eq!(espada.language, "Spanish");
        assert!(espada.semantics.contains("weapon"));
        assert!(espada.synonyms.contains(&sword.key()));

        let sword = dict.get_dictata(&sword.key()).unwrap();
        assert!(sword.synonyms.contains(&espada.key()));

        // Second lookup finds the stored translation instead of calling out again
        let again = thesaurus.get_synonym(&dict, &sword, &context);
        assert_eq!(again.key(), espada.key());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn translator_failure_falls_back() {
        let dict = Dictionary::in_memory("English");
        let thesaurus = Thesaurus::new(make_config(), Box::new(FailingTranslator));
        let sword = dict.add_form(make_noun("sword", &[])).unwrap();

        let context = LexicalContext::from_dictata(&sword, "Spanish");
        let result = thesaurus.get_synonym(&dict, &sword, &context);
        assert!(std::ptr::eq(result.as_ref(), &sword));
        assert!(dict.get("Spanish", "espada").is_none());
    }

    #[test]
    fn translation_preconditions() {
        let dict = Dictionary::in_memory("English");
        let calls = Arc::new(AtomicUsize::new(0));
        let thesaurus = Thesaurus::new(make_config(), make_canned(calls.clone()));

        let name = dict.add_form(Dictata::new("English", LexicalType::ProperNoun, "sword")).unwrap();
        let context = LexicalContext::from_dictata(&name, "Spanish");
        assert!(matches!(thesaurus.get_synonym(&dict, &name, &context), Cow::Borrowed(_)));

        let foreign = dict.add_form(Dictata::new("Spanish", LexicalType::Noun, "escudo")).unwrap();
        let context = LexicalContext::from_dictata(&foreign, "English");
        assert!(matches!(thesaurus.get_synonym(&dict, &foreign, &context), Cow::Borrowed(_)));

        let shield = dict.add_form(make_noun("shield", &[])).unwrap();
        let context = LexicalContext::from_dictata(&shield, "Klingon");
        assert!(matches!(thesaurus.get_synonym(&dict, &shield, &context), Cow::Borrowed(_)));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inactive_translation_never_calls_out() {
        let dict = Dictionary::in_memory("English");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut config = make_config();
        config.translation.active = false;
        let thesaurus = Thesaurus::new(config, make_canned(calls.clone()));
        let sword = dict.add_form(make_noun("sword", &[])).unwrap();

        let context = LexicalContext::from_dictata(&sword, "Spanish");
        assert!(matches!(thesaurus.get_synonym(&dict, &sword, &context), Cow::Borrowed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fill_languages_translates_each_form() {
        let dict = Dictionary::in_memory("English");
        let calls = Arc::new(AtomicUsize::new(0));
        let thesaurus = Thesaurus::new(make_config(), make_canned(calls.clone()));
        dict.add_form(make_noun("sword", &["weapon"])).unwrap();
        dict.add_form(Dictata::new("English", LexicalType::Verb, "sword")).unwrap();

        let lexeme = dict.get("English", "sword").unwrap();
        assert_eq!(thesaurus.fill_languages(&dict, &lexeme), 2);
        assert_eq!(dict.get("Spanish", "espada").unwrap().word_forms.len(), 2);

        // Already filled: resolved from stored synonyms, no new calls
        assert_eq!(thesaurus.fill_languages(&dict, &lexeme), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fill_languages_skips_proper_nouns() {
        let dict = Dictionary::in_memory("English");
        let calls = Arc::new(AtomicUsize::new(0));
        let thesaurus = Thesaurus::new(make_config(), make_canned(calls.clone()));
        dict.add_form(make_noun("sword", &[])).unwrap();
        dict.add_form(Dictata::new("English", LexicalType::ProperNoun, "sword")).unwrap();

        let lexeme = dict.get("English", "sword").unwrap();
        assert_eq!(thesaurus.fill_languages(&dict, &lexeme), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fitness_rewards_superset_over_overlap() {
        let mut context = LexicalContext::new("English");
        context.semantics.insert("weapon".to_string());
        context.semantics.insert("sharp".to_string());

        let superset = make_noun("blade", &["weapon", "sharp", "long"]);
        let overlap = make_noun("club", &["weapon"]);
        assert!(fitness(&superset, &context) > fitness(&overlap, &context));
    }
}
