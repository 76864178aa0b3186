/// Narrator integration tests: fixture config, on-disk dictionary, stub translator.

use lexical_engine::core::composer::NarrativeOptions;
use lexical_engine::core::lexica::Lexica;
use lexical_engine::core::narrator::Narrator;
use lexical_engine::core::translator::{TranslationError, Translator};
use lexical_engine::schema::dictata::DictataKey;
use lexical_engine::schema::lexical::{GrammaticalRole, LexicalType, NarrativeNormalization};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = "tests/fixtures/lexical_config.ron";

/// Answers from a fixed word list and counts how often it was asked.
struct StubTranslator {
    calls: Arc<AtomicUsize>,
}

impl Translator for StubTranslator {
    fn translate(&self, phrase: &str, from: &str, to: &str) -> Result<Option<String>, TranslationError> {
        assert_eq!(from, "en");
        assert_eq!(to, "es");
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = match phrase {
            "guard" => "guardia",
            "raises" => "levanta",
            "sword" => "espada",
            "sharp" => "afilada",
            "is" => "es",
            _ => return Ok(None),
        };
        Ok(Some(text.to_string()))
    }
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

fn make_fixture_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    copy_dir(Path::new("tests/fixtures/dictionary"), dir.path());
    dir
}

fn make_narrator(dir: &TempDir, calls: &Arc<AtomicUsize>) -> Narrator {
    Narrator::builder()
        .config_path(CONFIG)
        .dictionary_dir(dir.path().to_str().unwrap())
        .with_translator(Box::new(StubTranslator {
            calls: Arc::clone(calls),
        }))
        .build()
        .unwrap()
}

fn make_guard_tree() -> Lexica {
    let mut guard = Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "guard");
    guard
        .try_modify_with(LexicalType::Verb, GrammaticalRole::Verb, "raises")
        .try_modify_with(LexicalType::Noun, GrammaticalRole::DirectObject, "sword");
    guard
}

#[test]
fn english_finishing_rules_apply() {
    let dir = make_fixture_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let narrator = make_narrator(&dir, &calls);

    let mut it = Lexica::new(LexicalType::Pronoun, GrammaticalRole::Subject, "it");
    it.try_modify_with(LexicalType::Verb, GrammaticalRole::Verb, "is")
        .try_modify_with(LexicalType::Adjective, GrammaticalRole::Descriptive, "apple")
        .try_modify_with(LexicalType::Article, GrammaticalRole::Descriptive, "a");
    assert_eq!(it.to_string(), "it is  a apple");
    assert_eq!(
        narrator.narrate(&it, &NarrativeOptions::default(), None),
        "it is  an apple."
    );

    let mut you = Lexica::new(LexicalType::Pronoun, GrammaticalRole::Subject, "you");
    you.try_modify_with(LexicalType::Verb, GrammaticalRole::Verb, "do")
        .try_modify_with(LexicalType::Adverb, GrammaticalRole::Descriptive, "not");
    assert_eq!(
        narrator.narrate(&you, &NarrativeOptions::default(), Some("English")),
        "you don't ."
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn spanish_narration_translates_once() {
    let dir = make_fixture_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let narrator = make_narrator(&dir, &calls);
    let tree = make_guard_tree();

    let first = narrator.narrate(&tree, &NarrativeOptions::default(), Some("Spanish"));
    assert_eq!(first, "guardia levanta espada  .");
    let asked = calls.load(Ordering::SeqCst);
    assert_eq!(asked, 3);

    // Translations are now Spanish synonyms, so the service is not asked again.
    let second = narrator.narrate(&tree, &NarrativeOptions::default(), Some("spanish"));
    assert_eq!(second, first);
    assert_eq!(calls.load(Ordering::SeqCst), asked);

    let espada = narrator.dictionary().get("Spanish", "espada").unwrap();
    let form = &espada.word_forms[0];
    assert!(form.semantics.contains("weapon"));
    assert!(form
        .synonyms
        .contains(&DictataKey::new("English", LexicalType::Noun, "sword", 1)));
}

#[test]
fn translations_survive_reopening() {
    let dir = make_fixture_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let narrator = make_narrator(&dir, &calls);
        narrator.narrate(&make_guard_tree(), &NarrativeOptions::default(), Some("Spanish"));
    }

    let reopened = make_narrator(&dir, &calls);
    let sword = reopened.dictionary().lookup("Noun_sword").unwrap();
    assert!(sword
        .synonyms
        .iter()
        .any(|k| k.language == "Spanish" && k.phrase == "espada"));
    assert!(reopened.dictionary().lookup("Verb_raises").is_some());
}

#[test]
fn hemingway_in_spanish_translates_the_linking_verb() {
    let dir = make_fixture_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let narrator = make_narrator(&dir, &calls);

    let tree = Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "sword")
        .with_modifier(Lexica::new(LexicalType::Adjective, GrammaticalRole::Descriptive, "sharp"));
    let options = NarrativeOptions::default().with_normalization(NarrativeNormalization::Hemingway);
    assert_eq!(narrator.narrate(&tree, &options, Some("Spanish")), "espada es afilada.");
    assert!(narrator.dictionary().lookup("Conjunction_is").is_some());
    assert!(narrator.dictionary().get("Spanish", "es").is_some());

    // The English rendering is untouched by the Spanish pass.
    assert_eq!(narrator.narrate(&tree, &options, None), "sword is sharp.");
}

#[test]
fn fixture_config_seed_is_used() {
    let dir = make_fixture_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let narrator = make_narrator(&dir, &calls);
    assert_eq!(narrator.config().seed, 42);
    assert_eq!(narrator.dictionary().base_language(), "English");
}
