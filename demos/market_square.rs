/// Market Square example: a handful of world events narrated two ways.
///
/// A merchant opens a stall, a guard wanders past, you buy a sword. Each
/// event is told in English under Normal and Hemingway normalization, then
/// in Spanish through a small phrasebook translator.
///
/// Run with: cargo run --example market_square

use lexical_engine::core::composer::NarrativeOptions;
use lexical_engine::core::config::LexicalConfig;
use lexical_engine::core::lexica::Lexica;
use lexical_engine::core::narrator::Narrator;
use lexical_engine::core::translator::{TranslationError, Translator};
use lexical_engine::schema::language::{ContractionRule, FollowingSound, Language, TransformationRule};
use lexical_engine::schema::lexical::{GrammaticalRole, LexicalType, NarrativeNormalization};
use std::collections::HashMap;

/// Offline stand-in for a translation service.
struct Phrasebook {
    entries: HashMap<&'static str, &'static str>,
}

impl Translator for Phrasebook {
    fn translate(&self, phrase: &str, _from: &str, _to: &str) -> Result<Option<String>, TranslationError> {
        Ok(self.entries.get(phrase).map(|s| s.to_string()))
    }
}

fn phrasebook() -> Phrasebook {
    let entries = HashMap::from([
        ("merchant", "mercader"),
        ("opens", "abre"),
        ("stall", "puesto"),
        ("old", "viejo"),
        ("busy", "ocupado"),
        ("guard", "guardia"),
        ("wanders", "deambula"),
        ("slowly", "lentamente"),
        ("you", "tú"),
        ("buy", "compras"),
        ("sword", "espada"),
        ("sharp", "afilada"),
    ]);
    Phrasebook { entries }
}

fn config() -> LexicalConfig {
    let mut english = Language::new("English", "en");
    english.transformation_rules.push(TransformationRule {
        origin: "a".to_string(),
        transformed: "an".to_string(),
        when_followed_by: FollowingSound::Vowel,
    });
    english.contraction_rules.push(ContractionRule {
        first: "do".to_string(),
        second: "not".to_string(),
        contraction: "don't".to_string(),
    });

    let mut spanish = Language::new("Spanish", "es");
    spanish.precedent_punctuation = true;

    let mut config = LexicalConfig::default();
    config.languages = vec![english, spanish];
    config.translation.active = true;
    config.translation.key = "phrasebook".to_string();
    config.seed = 2026;
    config
}

fn events() -> Vec<(&'static str, Lexica)> {
    let mut merchant = Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "merchant");
    merchant.try_modify_with(LexicalType::Adjective, GrammaticalRole::Descriptive, "old");
    merchant
        .try_modify_with(LexicalType::Verb, GrammaticalRole::Verb, "opens")
        .try_modify_with(LexicalType::Noun, GrammaticalRole::DirectObject, "stall")
        .try_modify_with(LexicalType::Adjective, GrammaticalRole::Descriptive, "busy");

    let mut guard = Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "guard");
    guard
        .try_modify_with(LexicalType::Verb, GrammaticalRole::Verb, "wanders")
        .try_modify_with(LexicalType::Adverb, GrammaticalRole::Descriptive, "slowly");

    let mut you = Lexica::new(LexicalType::Pronoun, GrammaticalRole::Subject, "you");
    you.try_modify_with(LexicalType::Verb, GrammaticalRole::Verb, "buy")
        .try_modify_with(LexicalType::Noun, GrammaticalRole::DirectObject, "sword")
        .try_modify_with(LexicalType::Adjective, GrammaticalRole::Descriptive, "sharp");

    vec![("stall", merchant), ("patrol", guard), ("purchase", you)]
}

fn main() {
    env_logger::Builder::from_default_env().init();

    let narrator = Narrator::builder()
        .config(config())
        .with_translator(Box::new(phrasebook()))
        .build()
        .expect("Failed to build narrator");

    let normal = NarrativeOptions::default();
    let hemingway = NarrativeOptions::default().with_normalization(NarrativeNormalization::Hemingway);

    for (name, event) in events() {
        println!("--- {} ---", name);
        println!("  normal:    {}", narrator.narrate(&event, &normal, None));
        println!("  hemingway: {}", narrator.narrate(&event, &hemingway, None));
        println!("  spanish:   {}", narrator.narrate(&event, &normal, Some("Spanish")));
        println!();
    }

    let translated = narrator.fill_languages();
    println!(
        "Dictionary now holds {} forms across {} lexemes ({} resolved translations)",
        narrator.dictionary().all_forms().len(),
        narrator.dictionary().lexemes().len(),
        translated
    );
}
