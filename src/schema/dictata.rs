use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::lexical::{LexicalTense, LexicalType, NarrativePerspective};

/// Identity of one word form: one sense of one word in one language.
///
/// Phrases are stored lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DictataKey {
    pub language: String,
    pub lexical_type: LexicalType,
    pub phrase: String,
    pub form_group: i16,
}

impl DictataKey {
    pub fn new(language: &str, lexical_type: LexicalType, phrase: &str, form_group: i16) -> Self {
        Self {
            language: language.to_string(),
            lexical_type,
            phrase: phrase.trim().to_lowercase(),
            form_group,
        }
    }
}

impl fmt::Display for DictataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.language, self.phrase, self.lexical_type, self.form_group
        )
    }
}

/// Identity of a multi-word phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhraseKey {
    pub language: String,
    pub phrase: String,
}

impl PhraseKey {
    pub fn new(language: &str, phrase: &str) -> Self {
        Self {
            language: language.to_string(),
            phrase: phrase.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for PhraseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.language, self.phrase)
    }
}

/// The kind of link between two word forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Synonym,
    Antonym,
}

/// A canonical, attribute-rich word form.
///
/// Relation sets hold keys rather than the related forms themselves, so the
/// synonym network can contain loops without any ownership cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dictata {
    pub phrase: String,
    pub language: String,
    pub lexical_type: LexicalType,
    /// Sense ordinal within the owning lexeme; -1 until inserted.
    #[serde(default = "unassigned_form_group")]
    pub form_group: i16,
    #[serde(default)]
    pub tense: LexicalTense,
    #[serde(default)]
    pub perspective: NarrativePerspective,
    #[serde(default)]
    pub plural: bool,
    #[serde(default)]
    pub possessive: bool,
    #[serde(default)]
    pub feminine: bool,
    #[serde(default)]
    pub determinant: bool,
    #[serde(default)]
    pub positional: bool,
    #[serde(default)]
    pub vulgar: bool,
    /// How "good" the word is, from terrible to excellent.
    #[serde(default)]
    pub quality: i32,
    /// How strong the word is, from mild to extreme.
    #[serde(default)]
    pub severity: i32,
    /// How refined the word is, from crude to flowery.
    #[serde(default)]
    pub elegance: i32,
    #[serde(default)]
    pub semantics: FxHashSet<String>,
    #[serde(default)]
    pub synonyms: BTreeSet<DictataKey>,
    #[serde(default)]
    pub antonyms: BTreeSet<DictataKey>,
    #[serde(default)]
    pub phrase_synonyms: BTreeSet<PhraseKey>,
    #[serde(default)]
    pub phrase_antonyms: BTreeSet<PhraseKey>,
}

fn unassigned_form_group() -> i16 {
    -1
}

impl Dictata {
    pub fn new(language: &str, lexical_type: LexicalType, phrase: &str) -> Self {
        Self {
            phrase: phrase.trim().to_string(),
            language: language.to_string(),
            lexical_type,
            form_group: -1,
            tense: LexicalTense::None,
            perspective: NarrativePerspective::None,
            plural: false,
            possessive: false,
            feminine: false,
            determinant: false,
            positional: false,
            vulgar: false,
            quality: 0,
            severity: 0,
            elegance: 0,
            semantics: FxHashSet::default(),
            synonyms: BTreeSet::new(),
            antonyms: BTreeSet::new(),
            phrase_synonyms: BTreeSet::new(),
            phrase_antonyms: BTreeSet::new(),
        }
    }

    /// Builder-style helper for attaching semantic tags.
    pub fn with_semantics(mut self, tags: &[&str]) -> Self {
        self.semantics.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    pub fn key(&self) -> DictataKey {
        DictataKey::new(&self.language, self.lexical_type, &self.phrase, self.form_group)
    }

    /// Returns true if this form carries every one of the given tags.
    pub fn has_semantics(&self, tags: &FxHashSet<String>) -> bool {
        tags.iter().all(|tag| self.semantics.contains(tag))
    }

    /// Two forms are the same sense when their type and semantic tag set match.
    pub fn same_sense(&self, other: &Dictata) -> bool {
        self.lexical_type == other.lexical_type && self.semantics == other.semantics
    }

    /// Copy the grammatical attributes (not the relations) of another form.
    pub fn inherit_attributes(&mut self, source: &Dictata) {
        self.tense = source.tense;
        self.perspective = source.perspective;
        self.plural = source.plural;
        self.possessive = source.possessive;
        self.feminine = source.feminine;
        self.determinant = source.determinant;
        self.positional = source.positional;
        self.vulgar = source.vulgar;
        self.quality = source.quality;
        self.severity = source.severity;
        self.elegance = source.elegance;
        self.semantics = source.semantics.clone();
    }

    pub fn relations(&self, relation: Relation) -> &BTreeSet<DictataKey> {
        match relation {
            Relation::Synonym => &self.synonyms,
            Relation::Antonym => &self.antonyms,
        }
    }

    pub fn relations_mut(&mut self, relation: Relation) -> &mut BTreeSet<DictataKey> {
        match relation {
            Relation::Synonym => &mut self.synonyms,
            Relation::Antonym => &mut self.antonyms,
        }
    }

    /// Union another form's relation sets into this one. Returns true if anything was added.
    pub fn absorb_relations(&mut self, other: &Dictata) -> bool {
        let own_key = self.key();
        let before = self.relation_count();
        self.synonyms
            .extend(other.synonyms.iter().filter(|k| **k != own_key).cloned());
        self.antonyms
            .extend(other.antonyms.iter().filter(|k| **k != own_key).cloned());
        self.phrase_synonyms
            .extend(other.phrase_synonyms.iter().cloned());
        self.phrase_antonyms
            .extend(other.phrase_antonyms.iter().cloned());
        self.relation_count() != before
    }

    /// Strip every reference to the given forms and phrases. Returns true if anything changed.
    pub fn strip_references(
        &mut self,
        forms: &BTreeSet<DictataKey>,
        phrases: &BTreeSet<PhraseKey>,
    ) -> bool {
        let before = self.relation_count();
        self.synonyms.retain(|k| !forms.contains(k));
        self.antonyms.retain(|k| !forms.contains(k));
        self.phrase_synonyms.retain(|k| !phrases.contains(k));
        self.phrase_antonyms.retain(|k| !phrases.contains(k));
        self.relation_count() != before
    }

    fn relation_count(&self) -> usize {
        self.synonyms.len()
            + self.antonyms.len()
            + self.phrase_synonyms.len()
            + self.phrase_antonyms.len()
    }
}

/// A multi-word phrase assembled from word forms, with its own relation sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictataPhrase {
    pub phrase: String,
    pub language: String,
    pub words: BTreeSet<DictataKey>,
    #[serde(default)]
    pub semantics: FxHashSet<String>,
    #[serde(default)]
    pub synonyms: BTreeSet<DictataKey>,
    #[serde(default)]
    pub antonyms: BTreeSet<DictataKey>,
}

impl DictataPhrase {
    pub fn new(language: &str, phrase: &str) -> Self {
        Self {
            phrase: phrase.trim().to_string(),
            language: language.to_string(),
            words: BTreeSet::new(),
            semantics: FxHashSet::default(),
            synonyms: BTreeSet::new(),
            antonyms: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> PhraseKey {
        PhraseKey::new(&self.language, &self.phrase)
    }

    /// Returns true if any of the given forms is one of this phrase's words.
    pub fn contains_any(&self, forms: &BTreeSet<DictataKey>) -> bool {
        self.words.iter().any(|w| forms.contains(w))
    }

    /// Strip every relation reference to the given forms. Returns true if anything changed.
    pub fn strip_references(&mut self, forms: &BTreeSet<DictataKey>) -> bool {
        let before = self.synonyms.len() + self.antonyms.len();
        self.synonyms.retain(|k| !forms.contains(k));
        self.antonyms.retain(|k| !forms.contains(k));
        self.synonyms.len() + self.antonyms.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_word(phrase: &str, form_group: i16) -> Dictata {
        let mut word = Dictata::new("English", LexicalType::Noun, phrase);
        word.form_group = form_group;
        word
    }

    #[test]
    fn key_is_case_insensitive() {
        let a = DictataKey::new("English", LexicalType::Noun, "Sword", 1);
        let b = DictataKey::new("English", LexicalType::Noun, " sword ", 1);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "English_sword_Noun_1");
    }

    #[test]
    fn new_form_is_unassigned() {
        let word = Dictata::new("English", LexicalType::Verb, "drop");
        assert_eq!(word.form_group, -1);
        assert!(word.synonyms.is_empty());
    }

    #[test]
    fn same_sense_compares_type_and_semantics() {
        let a = make_word("blade", 1).with_semantics(&["weapon"]);
        let b = make_word("blade", 2).with_semantics(&["weapon"]);
        let c = make_word("blade", 3).with_semantics(&["grass"]);
        assert!(a.same_sense(&b));
        assert!(!a.same_sense(&c));
    }

    #[test]
    fn strip_references_is_idempotent() {
        let gone = make_word("blade", 1).key();
        let mut word = make_word("sword", 1);
        word.synonyms.insert(gone.clone());
        word.antonyms.insert(gone.clone());

        let forms: BTreeSet<DictataKey> = [gone].into_iter().collect();
        assert!(word.strip_references(&forms, &BTreeSet::new()));
        assert!(word.synonyms.is_empty());
        assert!(word.antonyms.is_empty());
        // Second pass has nothing to do
        assert!(!word.strip_references(&forms, &BTreeSet::new()));
    }

    #[test]
    fn absorb_relations_skips_self() {
        let mut word = make_word("sword", 1);
        let mut other = make_word("sword", 1);
        other.synonyms.insert(word.key());
        other.synonyms.insert(make_word("blade", 1).key());

        assert!(word.absorb_relations(&other));
        assert_eq!(word.synonyms.len(), 1);
        assert!(!word.absorb_relations(&other));
    }

    #[test]
    fn phrase_contains_words() {
        let mut phrase = DictataPhrase::new("English", "cold steel");
        phrase.words.insert(make_word("steel", 1).key());
        let steel: BTreeSet<DictataKey> = [make_word("steel", 1).key()].into_iter().collect();
        let sword: BTreeSet<DictataKey> = [make_word("sword", 1).key()].into_iter().collect();
        assert!(phrase.contains_any(&steel));
        assert!(!phrase.contains_any(&sword));
    }

    #[test]
    fn ron_round_trip() {
        let word = make_word("sword", 2).with_semantics(&["weapon", "metal"]);
        let serialized = ron::to_string(&word).unwrap();
        let deserialized: Dictata = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, word);
    }
}
