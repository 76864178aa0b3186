/// Grammar tree nodes: role-tagged words and the modifiers attached to them.
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::Path;
use thiserror::Error;

use crate::core::dictionary::Dictionary;
use crate::schema::dictata::Dictata;
use crate::schema::lexical::{GrammaticalRole, LexicalType};

#[derive(Debug, Error)]
pub enum LexicaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Outcome of comparing one node against another.
///
/// This is an equality grouping, not an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicaComparison {
    /// Nothing to compare against.
    NullInput,
    /// The other node is a different kind of word.
    TypeMismatch,
    /// Same kind of word, different phrase.
    DifferentWord,
    /// Same kind of word and same phrase.
    SameWord,
}

/// A word or phrase with its sentence role and its modifiers.
///
/// Modifiers are owned by value, so a tree can never contain itself.
/// Equality and hashing look only at (type, phrase): two nodes with the same
/// head word are equal even when their modifiers differ, which is what lets
/// `try_modify` fold repeated modifiers together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "LexicaDef")]
pub struct Lexica {
    pub lexical_type: LexicalType,
    pub role: GrammaticalRole,
    pub phrase: String,
    modifiers: Vec<Lexica>,
}

// Deserialized trees go through `try_modify` so fixture files cannot smuggle
// in duplicate modifiers.
#[derive(Debug, Deserialize)]
struct LexicaDef {
    lexical_type: LexicalType,
    role: GrammaticalRole,
    phrase: String,
    #[serde(default)]
    modifiers: Vec<Lexica>,
}

impl From<LexicaDef> for Lexica {
    fn from(def: LexicaDef) -> Self {
        let mut node = Lexica::new(def.lexical_type, def.role, &def.phrase);
        for modifier in def.modifiers {
            node.try_modify(modifier);
        }
        node
    }
}

impl Lexica {
    pub fn new(lexical_type: LexicalType, role: GrammaticalRole, phrase: &str) -> Self {
        Self {
            lexical_type,
            role,
            phrase: phrase.to_string(),
            modifiers: Vec::new(),
        }
    }

    /// Load a tree from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Self, LexicaError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(ron_str: &str) -> Result<Self, LexicaError> {
        Ok(ron::from_str(ron_str)?)
    }

    /// Modifiers in the order they were attached.
    pub fn modifiers(&self) -> &[Lexica] {
        &self.modifiers
    }

    pub fn modifiers_with_role(&self, role: GrammaticalRole) -> impl Iterator<Item = &Lexica> {
        self.modifiers.iter().filter(move |m| m.role == role)
    }

    pub fn has_modifier_with_role(&self, role: GrammaticalRole) -> bool {
        self.modifiers.iter().any(|m| m.role == role)
    }

    /// Attach a modifier unless an equal one is already attached.
    ///
    /// Returns the attached modifier (the pre-existing one when a duplicate was
    /// offered) so further modification can be chained onto it.
    pub fn try_modify(&mut self, modifier: Lexica) -> &mut Lexica {
        let idx = match self.modifiers.iter().position(|m| *m == modifier) {
            Some(idx) => idx,
            None => {
                self.modifiers.push(modifier);
                self.modifiers.len() - 1
            }
        };
        &mut self.modifiers[idx]
    }

    /// Build and attach a modifier in one step.
    pub fn try_modify_with(
        &mut self,
        lexical_type: LexicalType,
        role: GrammaticalRole,
        phrase: &str,
    ) -> &mut Lexica {
        self.try_modify(Lexica::new(lexical_type, role, phrase))
    }

    /// Owned-builder form of `try_modify`, handy when assembling trees inline.
    pub fn with_modifier(mut self, modifier: Lexica) -> Self {
        self.try_modify(modifier);
        self
    }

    /// A copy of this node keeping only the modifiers matching `keep`.
    pub fn reduced<F>(&self, keep: F) -> Lexica
    where
        F: Fn(&Lexica) -> bool,
    {
        Lexica {
            lexical_type: self.lexical_type,
            role: self.role,
            phrase: self.phrase.clone(),
            modifiers: self.modifiers.iter().filter(|m| keep(m)).cloned().collect(),
        }
    }

    /// A copy of this node with no modifiers.
    pub fn bare(&self) -> Lexica {
        Lexica::new(self.lexical_type, self.role, &self.phrase)
    }

    /// Empty or whitespace phrases render as nothing.
    pub fn is_silent(&self) -> bool {
        self.phrase.trim().is_empty()
    }

    pub fn compare(&self, other: Option<&Lexica>) -> LexicaComparison {
        match other {
            None => LexicaComparison::NullInput,
            Some(other) if other.lexical_type != self.lexical_type => {
                LexicaComparison::TypeMismatch
            }
            Some(other) if other.phrase == self.phrase => LexicaComparison::SameWord,
            Some(_) => LexicaComparison::DifferentWord,
        }
    }

    /// Composite registry key, e.g. "Noun_sword".
    pub fn dictata_key(&self) -> String {
        format!("{}_{}", self.lexical_type, self.phrase)
    }

    /// Resolve this node against the word-form registry, if it is registered.
    pub fn get_dictata(&self, dictionary: &Dictionary) -> Option<Dictata> {
        dictionary.lookup(&self.dictata_key())
    }

    /// Visit this node and every descendant, parents before children.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Lexica),
    {
        visit(self);
        for modifier in &self.modifiers {
            modifier.walk(visit);
        }
    }

    /// Mutable form of `walk`. Visitors may rewrite phrases; equal siblings
    /// produced that way are left in place.
    pub fn walk_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut Lexica),
    {
        visit(self);
        for modifier in &mut self.modifiers {
            modifier.walk_mut(visit);
        }
    }
}

impl PartialEq for Lexica {
    fn eq(&self, other: &Self) -> bool {
        self.lexical_type == other.lexical_type && self.phrase == other.phrase
    }
}

impl Eq for Lexica {}

impl Hash for Lexica {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lexical_type.hash(state);
        self.phrase.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn make_sword() -> Lexica {
        Lexica::new(LexicalType::Noun, GrammaticalRole::DirectObject, "sword")
    }

    fn make_sharp() -> Lexica {
        Lexica::new(LexicalType::Adjective, GrammaticalRole::Descriptive, "sharp")
    }

    #[test]
    fn try_modify_adds_once() {
        let mut sword = make_sword();
        sword.try_modify(make_sharp());
        sword.try_modify(make_sharp());
        assert_eq!(sword.modifiers().len(), 1);
    }

    #[test]
    fn try_modify_returns_existing_for_chaining() {
        let mut sword = make_sword();
        sword
            .try_modify(make_sharp())
            .try_modify_with(LexicalType::Adverb, GrammaticalRole::Descriptive, "very");

        // The duplicate hands back the original, which already carries "very"
        let existing = sword.try_modify(make_sharp());
        assert_eq!(existing.modifiers().len(), 1);
        assert_eq!(existing.modifiers()[0].phrase, "very");
    }

    #[test]
    fn equality_ignores_modifiers_and_role() {
        let plain = make_sword();
        let decorated = make_sword().with_modifier(make_sharp());
        let as_subject = Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "sword");
        assert_eq!(plain, decorated);
        assert_eq!(plain, as_subject);

        let mut set = FxHashSet::default();
        set.insert(plain);
        assert!(!set.insert(decorated));
    }

    #[test]
    fn equality_requires_same_type() {
        let noun = make_sword();
        let verb = Lexica::new(LexicalType::Verb, GrammaticalRole::Verb, "sword");
        assert_ne!(noun, verb);
    }

    #[test]
    fn compare_sentinels() {
        let sword = make_sword();
        assert_eq!(sword.compare(None), LexicaComparison::NullInput);
        assert_eq!(
            sword.compare(Some(&Lexica::new(LexicalType::Verb, GrammaticalRole::Verb, "sword"))),
            LexicaComparison::TypeMismatch
        );
        assert_eq!(
            sword.compare(Some(&Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "shield"))),
            LexicaComparison::DifferentWord
        );
        assert_eq!(
            sword.compare(Some(&make_sword().with_modifier(make_sharp()))),
            LexicaComparison::SameWord
        );
    }

    #[test]
    fn dictata_key_format() {
        assert_eq!(make_sword().dictata_key(), "Noun_sword");
        assert_eq!(make_sharp().dictata_key(), "Adjective_sharp");
    }

    #[test]
    fn reduced_keeps_matching_modifiers() {
        let node = make_sword()
            .with_modifier(make_sharp())
            .with_modifier(Lexica::new(LexicalType::Noun, GrammaticalRole::IndirectObject, "you"));
        let reduced = node.reduced(|m| m.role != GrammaticalRole::Descriptive);
        assert_eq!(reduced.modifiers().len(), 1);
        assert_eq!(reduced.modifiers()[0].phrase, "you");
        assert_eq!(reduced, node);
        assert!(node.bare().modifiers().is_empty());
    }

    #[test]
    fn silent_phrases() {
        assert!(Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "").is_silent());
        assert!(Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, " \t").is_silent());
        assert!(!make_sword().is_silent());
    }

    #[test]
    fn walk_visits_every_node() {
        let mut root = Lexica::new(LexicalType::Noun, GrammaticalRole::Subject, "you");
        root.try_modify_with(LexicalType::Verb, GrammaticalRole::Verb, "drop")
            .try_modify(make_sword())
            .try_modify(make_sharp());

        let mut seen = Vec::new();
        root.walk(&mut |n| seen.push(n.phrase.clone()));
        assert_eq!(seen, vec!["you", "drop", "sword", "sharp"]);

        root.walk_mut(&mut |n| n.phrase = n.phrase.to_uppercase());
        assert_eq!(root.phrase, "YOU");
        assert_eq!(root.modifiers()[0].modifiers()[0].phrase, "SWORD");
    }

    #[test]
    fn ron_deserialization_dedupes_modifiers() {
        let ron_str = r#"(
            lexical_type: Noun,
            role: Subject,
            phrase: "npc",
            modifiers: [
                (lexical_type: Adjective, role: Descriptive, phrase: "tall"),
                (lexical_type: Adjective, role: Descriptive, phrase: "tall"),
            ],
        )"#;
        let node = Lexica::parse_ron(ron_str).unwrap();
        assert_eq!(node.phrase, "npc");
        assert_eq!(node.modifiers().len(), 1);
    }
}
