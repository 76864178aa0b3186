use serde::{Deserialize, Serialize};
use std::fmt;

use super::dictata::{Dictata, DictataKey};
use super::lexical::LexicalType;

/// Identity of a lexeme: one written phrase within one language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LexemeKey {
    pub language: String,
    pub name: String,
}

impl LexemeKey {
    pub fn new(language: &str, name: &str) -> Self {
        Self {
            language: language.to_string(),
            name: name.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for LexemeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.language, self.name)
    }
}

/// Every word form sharing one written phrase in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexeme {
    pub language: String,
    pub name: String,
    /// Set once thesaurus relations have been imported; later imports skip the lookup.
    #[serde(default)]
    pub is_syn_mapped: bool,
    #[serde(default)]
    pub word_forms: Vec<Dictata>,
}

impl Lexeme {
    pub fn new(language: &str, name: &str) -> Self {
        Self {
            language: language.to_string(),
            name: name.trim().to_string(),
            is_syn_mapped: false,
            word_forms: Vec::new(),
        }
    }

    pub fn key(&self) -> LexemeKey {
        LexemeKey::new(&self.language, &self.name)
    }

    /// The distinct lexical types present among this lexeme's forms.
    pub fn contained_types(&self) -> Vec<LexicalType> {
        let mut types: Vec<LexicalType> = self.word_forms.iter().map(|f| f.lexical_type).collect();
        types.sort();
        types.dedup();
        types
    }

    /// Add a word form, or augment the existing form of the same sense.
    ///
    /// A form is the same sense as an existing one when its lexical type and
    /// semantic tag set are equal; in that case the existing form absorbs the
    /// newcomer's relation sets and is returned. Otherwise the newcomer is
    /// re-homed to this lexeme, given the next form group (max + 1) and inserted.
    ///
    /// Returns the stored form and whether the lexeme changed.
    pub fn add_form(&mut self, mut new_form: Dictata) -> (Dictata, bool) {
        new_form.language = self.language.clone();
        new_form.phrase = self.name.clone();

        if let Some(existing) = self.word_forms.iter_mut().find(|f| f.same_sense(&new_form)) {
            let changed = existing.absorb_relations(&new_form);
            return (existing.clone(), changed);
        }

        let max_group = self.word_forms.iter().map(|f| f.form_group).max().unwrap_or(0);
        new_form.form_group = max_group.max(0) + 1;
        self.word_forms.push(new_form.clone());
        (new_form, true)
    }

    /// Find a form by type; a negative `form_group` matches the first form of that type.
    pub fn get_form(&self, lexical_type: LexicalType, form_group: i16) -> Option<&Dictata> {
        self.word_forms
            .iter()
            .find(|f| f.lexical_type == lexical_type && (form_group < 0 || f.form_group == form_group))
    }

    /// Find a form by its form group alone.
    pub fn get_form_group(&self, form_group: i16) -> Option<&Dictata> {
        self.word_forms.iter().find(|f| f.form_group == form_group)
    }

    pub fn find(&self, key: &DictataKey) -> Option<&Dictata> {
        self.word_forms.iter().find(|f| f.key() == *key)
    }

    pub fn find_mut(&mut self, key: &DictataKey) -> Option<&mut Dictata> {
        self.word_forms.iter_mut().find(|f| f.key() == *key)
    }

    /// Remove a form by key. Removing an absent form is a no-op returning `None`.
    pub fn remove_form(&mut self, key: &DictataKey) -> Option<Dictata> {
        let idx = self.word_forms.iter().position(|f| f.key() == *key)?;
        Some(self.word_forms.remove(idx))
    }

    pub fn has_proper_noun(&self) -> bool {
        self.word_forms
            .iter()
            .any(|f| f.lexical_type == LexicalType::ProperNoun)
    }
}
