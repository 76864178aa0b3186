/// The word-form registry: a shared, mutable cache of lexemes over a `WordStore`.
///
/// Each lexeme sits behind its own mutex so concurrent additions to one
/// lexeme serialize while different lexemes proceed independently. Every
/// mutation is applied to a copy, persisted, and only then committed.

use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

use crate::core::store::{MemoryStore, StoreError, WordStore};
use crate::schema::dictata::{Dictata, DictataKey, DictataPhrase, PhraseKey, Relation};
use crate::schema::lexeme::{Lexeme, LexemeKey};
use crate::schema::lexical::LexicalType;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Outcome of a cascading removal.
///
/// `removed` is false when the target was already gone; the reference sweep
/// still runs so leftovers from an earlier partial cascade are cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: bool,
    /// Lexemes and phrases rewritten to drop references.
    pub touched: usize,
    /// Records whose clean-up could not be persisted.
    pub failures: usize,
}

pub struct Dictionary {
    base_language: String,
    store: Box<dyn WordStore>,
    lexemes: RwLock<FxHashMap<LexemeKey, Arc<Mutex<Lexeme>>>>,
    phrases: RwLock<FxHashMap<PhraseKey, DictataPhrase>>,
    /// "{type}_{phrase}" (lowercased) to the first base-language form registered.
    index: RwLock<FxHashMap<String, DictataKey>>,
}

fn index_key(lexical_type: LexicalType, phrase: &str) -> String {
    format!("{}_{}", lexical_type, phrase.trim()).to_lowercase()
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lexemes = self.lexemes.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Dictionary")
            .field("base_language", &self.base_language)
            .field("lexemes", &lexemes.len())
            .finish()
    }
}

impl Dictionary {
    /// Load every lexeme and phrase from `store`.
    pub fn open(base_language: &str, store: Box<dyn WordStore>) -> Result<Self, DictionaryError> {
        let mut lexemes = FxHashMap::default();
        let mut index = FxHashMap::default();
        for lexeme in store.load_lexemes()? {
            if lexeme.language == base_language {
                for form in &lexeme.word_forms {
                    index
                        .entry(index_key(form.lexical_type, &form.phrase))
                        .or_insert_with(|| form.key());
                }
            }
            lexemes.insert(lexeme.key(), Arc::new(Mutex::new(lexeme)));
        }

        let phrases = store
            .load_phrases()?
            .into_iter()
            .map(|p| (p.key(), p))
            .collect();

        debug!("opened dictionary with {} lexemes", lexemes.len());
        Ok(Self {
            base_language: base_language.to_string(),
            store,
            lexemes: RwLock::new(lexemes),
            phrases: RwLock::new(phrases),
            index: RwLock::new(index),
        })
    }

    /// An empty registry backed by a `MemoryStore`.
    pub fn in_memory(base_language: &str) -> Self {
        Self {
            base_language: base_language.to_string(),
            store: Box::new(MemoryStore::new()),
            lexemes: RwLock::new(FxHashMap::default()),
            phrases: RwLock::new(FxHashMap::default()),
            index: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn base_language(&self) -> &str {
        &self.base_language
    }

    fn resolve_language<'a>(&'a self, language: Option<&'a str>) -> &'a str {
        match language {
            Some(lang) if !lang.trim().is_empty() => lang,
            _ => &self.base_language,
        }
    }

    fn handle(&self, key: &LexemeKey) -> Option<Arc<Mutex<Lexeme>>> {
        let lexemes = self.lexemes.read().unwrap_or_else(PoisonError::into_inner);
        lexemes.get(key).cloned()
    }

    /// True while `handle` is still the registered entry for `key`.
    ///
    /// Checked after taking a lexeme's lock: a lexeme removed while the caller
    /// waited is stale and must never be written back to the store.
    fn is_current(&self, key: &LexemeKey, handle: &Arc<Mutex<Lexeme>>) -> bool {
        let lexemes = self.lexemes.read().unwrap_or_else(PoisonError::into_inner);
        lexemes.get(key).is_some_and(|h| Arc::ptr_eq(h, handle))
    }

    /// Fetch or insert the cache entry for a lexeme. The flag is true when it was created.
    fn entry(&self, language: &str, phrase: &str) -> (Arc<Mutex<Lexeme>>, bool) {
        let key = LexemeKey::new(language, phrase);
        if let Some(handle) = self.handle(&key) {
            return (handle, false);
        }
        let mut lexemes = self.lexemes.write().unwrap_or_else(PoisonError::into_inner);
        let mut created = false;
        let handle = lexemes
            .entry(key)
            .or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(Lexeme::new(language, phrase)))
            })
            .clone();
        (handle, created)
    }

    fn snapshot_handles(&self) -> Vec<Arc<Mutex<Lexeme>>> {
        let lexemes = self.lexemes.read().unwrap_or_else(PoisonError::into_inner);
        lexemes.values().cloned().collect()
    }

    /// A snapshot of the lexeme for (language, phrase), if one exists.
    pub fn get(&self, language: &str, phrase: &str) -> Option<Lexeme> {
        let handle = self.handle(&LexemeKey::new(language, phrase))?;
        let lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Some(lexeme.clone())
    }

    /// Fetch a lexeme, creating and persisting an empty one on first use.
    /// `None` for the language means the base language.
    pub fn get_or_create(&self, language: Option<&str>, phrase: &str) -> Result<Lexeme, DictionaryError> {
        let language = self.resolve_language(language);
        let key = LexemeKey::new(language, phrase);
        loop {
            let (handle, created) = self.entry(language, phrase);
            let lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&key, &handle) {
                continue;
            }
            if created {
                if let Err(e) = self.store.save_lexeme(&lexeme) {
                    let mut lexemes = self.lexemes.write().unwrap_or_else(PoisonError::into_inner);
                    lexemes.remove(&key);
                    return Err(e.into());
                }
                debug!("created lexeme {}", key);
            }
            return Ok(lexeme.clone());
        }
    }

    /// Add a form to the lexeme named by its phrase, creating the lexeme if needed.
    ///
    /// Returns the stored form: either the new one with its assigned form
    /// group, or an existing same-sense form augmented with the newcomer's
    /// relations.
    pub fn add_form(&self, form: Dictata) -> Result<Dictata, DictionaryError> {
        let language = self.resolve_language(Some(&form.language)).to_string();
        let lexeme_key = LexemeKey::new(&language, &form.phrase);

        let stored = loop {
            let (handle, _) = self.entry(&language, &form.phrase);
            let mut lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&lexeme_key, &handle) {
                continue;
            }
            let mut updated = lexeme.clone();
            let (stored, changed) = updated.add_form(form.clone());
            if changed {
                self.store.save_lexeme(&updated)?;
                *lexeme = updated;
                debug!("stored form {}", stored.key());
            }
            break stored;
        };

        if stored.language == self.base_language {
            let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
            index
                .entry(index_key(stored.lexical_type, &stored.phrase))
                .or_insert_with(|| stored.key());
        }
        Ok(stored)
    }

    /// Find a form by type within a lexeme; a negative form group means "first of that type".
    pub fn get_form(
        &self,
        language: &str,
        phrase: &str,
        lexical_type: LexicalType,
        form_group: i16,
    ) -> Option<Dictata> {
        let handle = self.handle(&LexemeKey::new(language, phrase))?;
        let lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
        lexeme.get_form(lexical_type, form_group).cloned()
    }

    pub fn get_dictata(&self, key: &DictataKey) -> Option<Dictata> {
        let handle = self.handle(&LexemeKey::new(&key.language, &key.phrase))?;
        let lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
        lexeme.find(key).cloned()
    }

    /// Resolve a composite "{type}_{phrase}" key against base-language forms.
    pub fn lookup(&self, composite: &str) -> Option<Dictata> {
        let key = {
            let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
            index.get(&composite.trim().to_lowercase()).cloned()?
        };
        self.get_dictata(&key)
    }

    /// Replace a stored form (matched by key) with `form`.
    pub fn update_form(&self, form: Dictata) -> Result<(), DictionaryError> {
        let key = form.key();
        let lexeme_key = LexemeKey::new(&key.language, &key.phrase);
        loop {
            let handle = self
                .handle(&lexeme_key)
                .ok_or_else(|| DictionaryError::NotFound(key.to_string()))?;

            let mut lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&lexeme_key, &handle) {
                continue;
            }
            let mut updated = lexeme.clone();
            let slot = updated
                .find_mut(&key)
                .ok_or_else(|| DictionaryError::NotFound(key.to_string()))?;
            *slot = form;
            self.store.save_lexeme(&updated)?;
            *lexeme = updated;
            return Ok(());
        }
    }

    /// Link two forms in both directions and persist both sides.
    pub fn relate(&self, a: &DictataKey, b: &DictataKey, relation: Relation) -> Result<(), DictionaryError> {
        if a == b {
            return Ok(());
        }
        for key in [a, b] {
            if self.get_dictata(key).is_none() {
                return Err(DictionaryError::NotFound(key.to_string()));
            }
        }
        self.link(a, b, relation)?;
        self.link(b, a, relation)
    }

    fn link(&self, from: &DictataKey, to: &DictataKey, relation: Relation) -> Result<(), DictionaryError> {
        let lexeme_key = LexemeKey::new(&from.language, &from.phrase);
        loop {
            let handle = self
                .handle(&lexeme_key)
                .ok_or_else(|| DictionaryError::NotFound(from.to_string()))?;

            let mut lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&lexeme_key, &handle) {
                continue;
            }
            let mut updated = lexeme.clone();
            let form = updated
                .find_mut(from)
                .ok_or_else(|| DictionaryError::NotFound(from.to_string()))?;
            if !form.relations_mut(relation).insert(to.clone()) {
                return Ok(());
            }
            self.store.save_lexeme(&updated)?;
            *lexeme = updated;
            return Ok(());
        }
    }

    /// Record that a lexeme's thesaurus relations have been imported.
    pub fn mark_syn_mapped(&self, language: &str, phrase: &str) -> Result<(), DictionaryError> {
        let lexeme_key = LexemeKey::new(language, phrase);
        loop {
            let handle = self
                .handle(&lexeme_key)
                .ok_or_else(|| DictionaryError::NotFound(lexeme_key.to_string()))?;

            let mut lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&lexeme_key, &handle) {
                continue;
            }
            if lexeme.is_syn_mapped {
                return Ok(());
            }
            let mut updated = lexeme.clone();
            updated.is_syn_mapped = true;
            self.store.save_lexeme(&updated)?;
            *lexeme = updated;
            return Ok(());
        }
    }

    pub fn add_phrase(&self, phrase: DictataPhrase) -> Result<(), DictionaryError> {
        self.store.save_phrase(&phrase)?;
        let mut phrases = self.phrases.write().unwrap_or_else(PoisonError::into_inner);
        phrases.insert(phrase.key(), phrase);
        Ok(())
    }

    pub fn get_phrase(&self, key: &PhraseKey) -> Option<DictataPhrase> {
        let phrases = self.phrases.read().unwrap_or_else(PoisonError::into_inner);
        phrases.get(key).cloned()
    }

    /// Remove one form, then strip it from every other form and phrase.
    pub fn remove_dictata(&self, key: &DictataKey) -> Result<RemovalReport, DictionaryError> {
        let mut report = RemovalReport::default();

        let lexeme_key = LexemeKey::new(&key.language, &key.phrase);
        while let Some(handle) = self.handle(&lexeme_key) {
            let mut lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&lexeme_key, &handle) {
                continue;
            }
            let mut updated = lexeme.clone();
            if updated.remove_form(key).is_some() {
                self.store.save_lexeme(&updated)?;
                *lexeme = updated;
                report.removed = true;
                debug!("removed form {}", key);
            }
            let replacement = lexeme.get_form(key.lexical_type, -1).map(|f| f.key());
            drop(lexeme);
            self.unindex(key, replacement);
            break;
        }

        let forms: BTreeSet<DictataKey> = [key.clone()].into_iter().collect();
        self.cascade(&forms, &mut report);
        Ok(report)
    }

    /// Remove a whole lexeme, then strip its forms from everything else.
    pub fn remove_lexeme(&self, language: &str, phrase: &str) -> Result<RemovalReport, DictionaryError> {
        let key = LexemeKey::new(language, phrase);
        let mut report = RemovalReport::default();

        // The lexeme's lock is held across the store delete and the cache
        // removal, so no writer can slip a stale copy back in between.
        let mut forms = BTreeSet::new();
        while let Some(handle) = self.handle(&key) {
            let lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&key, &handle) {
                continue;
            }
            self.store.remove_lexeme(&key)?;
            {
                let mut lexemes = self.lexemes.write().unwrap_or_else(PoisonError::into_inner);
                lexemes.remove(&key);
            }
            forms.extend(lexeme.word_forms.iter().map(|f| f.key()));
            drop(lexeme);

            for form in &forms {
                self.unindex(form, None);
            }
            report.removed = true;
            debug!("removed lexeme {}", key);
            break;
        }

        self.cascade(&forms, &mut report);
        Ok(report)
    }

    fn unindex(&self, removed: &DictataKey, replacement: Option<DictataKey>) {
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let composite = index_key(removed.lexical_type, &removed.phrase);
        if index.get(&composite) == Some(removed) {
            match replacement {
                Some(next) if removed.language == self.base_language => {
                    index.insert(composite, next);
                }
                _ => {
                    index.remove(&composite);
                }
            }
        }
    }

    /// Best-effort reference sweep. Phrases built from a removed form are
    /// removed too. Failures are logged and counted, never returned.
    fn cascade(&self, forms: &BTreeSet<DictataKey>, report: &mut RemovalReport) {
        if forms.is_empty() {
            return;
        }

        let mut dead_phrases = BTreeSet::new();
        let phrase_snapshot: Vec<DictataPhrase> = {
            let phrases = self.phrases.read().unwrap_or_else(PoisonError::into_inner);
            phrases.values().cloned().collect()
        };
        for phrase in phrase_snapshot {
            let key = phrase.key();
            if phrase.contains_any(forms) {
                match self.store.remove_phrase(&key) {
                    Ok(()) => {
                        let mut phrases = self.phrases.write().unwrap_or_else(PoisonError::into_inner);
                        phrases.remove(&key);
                        report.touched += 1;
                    }
                    Err(e) => {
                        warn!("failed to remove phrase {} during cascade: {}", key, e);
                        report.failures += 1;
                    }
                }
                dead_phrases.insert(key);
                continue;
            }

            let mut updated = phrase;
            if updated.strip_references(forms) {
                match self.store.save_phrase(&updated) {
                    Ok(()) => {
                        let mut phrases = self.phrases.write().unwrap_or_else(PoisonError::into_inner);
                        phrases.insert(key, updated);
                        report.touched += 1;
                    }
                    Err(e) => {
                        warn!("failed to clean phrase {} during cascade: {}", key, e);
                        report.failures += 1;
                    }
                }
            }
        }

        for handle in self.snapshot_handles() {
            let mut lexeme = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(&lexeme.key(), &handle) {
                continue;
            }
            let mut updated = lexeme.clone();
            let mut changed = false;
            for form in &mut updated.word_forms {
                changed |= form.strip_references(forms, &dead_phrases);
            }
            if !changed {
                continue;
            }
            match self.store.save_lexeme(&updated) {
                Ok(()) => {
                    *lexeme = updated;
                    report.touched += 1;
                }
                Err(e) => {
                    warn!("failed to clean lexeme {} during cascade: {}", lexeme.key(), e);
                    report.failures += 1;
                }
            }
        }
    }

    /// Snapshots of every lexeme, ordered by key.
    pub fn lexemes(&self) -> Vec<Lexeme> {
        let mut all: Vec<Lexeme> = self
            .snapshot_handles()
            .iter()
            .map(|h| h.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        all.sort_by_key(|l| l.key());
        all
    }

    /// Every word form across every lexeme.
    pub fn all_forms(&self) -> Vec<Dictata> {
        self.lexemes()
            .into_iter()
            .flat_map(|l| l.word_forms)
            .collect()
    }

    pub fn phrases(&self) -> Vec<DictataPhrase> {
        let phrases = self.phrases.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<DictataPhrase> = phrases.values().cloned().collect();
        all.sort_by_key(|p| p.key());
        all
    }
}
