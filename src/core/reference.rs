/// Dictionary and thesaurus lookups against an external reference service.
///
/// Used to seed the registry with words it has never seen. Every failure is
/// logged and reported as "no entry"; lookups are capped per endpoint.

use log::{debug, warn};
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::core::config::ReferenceConfig;
use crate::core::dictionary::Dictionary;
use crate::schema::dictata::{Dictata, Relation};
use crate::schema::lexical::LexicalType;

const DICTIONARY_ENDPOINT: &str = "https://www.dictionaryapi.com/api/v3/references/collegiate/json/";
const THESAURUS_ENDPOINT: &str = "https://www.dictionaryapi.com/api/v3/references/thesaurus/json/";

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("reference service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed reference response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryMeta {
    /// Headword id, e.g. "sword" or "sword:2".
    pub id: String,
    #[serde(default)]
    pub stems: Vec<String>,
    #[serde(default)]
    pub offensive: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DictionaryEntry {
    pub meta: EntryMeta,
    /// Functional label ("noun", "transitive verb", ...).
    #[serde(default)]
    pub fl: Option<String>,
    #[serde(default)]
    pub shortdef: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThesaurusMeta {
    pub id: String,
    /// Synonym groups, one per sense.
    #[serde(default)]
    pub syns: Vec<Vec<String>>,
    #[serde(default)]
    pub ants: Vec<Vec<String>>,
    #[serde(default)]
    pub offensive: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThesaurusEntry {
    pub meta: ThesaurusMeta,
    #[serde(default)]
    pub fl: Option<String>,
    #[serde(default)]
    pub shortdef: Vec<String>,
}

/// The headword an id refers to: homograph suffixes and digits removed.
pub fn headword(id: &str) -> String {
    let base = id.split(':').next().unwrap_or(id);
    base.chars()
        .filter(|c| !c.is_ascii_digit() && !matches!(c, '-' | '_' | '#'))
        .collect()
}

/// Entries whose headword matches `word`, both sides normalized by
/// `headword`. Non-object elements (the service
/// answers unknown words with a list of spelling suggestions) are skipped.
fn matching_entries<T, F>(body: &str, word: &str, id_of: F) -> Result<Vec<T>, ReferenceError>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> &str,
{
    let raw: Vec<serde_json::Value> = serde_json::from_str(body)?;
    Ok(raw
        .into_iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value::<T>(v).ok())
        .filter(|e| headword(id_of(e)).eq_ignore_ascii_case(&headword(word)))
        .collect())
}

pub fn parse_dictionary_response(body: &str, word: &str) -> Result<Option<DictionaryEntry>, ReferenceError> {
    Ok(matching_entries(body, word, |e: &DictionaryEntry| e.meta.id.as_str())?
        .into_iter()
        .next())
}

pub fn parse_thesaurus_response(body: &str, word: &str) -> Result<Option<ThesaurusEntry>, ReferenceError> {
    Ok(matching_entries(body, word, |e: &ThesaurusEntry| e.meta.id.as_str())?
        .into_iter()
        .next())
}

/// A source of canonical word data.
pub trait WordReference: Send + Sync {
    fn dictionary_entry(&self, word: &str) -> Option<DictionaryEntry>;
    fn thesaurus_entry(&self, word: &str) -> Option<ThesaurusEntry>;
}

/// Client for the Merriam-Webster collegiate dictionary and thesaurus APIs.
pub struct MerriamWebster {
    client: reqwest::blocking::Client,
    dictionary_key: String,
    thesaurus_key: String,
    max_attempts: u32,
    dictionary_attempts: AtomicU32,
    thesaurus_attempts: AtomicU32,
}

impl MerriamWebster {
    pub fn new(config: &ReferenceConfig) -> Result<Self, ReferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            dictionary_key: config.dictionary_key.clone(),
            thesaurus_key: config.thesaurus_key.clone(),
            max_attempts: config.max_attempts,
            dictionary_attempts: AtomicU32::new(0),
            thesaurus_attempts: AtomicU32::new(0),
        })
    }

    pub fn dictionary_attempts(&self) -> u32 {
        self.dictionary_attempts.load(Ordering::SeqCst)
    }

    pub fn thesaurus_attempts(&self) -> u32 {
        self.thesaurus_attempts.load(Ordering::SeqCst)
    }

    /// Claim one request from `counter`; false once the cap is reached.
    fn take_attempt(&self, counter: &AtomicU32) -> bool {
        let max = self.max_attempts;
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .is_ok()
    }

    fn fetch(&self, endpoint: &str, word: &str, key: &str) -> Result<String, ReferenceError> {
        let response = self
            .client
            .get(format!("{}{}", endpoint, word.trim()))
            .query(&[("key", key)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;
        if !response.status().is_success() {
            return Err(ReferenceError::Status(response.status()));
        }
        Ok(response.text()?)
    }
}

impl WordReference for MerriamWebster {
    fn dictionary_entry(&self, word: &str) -> Option<DictionaryEntry> {
        if !self.take_attempt(&self.dictionary_attempts) {
            debug!("dictionary lookup cap of {} reached", self.max_attempts);
            return None;
        }
        match self
            .fetch(DICTIONARY_ENDPOINT, word, &self.dictionary_key)
            .and_then(|body| parse_dictionary_response(&body, word))
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!("dictionary lookup for {:?} failed: {}", word, e);
                None
            }
        }
    }

    fn thesaurus_entry(&self, word: &str) -> Option<ThesaurusEntry> {
        if !self.take_attempt(&self.thesaurus_attempts) {
            debug!("thesaurus lookup cap of {} reached", self.max_attempts);
            return None;
        }
        match self
            .fetch(THESAURUS_ENDPOINT, word, &self.thesaurus_key)
            .and_then(|body| parse_thesaurus_response(&body, word))
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!("thesaurus lookup for {:?} failed: {}", word, e);
                None
            }
        }
    }
}

/// Register `word` in the base language from its reference entry, then link
/// the thesaurus's synonyms and antonyms as forms of the same type.
pub fn import_word(dictionary: &Dictionary, reference: &dyn WordReference, word: &str) -> Option<Dictata> {
    let entry = reference.dictionary_entry(word)?;
    let lexical_type = entry.fl.as_deref().and_then(LexicalType::from_label)?;

    let mut form = Dictata::new(dictionary.base_language(), lexical_type, word);
    form.vulgar = entry.meta.offensive;
    let stored = match dictionary.add_form(form) {
        Ok(stored) => stored,
        Err(e) => {
            warn!("could not store imported word {:?}: {}", word, e);
            return None;
        }
    };

    let mapped = dictionary
        .get(&stored.language, &stored.phrase)
        .is_some_and(|lexeme| lexeme.is_syn_mapped);
    if mapped {
        debug!("{:?} already has its thesaurus relations", word);
        return dictionary.get_dictata(&stored.key());
    }

    if let Some(thesaurus) = reference.thesaurus_entry(word) {
        let groups = [
            (Relation::Synonym, &thesaurus.meta.syns),
            (Relation::Antonym, &thesaurus.meta.ants),
        ];
        for (relation, words) in groups {
            for related in words.iter().flatten() {
                if related.eq_ignore_ascii_case(word) {
                    continue;
                }
                let other = Dictata::new(dictionary.base_language(), lexical_type, related);
                let linked = dictionary
                    .add_form(other)
                    .and_then(|other| dictionary.relate(&stored.key(), &other.key(), relation));
                if let Err(e) = linked {
                    warn!("could not link {:?} to {:?}: {}", word, related, e);
                }
            }
        }
        if let Err(e) = dictionary.mark_syn_mapped(&stored.language, &stored.phrase) {
            warn!("could not mark {:?} as mapped: {}", word, e);
        }
    }

    dictionary.get_dictata(&stored.key())
}
