/// Word-form persistence backends.
///
/// The registry talks to storage only through `WordStore`; lexemes and
/// phrases are saved whole, one record per key.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::schema::dictata::{DictataPhrase, PhraseKey};
use crate::schema::lexeme::{Lexeme, LexemeKey};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Key-value persistence for lexemes and phrases.
///
/// Removing an absent record is not an error.
pub trait WordStore: Send + Sync {
    fn load_lexemes(&self) -> Result<Vec<Lexeme>, StoreError>;
    fn get_lexeme(&self, key: &LexemeKey) -> Result<Option<Lexeme>, StoreError>;
    fn save_lexeme(&self, lexeme: &Lexeme) -> Result<(), StoreError>;
    fn remove_lexeme(&self, key: &LexemeKey) -> Result<(), StoreError>;
    fn load_phrases(&self) -> Result<Vec<DictataPhrase>, StoreError>;
    fn save_phrase(&self, phrase: &DictataPhrase) -> Result<(), StoreError>;
    fn remove_phrase(&self, key: &PhraseKey) -> Result<(), StoreError>;
}

/// Volatile store; the default when no directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lexemes: Mutex<FxHashMap<LexemeKey, Lexeme>>,
    phrases: Mutex<FxHashMap<PhraseKey, DictataPhrase>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WordStore for MemoryStore {
    fn load_lexemes(&self) -> Result<Vec<Lexeme>, StoreError> {
        let lexemes = self.lexemes.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<Lexeme> = lexemes.values().cloned().collect();
        all.sort_by_key(|l| l.key());
        Ok(all)
    }

    fn get_lexeme(&self, key: &LexemeKey) -> Result<Option<Lexeme>, StoreError> {
        let lexemes = self.lexemes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(lexemes.get(key).cloned())
    }

    fn save_lexeme(&self, lexeme: &Lexeme) -> Result<(), StoreError> {
        let mut lexemes = self.lexemes.lock().unwrap_or_else(PoisonError::into_inner);
        lexemes.insert(lexeme.key(), lexeme.clone());
        Ok(())
    }

    fn remove_lexeme(&self, key: &LexemeKey) -> Result<(), StoreError> {
        let mut lexemes = self.lexemes.lock().unwrap_or_else(PoisonError::into_inner);
        lexemes.remove(key);
        Ok(())
    }

    fn load_phrases(&self) -> Result<Vec<DictataPhrase>, StoreError> {
        let phrases = self.phrases.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<DictataPhrase> = phrases.values().cloned().collect();
        all.sort_by_key(|p| p.key());
        Ok(all)
    }

    fn save_phrase(&self, phrase: &DictataPhrase) -> Result<(), StoreError> {
        let mut phrases = self.phrases.lock().unwrap_or_else(PoisonError::into_inner);
        phrases.insert(phrase.key(), phrase.clone());
        Ok(())
    }

    fn remove_phrase(&self, key: &PhraseKey) -> Result<(), StoreError> {
        let mut phrases = self.phrases.lock().unwrap_or_else(PoisonError::into_inner);
        phrases.remove(key);
        Ok(())
    }
}

/// One pretty-printed RON file per record:
/// `<root>/lexemes/<key>.ron` and `<root>/phrases/<key>.ron`.
#[derive(Debug, Clone)]
pub struct RonStore {
    root: PathBuf,
}

impl RonStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("lexemes"))?;
        std::fs::create_dir_all(root.join("phrases"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lexeme_path(&self, key: &LexemeKey) -> PathBuf {
        self.root
            .join("lexemes")
            .join(format!("{}.ron", file_stem(&key.to_string())))
    }

    fn phrase_path(&self, key: &PhraseKey) -> PathBuf {
        self.root
            .join("phrases")
            .join(format!("{}.ron", file_stem(&key.to_string())))
    }
}

/// Encode a key as a portable file stem. Anything but ASCII alphanumerics and
/// '-' becomes `_xxxx`, or `_uxxxxxx` above U+FFFF, so every escape has a fixed
/// width and distinct keys never share a file.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for c in key.chars() {
        let code = c as u32;
        if c.is_ascii_alphanumeric() || c == '-' {
            stem.push(c);
        } else if code > 0xFFFF {
            stem.push_str(&format!("_u{:06x}", code));
        } else {
            stem.push_str(&format!("_{:04x}", code));
        }
    }
    stem
}

fn write_ron<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let serialized = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, serialized)?;
    Ok(())
}

fn remove_file_if_present(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Read every `.ron` file in `dir`, in file-name order. A missing directory is empty.
fn load_ron_files_from_dir<T>(dir: &Path) -> Result<Vec<T>, StoreError>
where
    T: serde::de::DeserializeOwned,
{
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = std::fs::read_to_string(&path)?;
        records.push(ron::from_str(&contents)?);
    }
    Ok(records)
}

impl WordStore for RonStore {
    fn load_lexemes(&self) -> Result<Vec<Lexeme>, StoreError> {
        load_ron_files_from_dir(&self.root.join("lexemes"))
    }

    fn get_lexeme(&self, key: &LexemeKey) -> Result<Option<Lexeme>, StoreError> {
        let path = self.lexeme_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(ron::from_str(&contents)?))
    }

    fn save_lexeme(&self, lexeme: &Lexeme) -> Result<(), StoreError> {
        write_ron(&self.lexeme_path(&lexeme.key()), lexeme)
    }

    fn remove_lexeme(&self, key: &LexemeKey) -> Result<(), StoreError> {
        remove_file_if_present(&self.lexeme_path(key))
    }

    fn load_phrases(&self) -> Result<Vec<DictataPhrase>, StoreError> {
        load_ron_files_from_dir(&self.root.join("phrases"))
    }

    fn save_phrase(&self, phrase: &DictataPhrase) -> Result<(), StoreError> {
        write_ron(&self.phrase_path(&phrase.key()), phrase)
    }

    fn remove_phrase(&self, key: &PhraseKey) -> Result<(), StoreError> {
        remove_file_if_present(&self.phrase_path(key))
    }
}
