use serde::{Deserialize, Serialize};
use std::fmt;

/// The general part of speech a word belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LexicalType {
    None,
    Noun,
    ProperNoun,
    Pronoun,
    Verb,
    Adjective,
    Adverb,
    Conjunction,
    Interjection,
    Preposition,
    Article,
    Number,
}

impl LexicalType {
    /// Returns the tag string for this type (e.g., "lex:noun").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::None => "lex:none",
            Self::Noun => "lex:noun",
            Self::ProperNoun => "lex:proper_noun",
            Self::Pronoun => "lex:pronoun",
            Self::Verb => "lex:verb",
            Self::Adjective => "lex:adjective",
            Self::Adverb => "lex:adverb",
            Self::Conjunction => "lex:conjunction",
            Self::Interjection => "lex:interjection",
            Self::Preposition => "lex:preposition",
            Self::Article => "lex:article",
            Self::Number => "lex:number",
        }
    }

    /// Connective words render ahead of the words they modify.
    pub fn is_connective(&self) -> bool {
        matches!(self, Self::Conjunction | Self::Interjection)
    }

    /// Map a dictionary "functional label" ("noun", "transitive verb", ...) to a type.
    pub fn from_label(label: &str) -> Option<LexicalType> {
        let label = label.trim().to_lowercase();
        let kind = match label.as_str() {
            "noun" | "plural noun" | "noun phrase" => Self::Noun,
            "proper noun" | "biographical name" | "geographical name" => Self::ProperNoun,
            "pronoun" => Self::Pronoun,
            "adjective" => Self::Adjective,
            "adverb" => Self::Adverb,
            "conjunction" => Self::Conjunction,
            "interjection" => Self::Interjection,
            "preposition" => Self::Preposition,
            "definite article" | "indefinite article" | "article" => Self::Article,
            "number" | "numeral" => Self::Number,
            other if other.ends_with("verb") => Self::Verb,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for LexicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The function a word serves within a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrammaticalRole {
    Subject,
    Verb,
    DirectObject,
    IndirectObject,
    Descriptive,
}

/// Time tensing of a word or sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LexicalTense {
    #[default]
    None,
    Past,
    Present,
    Future,
}

/// The personage a sentence is told from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NarrativePerspective {
    #[default]
    None,
    FirstPerson,
    SecondPerson,
    ThirdPerson,
}

/// How aggressively a grammar tree is split into sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NarrativeNormalization {
    /// One sentence per subject.
    #[default]
    Normal,
    /// Short declarative sentences, one per descriptor.
    Hemingway,
    /// Reserved; renders exactly like `Normal`.
    RunOn,
}

/// The kind of sentence produced by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SentenceType {
    #[default]
    Statement,
    Question,
    Exclamation,
}

impl SentenceType {
    /// Trailing punctuation mark for this sentence type.
    pub fn punctuation(&self) -> &'static str {
        match self {
            Self::Statement => ".",
            Self::Question => "?",
            Self::Exclamation => "!",
        }
    }

    /// Leading (inverted) punctuation mark used by languages that open sentences.
    pub fn inverted_punctuation(&self) -> Option<&'static str> {
        match self {
            Self::Statement => None,
            Self::Question => Some("¿"),
            Self::Exclamation => Some("¡"),
        }
    }
}
