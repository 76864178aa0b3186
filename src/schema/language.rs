use serde::{Deserialize, Serialize};

use super::lexical::SentenceType;

/// Collapses a pair of adjacent words into a contracted form ("do not" → "don't").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractionRule {
    pub first: String,
    pub second: String,
    pub contraction: String,
}

/// What must follow a word for a transformation rule to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowingSound {
    Vowel,
    Consonant,
    Any,
}

/// Swaps one word for another depending on the next word ("a apple" → "an apple").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    pub origin: String,
    pub transformed: String,
    pub when_followed_by: FollowingSound,
}

/// A language the dictionary holds words for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    /// Code understood by the translation provider ("en", "es").
    pub code: String,
    /// Usable for player-facing text.
    #[serde(default = "default_true")]
    pub ui_only: bool,
    /// Approved for use.
    #[serde(default = "default_true")]
    pub suitable_for_use: bool,
    #[serde(default)]
    pub gendered: bool,
    /// Sentences open with an (inverted) punctuation mark.
    #[serde(default)]
    pub precedent_punctuation: bool,
    /// Sentences close with a punctuation mark.
    #[serde(default = "default_true")]
    pub antecedent_punctuation: bool,
    #[serde(default)]
    pub base_words: Vec<String>,
    #[serde(default)]
    pub contraction_rules: Vec<ContractionRule>,
    #[serde(default)]
    pub transformation_rules: Vec<TransformationRule>,
}

fn default_true() -> bool {
    true
}

impl Language {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            ui_only: true,
            suitable_for_use: true,
            gendered: false,
            precedent_punctuation: false,
            antecedent_punctuation: true,
            base_words: Vec::new(),
            contraction_rules: Vec::new(),
            transformation_rules: Vec::new(),
        }
    }

    /// Wrap a rendered sentence in this language's punctuation.
    pub fn punctuate(&self, sentence_type: SentenceType, sentence: &str) -> String {
        let mut out = String::with_capacity(sentence.len() + 4);
        if self.precedent_punctuation {
            if let Some(mark) = sentence_type.inverted_punctuation() {
                out.push_str(mark);
            }
        }
        out.push_str(sentence);
        if self.antecedent_punctuation {
            out.push_str(sentence_type.punctuation());
        }
        out
    }

    /// Apply transformation rules, then contraction rules, word by word.
    ///
    /// Only single-space word boundaries are rewritten; other whitespace is kept.
    pub fn finish(&self, text: &str) -> String {
        if self.contraction_rules.is_empty() && self.transformation_rules.is_empty() {
            return text.to_string();
        }

        let words: Vec<&str> = text.split(' ').collect();
        let mut transformed: Vec<String> = Vec::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            let next = words[i + 1..].iter().find(|w| !w.is_empty()).copied();
            transformed.push(self.transform_word(word, next));
        }

        let mut out: Vec<String> = Vec::with_capacity(transformed.len());
        let mut i = 0;
        while i < transformed.len() {
            if i + 1 < transformed.len() {
                if let Some(rule) = self.contraction_for(&transformed[i], &transformed[i + 1]) {
                    out.push(match_case(&transformed[i], &rule.contraction));
                    i += 2;
                    continue;
                }
            }
            out.push(transformed[i].clone());
            i += 1;
        }
        out.join(" ")
    }

    fn transform_word(&self, word: &str, next: Option<&str>) -> String {
        for rule in &self.transformation_rules {
            if !word.eq_ignore_ascii_case(&rule.origin) {
                continue;
            }
            let fires = match (rule.when_followed_by, next) {
                (FollowingSound::Any, _) => true,
                (FollowingSound::Vowel, Some(n)) => starts_with_vowel(n),
                (FollowingSound::Consonant, Some(n)) => !starts_with_vowel(n),
                (_, None) => false,
            };
            if fires {
                return match_case(word, &rule.transformed);
            }
        }
        word.to_string()
    }

    fn contraction_for(&self, first: &str, second: &str) -> Option<&ContractionRule> {
        self.contraction_rules.iter().find(|rule| {
            first.eq_ignore_ascii_case(&rule.first) && second.eq_ignore_ascii_case(&rule.second)
        })
    }
}

fn starts_with_vowel(word: &str) -> bool {
    word.chars()
        .find(|c| c.is_alphabetic())
        .map(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
        .unwrap_or(false)
}

/// Carry the capitalisation of the first letter of `original` over to `replacement`.
fn match_case(original: &str, replacement: &str) -> String {
    let upper = original.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
    if !upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_english() -> Language {
        let mut lang = Language::new("English", "en");
        lang.contraction_rules.push(ContractionRule {
            first: "do".to_string(),
            second: "not".to_string(),
            contraction: "don't".to_string(),
        });
        lang.transformation_rules.push(TransformationRule {
            origin: "a".to_string(),
            transformed: "an".to_string(),
            when_followed_by: FollowingSound::Vowel,
        });
        lang
    }

    #[test]
    fn punctuate_statement() {
        let lang = Language::new("English", "en");
        assert_eq!(lang.punctuate(SentenceType::Statement, "you drop it"), "you drop it.");
    }

    #[test]
    fn punctuate_precedent() {
        let mut lang = Language::new("Spanish", "es");
        lang.precedent_punctuation = true;
        assert_eq!(lang.punctuate(SentenceType::Question, "qué"), "¿qué?");
        assert_eq!(lang.punctuate(SentenceType::Statement, "sí"), "sí.");
    }

    #[test]
    fn punctuate_without_antecedent() {
        let mut lang = Language::new("Glyphic", "gl");
        lang.antecedent_punctuation = false;
        assert_eq!(lang.punctuate(SentenceType::Exclamation, "run"), "run");
    }

    #[test]
    fn finish_transforms_before_vowel() {
        let lang = make_english();
        assert_eq!(lang.finish("you see a apple."), "you see an apple.");
        assert_eq!(lang.finish("you see a pear."), "you see a pear.");
        assert_eq!(lang.finish("A owl hoots."), "An owl hoots.");
    }

    #[test]
    fn finish_contracts_pairs() {
        let lang = make_english();
        assert_eq!(lang.finish("you do not move."), "you don't move.");
        assert_eq!(lang.finish("Do not move."), "Don't move.");
    }

    #[test]
    fn finish_without_rules_is_identity() {
        let lang = Language::new("English", "en");
        assert_eq!(lang.finish("npc spawned room  ."), "npc spawned room  .");
    }

    #[test]
    fn finish_keeps_double_spaces() {
        let lang = make_english();
        assert_eq!(lang.finish("a  egg"), "an  egg");
    }
}
