/// Narrative composition: grammar trees to prose.
///
/// `Display` renders one tree as a sentence fragment following the
/// role-specific templates; `describe` splits a tree into sentences under a
/// normalization policy and punctuates them.

use std::borrow::Cow;
use std::fmt;

use crate::core::lexica::Lexica;
use crate::schema::lexical::{
    GrammaticalRole, LexicalTense, LexicalType, NarrativeNormalization, NarrativePerspective,
    SentenceType,
};

/// How a list of rendered items is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitListType {
    /// "a, b, c"
    AllComma,
    /// "a and b and c"
    AllAnd,
    /// "a", "a and b", "a, b, and c"
    OxfordComma,
}

/// Join items in the given list style. Empty input yields an empty string.
pub fn comma_list<S: AsRef<str>>(items: &[S], style: SplitListType) -> String {
    let items: Vec<&str> = items.iter().map(|s| s.as_ref()).collect();
    match style {
        SplitListType::AllComma => items.join(", "),
        SplitListType::AllAnd => items.join(" and "),
        SplitListType::OxfordComma => match items.len() {
            0 => String::new(),
            1 => items[0].to_string(),
            2 => format!("{} and {}", items[0], items[1]),
            n => format!("{}, and {}", items[..n - 1].join(", "), items[n - 1]),
        },
    }
}

/// Knobs for sentence-level composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrativeOptions {
    pub normalization: NarrativeNormalization,
    /// 0-100; higher asks for more elaborate wording.
    pub verbosity: u8,
    pub tense: LexicalTense,
    pub perspective: NarrativePerspective,
    /// Carried for callers; not yet consulted when rendering.
    pub omit_name: bool,
}

impl Default for NarrativeOptions {
    fn default() -> Self {
        Self {
            normalization: NarrativeNormalization::Normal,
            verbosity: 50,
            tense: LexicalTense::Present,
            perspective: NarrativePerspective::SecondPerson,
            omit_name: true,
        }
    }
}

impl NarrativeOptions {
    pub fn with_normalization(mut self, normalization: NarrativeNormalization) -> Self {
        self.normalization = normalization;
        self
    }
}

/// One planned sentence: its type and the fragment that produces it.
#[derive(Debug, Clone)]
pub struct Sentence {
    pub sentence_type: SentenceType,
    pub fragment: Lexica,
}

/// Plain punctuation: the sentence followed by its type's closing mark.
pub fn default_punctuation(sentence_type: SentenceType, sentence: &str) -> String {
    format!("{}{}", sentence, sentence_type.punctuation())
}

fn render_all<'a, I>(nodes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Lexica>,
{
    nodes.into_iter().map(|n| n.to_string()).collect()
}

/// "{phrase} {connective }{descriptors}" or just the phrase when undecorated.
fn append_descriptors(phrase: &str, descriptors: &[&Lexica]) -> String {
    if descriptors.is_empty() {
        return phrase.to_string();
    }

    let decorative = render_all(
        descriptors
            .iter()
            .copied()
            .filter(|d| !d.lexical_type.is_connective()),
    );
    let connective = descriptors
        .iter()
        .find(|d| d.lexical_type.is_connective())
        .map(|d| format!("{} ", d))
        .unwrap_or_default();

    format!(
        "{} {}{}",
        phrase,
        connective,
        comma_list(&decorative, SplitListType::AllComma)
    )
}

impl fmt::Display for Lexica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_silent() {
            return Ok(());
        }

        let descriptors: Vec<&Lexica> = self
            .modifiers_with_role(GrammaticalRole::Descriptive)
            .collect();

        match self.role {
            GrammaticalRole::Descriptive => {
                if descriptors.is_empty() {
                    return write!(f, "{}", self.phrase);
                }
                let mods = comma_list(
                    &render_all(descriptors.iter().copied()),
                    SplitListType::AllComma,
                );
                if self.lexical_type.is_connective() {
                    write!(f, "{} {}", self.phrase, mods)
                } else {
                    write!(f, "{} {}", mods, self.phrase)
                }
            }
            GrammaticalRole::IndirectObject => {
                write!(f, "{}", append_descriptors(&self.phrase, &descriptors))
            }
            GrammaticalRole::DirectObject => {
                let described = append_descriptors(&self.phrase, &descriptors);
                let indirect = render_all(self.modifiers_with_role(GrammaticalRole::IndirectObject));
                if indirect.is_empty() {
                    write!(f, "{}", described)
                } else {
                    write!(
                        f,
                        "{} {}",
                        comma_list(&indirect, SplitListType::AllAnd),
                        described
                    )
                }
            }
            GrammaticalRole::Verb => {
                let adverbs = render_all(
                    descriptors
                        .iter()
                        .copied()
                        .filter(|d| d.lexical_type == LexicalType::Adverb),
                );
                let adjectives = render_all(
                    descriptors
                        .iter()
                        .copied()
                        .filter(|d| d.lexical_type == LexicalType::Adjective),
                );
                let adverbs = comma_list(&adverbs, SplitListType::AllComma);
                let adjectives = comma_list(&adjectives, SplitListType::OxfordComma);

                let objects = render_all(self.modifiers_with_role(GrammaticalRole::DirectObject));
                if objects.is_empty() {
                    write!(f, "{} {} {}", self.phrase, adverbs, adjectives)
                } else {
                    write!(
                        f,
                        "{} {} {} {}",
                        self.phrase,
                        comma_list(&objects, SplitListType::OxfordComma),
                        adverbs,
                        adjectives
                    )
                }
            }
            GrammaticalRole::Subject => {
                let described = append_descriptors(&self.phrase, &descriptors);
                let verbs = render_all(self.modifiers_with_role(GrammaticalRole::Verb));
                if verbs.is_empty() {
                    write!(f, "{}", described)
                } else {
                    write!(
                        f,
                        "{} {}",
                        described,
                        comma_list(&verbs, SplitListType::AllAnd)
                    )
                }
            }
        }
    }
}

impl Lexica {
    /// Plan the sentences this tree produces under the given options.
    ///
    /// Candidates are this node plus its direct Subject modifiers. Normal (and
    /// RunOn, which has no distinct behaviour yet) keeps each candidate whole.
    /// Hemingway emits a copy without descriptors, then one
    /// "<phrase> is <descriptor>" fragment per descriptor.
    pub fn sentences(&self, options: &NarrativeOptions) -> Vec<Sentence> {
        let mut candidates: Vec<&Lexica> = vec![self];
        candidates.extend(self.modifiers_with_role(GrammaticalRole::Subject));

        let mut plan = Vec::new();
        for candidate in candidates {
            let fragments = match options.normalization {
                NarrativeNormalization::Hemingway => hemingway_split(candidate),
                NarrativeNormalization::Normal | NarrativeNormalization::RunOn => {
                    vec![candidate.clone()]
                }
            };
            plan.extend(fragments.into_iter().map(|fragment| Sentence {
                sentence_type: SentenceType::Statement,
                fragment,
            }));
        }
        plan
    }

    /// Compose this tree into punctuated prose.
    pub fn describe(&self, options: &NarrativeOptions) -> String {
        self.describe_with(options, &default_punctuation)
    }

    /// `describe` with a caller-supplied punctuation rule.
    pub fn describe_with(
        &self,
        options: &NarrativeOptions,
        punctuate: &dyn Fn(SentenceType, &str) -> String,
    ) -> String {
        self.describe_mapped(options, &unchanged, punctuate)
    }

    /// `describe_with`, passing every planned fragment through `rewrite`
    /// just before it is rendered.
    ///
    /// Fragments are rewritten after planning, so words the planner adds
    /// itself (the Hemingway linking verb) are rewritten too.
    pub fn describe_mapped(
        &self,
        options: &NarrativeOptions,
        rewrite: &dyn Fn(&Lexica) -> Cow<'_, Lexica>,
        punctuate: &dyn Fn(SentenceType, &str) -> String,
    ) -> String {
        let rendered: Vec<String> = self
            .sentences(options)
            .iter()
            .map(|sentence| {
                if sentence.fragment == *self {
                    let fragment = rewrite(&sentence.fragment);
                    punctuate(sentence.sentence_type, &fragment.to_string())
                } else {
                    sentence.fragment.describe_mapped(options, rewrite, punctuate)
                }
            })
            .collect();
        rendered.join(" ")
    }
}

fn unchanged(fragment: &Lexica) -> Cow<'_, Lexica> {
    Cow::Borrowed(fragment)
}

fn hemingway_split(subject: &Lexica) -> Vec<Lexica> {
    let mut fragments = Vec::new();

    let has_action = subject
        .modifiers()
        .iter()
        .any(|m| m.role != GrammaticalRole::Descriptive && m.role != GrammaticalRole::Subject);
    let has_descriptors = subject.has_modifier_with_role(GrammaticalRole::Descriptive);

    if has_action || !has_descriptors {
        fragments.push(subject.reduced(|m| m.role != GrammaticalRole::Descriptive));
    }

    for descriptor in subject.modifiers_with_role(GrammaticalRole::Descriptive) {
        let mut split = subject.bare();
        split.try_modify(descriptor.clone()).try_modify_with(
            LexicalType::Conjunction,
            GrammaticalRole::Descriptive,
            "is",
        );
        fragments.push(split);
    }

    fragments
}
