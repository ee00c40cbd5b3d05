//! Shared types for the idiom dictionary.
//!
//! A dictionary entry describes one surface realization of an idiomatic
//! expression as an ordered sequence of tagged [`Unit`]s rather than a
//! literal string, so a single entry covers tense, number and optional
//! wording variants ("kick the bucket" / "kicked the buckets").
//!
//! The corpus file stores three parallel lists per entry (`alt`, `runs`,
//! `word_forms`); loading folds them into one [`Unit`] per position so the
//! lists cannot drift out of alignment.
//!
//! ```rust
//! use idiom_types::Tag;
//!
//! let tag = Tag::from_str("o-constant").unwrap();
//! assert_eq!(tag, Tag::OConstant);
//! assert_eq!(tag.as_str(), "o-constant");
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a unit within an entry, as tagged in the corpus file.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Mandatory fixed word or phrase; the core of the idiom.
    #[serde(rename = "constant")]
    Constant,
    /// Optional fixed word, e.g. parenthetical alternate wording.
    #[serde(rename = "o-constant")]
    OConstant,
    /// Free slot ("someone", "something"); never matched literally.
    #[serde(rename = "variable")]
    Variable,
    /// Auxiliary verb that may precede the idiom ("be ~; get ~").
    #[serde(rename = "verb")]
    Verb,
    /// Leading article (a/an/the).
    #[serde(rename = "article")]
    Article,
    /// Marker token from the source book, stripped before matching.
    #[serde(rename = "asterisk")]
    Asterisk,
}

impl Tag {
    /// Parse a corpus tag string into an enum.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "constant" => Some(Tag::Constant),
            "o-constant" => Some(Tag::OConstant),
            "variable" => Some(Tag::Variable),
            "verb" => Some(Tag::Verb),
            "article" => Some(Tag::Article),
            "asterisk" => Some(Tag::Asterisk),
            _ => None,
        }
    }

    /// Emit the tag string used by the corpus file.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Constant => "constant",
            Tag::OConstant => "o-constant",
            Tag::Variable => "variable",
            Tag::Verb => "verb",
            Tag::Article => "article",
            Tag::Asterisk => "asterisk",
        }
    }

    /// Whether units with this tag are looked up literally in a sentence.
    ///
    /// `Variable` stands for arbitrary content and `Asterisk` is a source
    /// marker; neither participates in matching.
    pub fn is_matchable(self) -> bool {
        matches!(
            self,
            Tag::Constant | Tag::OConstant | Tag::Verb | Tag::Article
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character-offset interval of a match within a sentence.
///
/// Serialized as a two-element array to match the corpus conventions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.end)
    }
}

/// Provenance marker into the source corpus.
///
/// Not unique: duplicated entry variants generated at corpus build time
/// share the same range.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SourceRange(pub u32, pub u32);

/// One tagged position of an entry.
///
/// `forms` holds the accepted surface inflections, one list per
/// constituent word of `text` (the base word is always included). It is
/// `None` for `Variable` units, which the corpus file marks with an `"NA"`
/// sentinel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub tag: Tag,
    pub text: String,
    pub forms: Option<Vec<Vec<String>>>,
}

impl Unit {
    /// Constituent words of `text`, in order.
    pub fn constituents(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace()
    }

    pub fn constituent_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// One idiomatic expression variant from the dictionary.
///
/// Immutable after corpus load; the engine only reads entries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Unique stable id assigned at corpus build time.
    pub id: u32,
    pub range: SourceRange,
    pub phrase: String,
    pub phrase_html: String,
    pub definition: String,
    pub definition_html: String,
    pub units: Vec<Unit>,
    /// Legal linear word sequences a match must satisfy. Derived from
    /// `units`; regenerated at load, never hand-edited.
    pub patterns: HashSet<String>,
    pub multiple: bool,
    pub duplicate: bool,
}

impl DictionaryEntry {
    /// Number of mandatory fixed units.
    pub fn constant_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.tag == Tag::Constant)
            .count()
    }

    /// The constants-only baseline every pattern must build on.
    pub fn baseline(&self) -> String {
        let words: Vec<&str> = self
            .units
            .iter()
            .filter(|u| u.tag == Tag::Constant)
            .map(|u| u.text.as_str())
            .collect();
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_corpus_strings() {
        for s in [
            "constant",
            "o-constant",
            "variable",
            "verb",
            "article",
            "asterisk",
        ] {
            let tag = Tag::from_str(s).unwrap();
            assert_eq!(tag.as_str(), s);
        }
        assert_eq!(Tag::from_str("noun"), None);
    }

    #[test]
    fn matchable_tags_exclude_variable_and_asterisk() {
        assert!(Tag::Constant.is_matchable());
        assert!(Tag::Article.is_matchable());
        assert!(!Tag::Variable.is_matchable());
        assert!(!Tag::Asterisk.is_matchable());
    }

    #[test]
    fn span_serializes_as_pair() {
        let span = Span::new(3, 30);
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(json, "[3,30]");
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }

    #[test]
    fn baseline_joins_constants_in_order() {
        let entry = DictionaryEntry {
            id: 0,
            range: SourceRange(1, 2),
            phrase: String::new(),
            phrase_html: String::new(),
            definition: String::new(),
            definition_html: String::new(),
            units: vec![
                Unit {
                    tag: Tag::Verb,
                    text: "get".into(),
                    forms: Some(vec![vec!["get".into()]]),
                },
                Unit {
                    tag: Tag::Constant,
                    text: "free hand".into(),
                    forms: Some(vec![vec!["free".into()], vec!["hand".into()]]),
                },
                Unit {
                    tag: Tag::OConstant,
                    text: "with".into(),
                    forms: Some(vec![vec!["with".into()]]),
                },
            ],
            patterns: HashSet::new(),
            multiple: false,
            duplicate: false,
        };
        assert_eq!(entry.baseline(), "free hand");
        assert_eq!(entry.constant_count(), 1);
    }
}
