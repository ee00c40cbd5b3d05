//! Single-word occurrence scanning.
//!
//! A unit constituent matches wherever any of its accepted surface forms
//! occurs as a whole word, case-insensitively. The compiled alternation
//! comes from the corpus; this module adds the boundary discipline the
//! regex `\b` cannot express: internal apostrophes count as word
//! characters, so "dog" never matches inside "dog's".
//!
//! Pure and stateless; safe to call concurrently against a shared corpus.

use idiom_corpus::UnitMatcher;
use idiom_types::Span;

/// One accepted occurrence of a unit constituent.
///
/// `word` is the constituent's base form (the pattern vocabulary), not
/// the inflected text that matched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Occurrence {
    pub word: String,
    pub span: Span,
}

/// Every non-overlapping occurrence of the matcher's forms in `text`,
/// left to right.
pub fn find_occurrences(matcher: &UnitMatcher, text: &str) -> Vec<Occurrence> {
    matcher
        .regex
        .find_iter(text)
        .filter(|m| boundary_ok(text, m.start(), m.end()))
        .map(|m| Occurrence {
            word: matcher.word.clone(),
            span: Span::new(m.start(), m.end()),
        })
        .collect()
}

/// Occurrences in the raw sentence, falling back to the lemmatized
/// sentence when the raw scan finds nothing.
///
/// Spans from the fallback are relative to `lemma_text`.
pub fn occurrences_with_fallback(
    matcher: &UnitMatcher,
    sentence: &str,
    lemma_text: &str,
) -> Vec<Occurrence> {
    let raw = find_occurrences(matcher, sentence);
    if !raw.is_empty() {
        return raw;
    }
    find_occurrences(matcher, lemma_text)
}

/// Reject `\b` hits glued to another word through an apostrophe.
fn boundary_ok(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    if start >= 2 && is_apostrophe(bytes[start - 1]) && bytes[start - 2].is_ascii_alphanumeric() {
        return false;
    }
    if end + 1 < bytes.len() && is_apostrophe(bytes[end]) && bytes[end + 1].is_ascii_alphanumeric()
    {
        return false;
    }
    true
}

fn is_apostrophe(b: u8) -> bool {
    b == b'\''
}
