//! Coarse candidate filter.
//!
//! First stage of the search: keep only entries whose mandatory fixed
//! words all occur somewhere in the sentence. Three tiers per word, each
//! cheaper than the next is thorough: literal substring, surface-form
//! regex, lemma-token membership. Multi-word constants are satisfied when
//! every constituent passes independently; no ordering or adjacency is
//! checked here. The filter over-approximates on purpose; its only job
//! is to shrink the set the fine matcher has to enumerate.

use idiom_corpus::{Corpus, UnitMatcher};
use idiom_types::Tag;

use crate::analyze::Analysis;

/// Indices of entries whose constants are all present in the sentence.
pub fn potential_matches(corpus: &Corpus, analysis: &Analysis) -> Vec<usize> {
    let mut candidates = Vec::new();
    for idx in 0..corpus.len() {
        let entry = corpus.entry(idx);
        let matchers = corpus.matchers(idx);

        let mut satisfied = 0usize;
        let mut required = 0usize;
        for (unit, unit_matchers) in entry.units.iter().zip(&matchers.units) {
            if unit.tag != Tag::Constant {
                continue;
            }
            required += 1;
            if constant_present(analysis, &unit.text, &unit_matchers.constituents) {
                satisfied += 1;
            }
        }

        if required > 0 && satisfied == required {
            candidates.push(idx);
        }
    }
    candidates
}

/// A constant unit is present when its whole text is a substring of the
/// sentence, or every constituent word passes the three-tier check on its
/// own. Constituents may match anywhere, in any order; the fine matcher
/// enforces ordering later.
fn constant_present(
    analysis: &Analysis,
    text: &str,
    constituents: &[Option<UnitMatcher>],
) -> bool {
    if analysis.sentence.contains(text) {
        return true;
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    words.iter().enumerate().all(|(c, word)| {
        let matcher = constituents.get(c).and_then(|m| m.as_ref());
        word_present(analysis, word, matcher)
    })
}

fn word_present(analysis: &Analysis, word: &str, matcher: Option<&UnitMatcher>) -> bool {
    if analysis.sentence.contains(word) {
        return true;
    }
    let Some(matcher) = matcher else {
        return false;
    };
    if matcher.regex.is_match(&analysis.sentence) {
        return true;
    }
    analysis
        .lemmas
        .iter()
        .any(|lemma| matcher.forms.iter().any(|f| f.eq_ignore_ascii_case(lemma)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{Analyzer, DefaultAnalyzer};
    use crate::testutil::{entry, small_corpus, unit};
    use idiom_types::Tag;

    fn analyze(sentence: &str) -> Analysis {
        DefaultAnalyzer::new().analyze(sentence).unwrap()
    }

    #[test]
    fn keeps_entries_whose_constants_all_occur() {
        let corpus = small_corpus();
        let analysis = analyze("The children are accustomed to eating late in the evening.");
        let candidates = potential_matches(&corpus, &analysis);
        let ids: Vec<u32> = candidates.iter().map(|i| corpus.entry(*i).id).collect();
        assert!(ids.contains(&1), "accustomed-to entry should survive");
        assert!(!ids.contains(&2), "bail-out entry should be dropped");
    }

    #[test]
    fn inflected_forms_satisfy_constants() {
        let corpus = small_corpus();
        let analysis = analyze("He kicked the buckets.");
        let candidates = potential_matches(&corpus, &analysis);
        let ids: Vec<u32> = candidates.iter().map(|i| corpus.entry(*i).id).collect();
        assert!(ids.contains(&3), "kick the bucket via word forms");
    }

    #[test]
    fn lemma_membership_is_the_last_tier() {
        // "geese" only reaches "goose" through lemmatization.
        let corpus = small_corpus();
        let analysis = analyze("The geese flew south.");
        let candidates = potential_matches(&corpus, &analysis);
        let ids: Vec<u32> = candidates.iter().map(|i| corpus.entry(*i).id).collect();
        assert!(ids.contains(&4));
    }

    #[test]
    fn partial_word_does_not_satisfy_multiword_constant() {
        let entries = vec![entry(
            10,
            (500, 501),
            "want for nothing",
            vec![unit(Tag::Constant, "want for nothing")],
        )];
        let corpus = idiom_corpus::Corpus::from_entries(entries).unwrap();
        let analysis = analyze("I want a sandwich.");
        assert!(potential_matches(&corpus, &analysis).is_empty());

        let analysis = analyze("They want for nothing these days.");
        assert_eq!(potential_matches(&corpus, &analysis).len(), 1);
    }

    #[test]
    fn multiword_constituents_may_match_out_of_order() {
        // Intentional over-approximation: order is the fine matcher's job.
        let entries = vec![entry(
            11,
            (600, 601),
            "free hand",
            vec![unit(Tag::Constant, "free hand")],
        )];
        let corpus = idiom_corpus::Corpus::from_entries(entries).unwrap();
        let analysis = analyze("hand me the free samples");
        assert_eq!(potential_matches(&corpus, &analysis).len(), 1);
    }
}
