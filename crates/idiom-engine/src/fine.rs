//! Fine-grained ranked matcher.
//!
//! For each coarse-filter survivor, collect every occurrence of its
//! matchable words in the sentence, then walk the Cartesian product of
//! those occurrence lists until one combination satisfies all three
//! checks:
//!
//! - the space-joined word sequence is one of the entry's generated
//!   patterns;
//! - the spans are monotonically non-decreasing, so the words appear in
//!   idiom order rather than scattered coincidence;
//! - no two consecutive matched spans have more than `max_gap` words
//!   between them.
//!
//! The first qualifying combination wins and enumeration stops for that
//! entry. Results are sorted by match word count, descending: entries
//! matched by more distinct words outrank the ones a single common word
//! can trigger.

use idiom_corpus::Corpus;
use idiom_types::Span;
use tracing::debug;

use crate::analyze::Analysis;
use crate::lexical::{Occurrence, occurrences_with_fallback};

/// Tunables for the fine matcher.
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Maximum number of words allowed between two consecutive matched
    /// spans. Empirically tuned; 3 is the shipped default, not a law.
    pub max_gap: usize,
    /// Upper bound on combinations examined per entry.
    pub combination_limit: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_gap: 3,
            combination_limit: 1 << 16,
        }
    }
}

/// One qualifying entry with its match strength and covered interval.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntryMatch {
    pub entry_idx: usize,
    pub word_count: usize,
    pub span: Span,
}

/// Validate and rank the coarse-filter candidates against the sentence.
pub fn look_closer(
    corpus: &Corpus,
    config: &MatchConfig,
    candidates: &[usize],
    analysis: &Analysis,
) -> Vec<EntryMatch> {
    let mut matches = Vec::new();

    for &idx in candidates {
        let entry = corpus.entry(idx);
        let matchers = corpus.matchers(idx);

        // One occurrence list per unit constituent that was observed at
        // all; absent optional words simply drop out of the product.
        let mut record: Vec<Vec<Occurrence>> = Vec::new();
        for unit_matchers in &matchers.units {
            for matcher in unit_matchers.constituents.iter().flatten() {
                let occs =
                    occurrences_with_fallback(matcher, &analysis.sentence, &analysis.lemma_text);
                if !occs.is_empty() {
                    record.push(occs);
                }
            }
        }
        if record.is_empty() {
            continue;
        }

        for combo in Combinations::new(&record).take(config.combination_limit) {
            let words: Vec<&str> = combo.iter().map(|o| o.word.as_str()).collect();
            let spans: Vec<Span> = combo.iter().map(|o| o.span).collect();
            let sequence = words.join(" ");

            if entry.patterns.contains(&sequence)
                && spans_ordered(&spans)
                && max_words_between(&analysis.sentence, &spans) <= config.max_gap
            {
                matches.push(EntryMatch {
                    entry_idx: idx,
                    word_count: words.len(),
                    span: Span::new(spans[0].start, spans[spans.len() - 1].end),
                });
                break;
            }
        }
    }

    debug!(
        "fine matcher kept {} of {} candidates",
        matches.len(),
        candidates.len()
    );

    // Stable: ties keep discovery order.
    matches.sort_by(|a, b| b.word_count.cmp(&a.word_count));
    matches
}

/// Flattened span offsets must be non-decreasing left to right.
fn spans_ordered(spans: &[Span]) -> bool {
    let flat: Vec<usize> = spans.iter().flat_map(|s| [s.start, s.end]).collect();
    flat.windows(2).all(|w| w[0] <= w[1])
}

/// Largest number of words sitting between two consecutive matched spans.
///
/// Spans may refer to the lemmatized sentence when a word only matched
/// there; offsets are clamped so a mixed combination can never slice out
/// of bounds.
fn max_words_between(sentence: &str, spans: &[Span]) -> usize {
    let mut max_words = 0;
    for pair in spans.windows(2) {
        let from = (pair[0].end + 1).min(sentence.len());
        let to = pair[1].start.min(sentence.len());
        if to <= from {
            continue;
        }
        let between = sentence.get(from..to).unwrap_or("");
        max_words = max_words.max(between.split_whitespace().count());
    }
    max_words
}

/// Lazy Cartesian product over per-constituent occurrence lists, rightmost
/// list varying fastest.
struct Combinations<'a> {
    sets: &'a [Vec<Occurrence>],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    fn new(sets: &'a [Vec<Occurrence>]) -> Self {
        Self {
            sets,
            indices: vec![0; sets.len()],
            done: sets.iter().any(|s| s.is_empty()),
        }
    }
}

impl<'a> Iterator for Combinations<'a> {
    type Item = Vec<&'a Occurrence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let combo: Vec<&Occurrence> = self
            .sets
            .iter()
            .zip(&self.indices)
            .map(|(set, &i)| &set[i])
            .collect();

        // Odometer increment.
        let mut pos = self.sets.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.indices[pos] += 1;
            if self.indices[pos] < self.sets[pos].len() {
                break;
            }
            self.indices[pos] = 0;
        }
        Some(combo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{Analyzer, DefaultAnalyzer};
    use crate::coarse::potential_matches;
    use crate::testutil::small_corpus;

    fn analyze(sentence: &str) -> Analysis {
        DefaultAnalyzer::new().analyze(sentence).unwrap()
    }

    fn matches_for(sentence: &str) -> (Corpus, Vec<EntryMatch>) {
        let corpus = small_corpus();
        let analysis = analyze(sentence);
        let candidates = potential_matches(&corpus, &analysis);
        let matches = look_closer(&corpus, &MatchConfig::default(), &candidates, &analysis);
        (corpus, matches)
    }

    #[test]
    fn accustomed_to_matches_with_auxiliary_verb() {
        let (corpus, matches) =
            matches_for("The children are accustomed to eating late in the evening.");
        let m = matches
            .iter()
            .find(|m| corpus.entry(m.entry_idx).id == 1)
            .expect("accustomed-to entry should match");
        assert!(m.word_count >= 2);
        // Span covers "accustomed to" (chars 17..30 of the lowercased
        // sentence), extended left to the matched auxiliary.
        assert!(m.span.start <= 17);
        assert!(m.span.end >= 30);
    }

    #[test]
    fn optional_words_are_not_required() {
        let (corpus, matches) = matches_for("I need some cash to bail out a friend!");
        let m = matches
            .iter()
            .find(|m| corpus.entry(m.entry_idx).id == 2)
            .expect("bail-out entry should match without 'of jail'");
        assert_eq!(m.word_count, 2);
        assert_eq!(m.span, Span::new(20, 28));
    }

    #[test]
    fn scrambled_word_order_is_rejected() {
        let (corpus, matches) = matches_for("Out he went, to bail no one.");
        assert!(
            !matches
                .iter()
                .any(|m| corpus.entry(m.entry_idx).id == 2),
            "out ... bail is not bail ... out"
        );
    }

    #[test]
    fn distant_words_are_rejected_by_the_gap_bound() {
        let (corpus, matches) = matches_for("They want the shiny new red car for nothing.");
        assert!(
            !matches
                .iter()
                .any(|m| corpus.entry(m.entry_idx).id == 5),
            "five words between 'want' and 'for' exceeds the bound"
        );

        let (corpus, matches) = matches_for("They want it for nothing.");
        assert!(matches.iter().any(|m| corpus.entry(m.entry_idx).id == 5));
    }

    #[test]
    fn gap_bound_is_configurable() {
        let corpus = small_corpus();
        let analysis = analyze("They want the shiny new red car for nothing.");
        let candidates = potential_matches(&corpus, &analysis);
        let loose = MatchConfig {
            max_gap: 8,
            ..MatchConfig::default()
        };
        let matches = look_closer(&corpus, &loose, &candidates, &analysis);
        assert!(matches.iter().any(|m| corpus.entry(m.entry_idx).id == 5));
    }

    #[test]
    fn ranking_puts_higher_word_counts_first() {
        let (corpus, matches) = matches_for("You want for nothing, you silly goose.");
        let ids: Vec<u32> = matches.iter().map(|m| corpus.entry(m.entry_idx).id).collect();
        let want = ids.iter().position(|&id| id == 5).unwrap();
        let goose = ids.iter().position(|&id| id == 4).unwrap();
        assert!(want < goose, "3-word match should precede 1-word match");
        assert!(matches[want].word_count > matches[goose].word_count);
    }

    #[test]
    fn reported_spans_are_already_ordered() {
        let (_, matches) = matches_for("He kicked the bucket near the old bucket.");
        for m in &matches {
            assert!(m.span.start <= m.span.end);
        }
        // First qualifying combination wins: the earliest "the"/"bucket".
        assert_eq!(matches[0].span, Span::new(3, 20));
    }

    #[test]
    fn fine_matches_are_a_subset_of_coarse_candidates() {
        let corpus = small_corpus();
        for sentence in [
            "The children are accustomed to eating late in the evening.",
            "I need some cash to bail out a friend!",
            "He kicked the bucket.",
            "Nothing idiomatic here at all.",
        ] {
            let analysis = analyze(sentence);
            let candidates = potential_matches(&corpus, &analysis);
            let matches = look_closer(&corpus, &MatchConfig::default(), &candidates, &analysis);
            for m in matches {
                assert!(candidates.contains(&m.entry_idx));
            }
        }
    }

    #[test]
    fn combinations_enumerate_rightmost_fastest() {
        let occ = |w: &str, a: usize, b: usize| Occurrence {
            word: w.to_string(),
            span: Span::new(a, b),
        };
        let sets = vec![
            vec![occ("a", 0, 1), occ("a", 10, 11)],
            vec![occ("b", 2, 3), occ("b", 12, 13)],
        ];
        let combos: Vec<Vec<usize>> = Combinations::new(&sets)
            .map(|c| c.iter().map(|o| o.span.start).collect())
            .collect();
        assert_eq!(
            combos,
            vec![vec![0, 2], vec![0, 12], vec![10, 2], vec![10, 12]]
        );
    }
}
