//! Two-stage idiom matching engine.
//!
//! Given an immutable [`idiom_corpus::Corpus`] and a sentence, the engine
//! finds dictionary entries whose tagged unit structure is realized in the
//! sentence:
//!
//! 1. the coarse filter ([`coarse::potential_matches`]) cheaply keeps only
//!    entries whose mandatory fixed words all occur somewhere in the
//!    sentence;
//! 2. the fine matcher ([`fine::look_closer`]) builds combinations of
//!    actual word occurrences for the survivors, validates them against
//!    each entry's generated pattern set, checks left-to-right ordering
//!    and word-gap locality, and ranks by match word count;
//! 3. the facade ([`facade::find_idioms`]) wires in tokenization and
//!    lemmatization, truncates, deduplicates and shapes the output.
//!
//! Nothing here mutates shared state; every function takes the corpus by
//! reference and is safe to call from parallel workers.

pub mod analyze;
pub mod coarse;
pub mod eval;
pub mod facade;
pub mod fine;
pub mod lexical;

#[cfg(test)]
pub(crate) mod testutil;

pub use analyze::{Analysis, Analyzer, DefaultAnalyzer};
pub use facade::{FindOptions, IdiomMatch, find_idioms};
pub use fine::{EntryMatch, MatchConfig, look_closer};
pub use coarse::potential_matches;
