//! Sentence analysis seam.
//!
//! The engine consumes tokens and lemmas; it never computes them. This
//! module defines the trait the two matching stages depend on and a
//! default implementation backed by `idiom-lemma`. Tests inject synthetic
//! analyzers the same way callers with a richer NLP stack would.

use anyhow::Result;
use idiom_lemma::{Lemmatizer, pos_hint, tokenize};

/// Tokenized and lemmatized view of one input sentence.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// The sentence, lowercased. All raw-text spans refer to this string.
    pub sentence: String,
    /// One lemma per word token, in sentence order.
    pub lemmas: Vec<String>,
    /// Space-joined lemmas; fallback haystack when a word only occurs in
    /// inflected form. Spans from this string refer to it, not to
    /// `sentence`.
    pub lemma_text: String,
}

/// External NLP collaborator: tokenization, POS tagging, lemmatization.
///
/// Failures propagate to the caller of the query facade; the engine has
/// no fallback analysis of its own.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, sentence: &str) -> Result<Analysis>;
}

/// Analyzer backed by the rule-based lemmatizer in `idiom-lemma`.
///
/// Each token's lemma is computed with a shape-derived POS hint, matching
/// the adjective/noun/verb hint policy of the query pipeline.
pub struct DefaultAnalyzer {
    lemmatizer: Lemmatizer,
}

impl DefaultAnalyzer {
    pub fn new() -> Self {
        Self {
            lemmatizer: Lemmatizer::new(),
        }
    }

    pub fn with_lemmatizer(lemmatizer: Lemmatizer) -> Self {
        Self { lemmatizer }
    }
}

impl Default for DefaultAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DefaultAnalyzer {
    fn analyze(&self, sentence: &str) -> Result<Analysis> {
        let sentence = sentence.to_lowercase();
        let tokens = tokenize(&sentence);
        let lemmas: Vec<String> = tokens
            .iter()
            .map(|t| self.lemmatizer.lemma(pos_hint(t), t))
            .collect();
        let lemma_text = lemmas.join(" ");
        Ok(Analysis {
            sentence,
            lemmas,
            lemma_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_lowercases_and_lemmatizes() {
        let analyzer = DefaultAnalyzer::new();
        let analysis = analyzer
            .analyze("The children WERE accustomed to eating late.")
            .unwrap();
        assert_eq!(analysis.sentence, "the children were accustomed to eating late.");
        assert!(analysis.lemmas.contains(&"child".to_string()));
        assert!(analysis.lemmas.contains(&"be".to_string()));
        assert!(analysis.lemma_text.contains("child be accustom"));
    }

    #[test]
    fn analysis_of_empty_sentence_is_empty() {
        let analyzer = DefaultAnalyzer::new();
        let analysis = analyzer.analyze("...").unwrap();
        assert!(analysis.lemmas.is_empty());
        assert_eq!(analysis.lemma_text, "");
    }
}
