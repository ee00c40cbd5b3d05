//! Query facade: one call from sentence to shaped results.

use idiom_corpus::Corpus;
use idiom_types::{SourceRange, Span};
use serde::Serialize;
use tracing::debug;

use crate::analyze::Analyzer;
use crate::coarse::potential_matches;
use crate::fine::{MatchConfig, look_closer};

/// Output shaping knobs for [`find_idioms`].
#[derive(Clone, Copy, Debug)]
pub struct FindOptions {
    /// Keep at most this many matches, best first.
    pub limit: usize,
    /// Return the formatted phrase and definition instead of plain text.
    pub html: bool,
    /// Include the matched character interval.
    pub span: bool,
    /// Include the entry's source page range.
    pub range: bool,
    /// Include the entry's stable identifier.
    pub id: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            html: false,
            span: false,
            range: false,
            id: false,
        }
    }
}

/// One matched dictionary entry, shaped for output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IdiomMatch {
    pub phrase: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

/// Find the idioms of `corpus` realized in `sentence`.
///
/// Runs the coarse filter and the fine matcher, truncates to
/// `options.limit`, collapses consecutive repeats of the same entry and
/// matched span, then projects the requested fields. Distinct entries
/// never collapse, whatever the projection flags.
pub fn find_idioms(
    corpus: &Corpus,
    analyzer: &dyn Analyzer,
    config: &MatchConfig,
    sentence: &str,
    options: &FindOptions,
) -> anyhow::Result<Vec<IdiomMatch>> {
    let analysis = analyzer.analyze(sentence)?;
    let candidates = potential_matches(corpus, &analysis);
    let matches = look_closer(corpus, config, &candidates, &analysis);
    debug!(
        candidates = candidates.len(),
        matches = matches.len(),
        "query evaluated"
    );

    let mut matches: Vec<_> = matches.into_iter().take(options.limit).collect();
    matches.dedup_by(|a, b| a.entry_idx == b.entry_idx && a.span == b.span);

    let shaped = matches
        .into_iter()
        .map(|m| {
            let entry = corpus.entry(m.entry_idx);
            IdiomMatch {
                phrase: if options.html {
                    entry.phrase_html.clone()
                } else {
                    entry.phrase.clone()
                },
                definition: if options.html {
                    entry.definition_html.clone()
                } else {
                    entry.definition.clone()
                },
                span: options.span.then_some(m.span),
                range: options.range.then_some(entry.range),
                id: options.id.then_some(entry.id),
            }
        })
        .collect();
    Ok(shaped)
}
