//! Batch accuracy evaluation with checkpointed resume.
//!
//! Labeled sentences are processed in fixed-size batches; after each
//! batch the running tallies are persisted, so an interrupted run picks
//! up at the first unprocessed batch instead of starting over. Within a
//! batch the sentences are split across scoped worker threads; the
//! corpus is shared by reference.

use std::fs;
use std::path::Path;
use std::thread;

use anyhow::{Context, anyhow};
use idiom_corpus::Corpus;
use idiom_types::SourceRange;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyze::Analyzer;
use crate::facade::{FindOptions, find_idioms};
use crate::fine::MatchConfig;

/// One labeled evaluation sentence.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EvalCase {
    pub sentence: String,
    /// Source page range of the entry the sentence was written for.
    pub expected: SourceRange,
}

#[derive(Clone, Copy, Debug)]
pub struct EvalOptions {
    pub batch_size: usize,
    pub workers: usize,
    /// Match limit per sentence; a case is a hit when any returned match
    /// carries the expected range.
    pub limit: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            workers: 4,
            limit: 10,
        }
    }
}

/// Persisted progress. `next_batch` is the first batch not yet counted.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct Checkpoint {
    pub next_batch: usize,
    pub checked: usize,
    pub hits: usize,
}

impl Checkpoint {
    fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read(path)
            .with_context(|| format!("reading checkpoint {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("parsing checkpoint {}", path.display()))
    }

    fn store(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_vec_pretty(self).context("encoding checkpoint")?;
        fs::write(path, raw)
            .with_context(|| format!("writing checkpoint {}", path.display()))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EvalReport {
    pub checked: usize,
    pub hits: usize,
}

impl EvalReport {
    pub fn accuracy(&self) -> f64 {
        if self.checked == 0 {
            return 0.0;
        }
        self.hits as f64 / self.checked as f64
    }
}

/// Evaluate `cases` against the corpus, resuming from the checkpoint at
/// `checkpoint_path` when one exists.
pub fn run_batches(
    corpus: &Corpus,
    analyzer: &dyn Analyzer,
    config: &MatchConfig,
    cases: &[EvalCase],
    options: &EvalOptions,
    checkpoint_path: &Path,
) -> anyhow::Result<EvalReport> {
    let batch_size = options.batch_size.max(1);
    let mut checkpoint = Checkpoint::load(checkpoint_path)?;
    let total_batches = cases.len().div_ceil(batch_size);
    if checkpoint.next_batch > 0 {
        info!(
            batch = checkpoint.next_batch,
            checked = checkpoint.checked,
            "resuming evaluation"
        );
    }

    for batch_idx in checkpoint.next_batch..total_batches {
        let start = batch_idx * batch_size;
        let batch = &cases[start..(start + batch_size).min(cases.len())];
        let batch_hits = evaluate_batch(corpus, analyzer, config, batch, options)?;

        checkpoint.next_batch = batch_idx + 1;
        checkpoint.checked += batch.len();
        checkpoint.hits += batch_hits;
        checkpoint.store(checkpoint_path)?;
        info!(
            batch = batch_idx,
            checked = checkpoint.checked,
            hits = checkpoint.hits,
            "batch done"
        );
    }

    Ok(EvalReport {
        checked: checkpoint.checked,
        hits: checkpoint.hits,
    })
}

fn evaluate_batch(
    corpus: &Corpus,
    analyzer: &dyn Analyzer,
    config: &MatchConfig,
    batch: &[EvalCase],
    options: &EvalOptions,
) -> anyhow::Result<usize> {
    let find_options = FindOptions {
        limit: options.limit,
        range: true,
        ..FindOptions::default()
    };
    let chunk_size = batch.len().div_ceil(options.workers.max(1)).max(1);

    thread::scope(|scope| {
        let handles: Vec<_> = batch
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || -> anyhow::Result<usize> {
                    let mut hits = 0;
                    for case in chunk {
                        let matches =
                            find_idioms(corpus, analyzer, config, &case.sentence, &find_options)?;
                        if matches.iter().any(|m| m.range == Some(case.expected)) {
                            hits += 1;
                        }
                    }
                    Ok(hits)
                })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            total += handle
                .join()
                .map_err(|_| anyhow!("evaluation worker panicked"))??;
        }
        Ok(total)
    })
}
