//! Load the idiom dictionary and prepare it for matching.
//!
//! The corpus file is a serialized collection keyed by `dictionary`, each
//! element one [`DictionaryEntry`] in its raw parallel-list form (`alt`,
//! `runs`, `word_forms`). Loading folds the lists into [`idiom_types::Unit`]
//! records, validates each entry, regenerates its pattern set and compiles
//! one case-insensitive word-boundary regex per unit constituent, so that
//! queries never pay regex construction cost.
//!
//! Defective entries (misaligned lists, unknown tags, no mandatory word,
//! uncompilable surface forms) are skipped with a warning; a defect in one
//! entry never aborts the load. A missing or corrupt file is fatal.
//!
//! Callers choose between memory-mapped and owned buffers at runtime via
//! [`LoadMode`]. The corpus is immutable after load and safe to share
//! across threads.
//!
//! # Example
//! ```no_run
//! use idiom_corpus::{Corpus, LoadMode};
//!
//! # fn main() -> Result<(), idiom_corpus::CorpusError> {
//! let corpus = Corpus::load_with_mode("phrases.json", LoadMode::Mmap)?;
//! println!("{} entries", corpus.len());
//! # Ok(()) }
//! ```

pub mod patterns;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use idiom_types::{DictionaryEntry, SourceRange, Tag, Unit};

pub use patterns::generate_patterns;

/// Strategy for reading the corpus file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy until parse).
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read corpus: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse corpus: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("corpus contains no usable entries")]
    Empty,
}

/// Compiled matcher for one constituent word of a unit.
///
/// `regex` is a case-insensitive word-boundary alternation over the
/// accepted surface forms; `forms` is kept for lemma-token membership
/// checks that bypass the regex.
#[derive(Debug)]
pub struct UnitMatcher {
    /// Base word recorded in match combinations (pattern vocabulary).
    pub word: String,
    pub forms: Vec<String>,
    pub regex: Regex,
}

/// Per-constituent matchers for one unit. Empty for units that are never
/// matched literally (`variable`, `asterisk`).
#[derive(Debug, Default)]
pub struct UnitMatchers {
    pub constituents: Vec<Option<UnitMatcher>>,
}

/// All compiled matchers for one entry, index-aligned with its units.
#[derive(Debug)]
pub struct EntryMatchers {
    pub units: Vec<UnitMatchers>,
}

/// Immutable, process-wide dictionary store.
#[derive(Debug)]
pub struct Corpus {
    entries: Vec<DictionaryEntry>,
    matchers: Vec<EntryMatchers>,
    by_id: HashMap<u32, usize>,
}

impl Corpus {
    /// Load the corpus from a JSON file, memory-mapping by default.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        Self::load_with_mode(path, LoadMode::Mmap)
    }

    /// Load the corpus choosing between mmap and owned buffers at runtime.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CorpusError::Missing(path.to_path_buf()));
        }
        let raw: RawCorpus = match mode {
            LoadMode::Mmap => {
                let file = File::open(path)?;
                let map = unsafe { Mmap::map(&file) }?;
                serde_json::from_slice(&map)?
            }
            LoadMode::Owned => {
                let mut buf = Vec::new();
                File::open(path)?.read_to_end(&mut buf)?;
                serde_json::from_slice(&buf)?
            }
        };

        let total = raw.dictionary.len();
        let mut entries = Vec::with_capacity(total);
        for (position, raw_entry) in raw.dictionary.into_iter().enumerate() {
            match raw_entry.into_entry() {
                Ok(entry) => entries.push(entry),
                Err(reason) => warn!("skipping corpus entry {position}: {reason}"),
            }
        }
        info!("loaded {} of {} corpus entries", entries.len(), total);

        Self::from_entries(entries)
    }

    /// Build a corpus from already-constructed entries.
    ///
    /// Patterns are regenerated from the units and matchers compiled the
    /// same way as for a file load, so tests can run against synthetic
    /// dictionaries.
    pub fn from_entries(entries: Vec<DictionaryEntry>) -> Result<Self, CorpusError> {
        let mut kept = Vec::with_capacity(entries.len());
        let mut matchers = Vec::with_capacity(entries.len());
        for mut entry in entries {
            if entry.constant_count() == 0 {
                warn!("skipping entry {}: no constant unit", entry.id);
                continue;
            }
            entry.patterns = generate_patterns(&entry.units);
            match compile_entry(&entry) {
                Ok(compiled) => {
                    kept.push(entry);
                    matchers.push(compiled);
                }
                Err(reason) => warn!("skipping entry {}: {reason}", entry.id),
            }
        }
        if kept.is_empty() {
            return Err(CorpusError::Empty);
        }
        let by_id = kept
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id, idx))
            .collect();
        Ok(Self {
            entries: kept,
            matchers,
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn entry(&self, idx: usize) -> &DictionaryEntry {
        &self.entries[idx]
    }

    pub fn matchers(&self, idx: usize) -> &EntryMatchers {
        &self.matchers[idx]
    }

    /// Look up an entry by its stable corpus id.
    pub fn by_id(&self, id: u32) -> Option<&DictionaryEntry> {
        self.by_id.get(&id).map(|idx| &self.entries[*idx])
    }
}

/// Build the word-boundary alternation regex for one form list.
///
/// Forms are escaped and ordered longest first so the scanner prefers the
/// longest surface form at any position.
pub fn build_form_regex(forms: &[String]) -> Result<Regex, regex::Error> {
    let mut escaped: Vec<String> = forms.iter().map(|f| regex::escape(f)).collect();
    escaped.sort_by_key(|f| std::cmp::Reverse(f.len()));
    Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|")))
}

fn compile_entry(entry: &DictionaryEntry) -> Result<EntryMatchers, String> {
    let mut units = Vec::with_capacity(entry.units.len());
    for unit in &entry.units {
        if !unit.tag.is_matchable() {
            units.push(UnitMatchers::default());
            continue;
        }
        let Some(forms) = &unit.forms else {
            return Err(format!("unit {:?} has no word forms", unit.text));
        };
        let words: Vec<&str> = unit.constituents().collect();
        if forms.len() != words.len() {
            return Err(format!(
                "unit {:?}: {} form lists for {} words",
                unit.text,
                forms.len(),
                words.len()
            ));
        }
        let mut constituents = Vec::with_capacity(words.len());
        for (word, word_forms) in words.iter().zip(forms) {
            if word_forms.is_empty() {
                constituents.push(None);
                continue;
            }
            let mut all = word_forms.clone();
            if !all.iter().any(|f| f == word) {
                all.push((*word).to_string());
            }
            let regex = build_form_regex(&all)
                .map_err(|e| format!("unit {:?}: bad form regex: {e}", unit.text))?;
            constituents.push(Some(UnitMatcher {
                word: (*word).to_string(),
                forms: all,
                regex,
            }));
        }
        units.push(UnitMatchers { constituents });
    }
    Ok(EntryMatchers { units })
}

#[derive(Deserialize)]
struct RawCorpus {
    dictionary: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    id: u32,
    range: SourceRange,
    phrase: String,
    #[serde(default)]
    phrase_html: String,
    definition: String,
    #[serde(default)]
    definition_html: String,
    alt: Vec<String>,
    runs: Vec<String>,
    word_forms: Vec<RawForms>,
    #[serde(default)]
    multiple: bool,
    #[serde(default)]
    duplicate: bool,
}

/// `word_forms` entries are either per-word inflection lists or the `"NA"`
/// sentinel marking a variable unit.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawForms {
    Sentinel(String),
    PerWord(Vec<Vec<String>>),
}

impl RawEntry {
    fn into_entry(self) -> Result<DictionaryEntry, String> {
        if self.alt.len() != self.runs.len() || self.alt.len() != self.word_forms.len() {
            return Err(format!(
                "misaligned lists: {} tags, {} runs, {} form lists",
                self.alt.len(),
                self.runs.len(),
                self.word_forms.len()
            ));
        }
        let mut units = Vec::with_capacity(self.alt.len());
        for ((tag, text), forms) in self.alt.iter().zip(self.runs).zip(self.word_forms) {
            let tag = Tag::from_str(tag).ok_or_else(|| format!("unknown tag {tag:?}"))?;
            let forms = match forms {
                RawForms::PerWord(lists) => Some(lists),
                RawForms::Sentinel(_) => None,
            };
            if tag.is_matchable() && forms.is_none() {
                return Err(format!("unit {text:?} tagged {tag} has sentinel forms"));
            }
            units.push(Unit { tag, text, forms });
        }
        Ok(DictionaryEntry {
            id: self.id,
            range: self.range,
            phrase: self.phrase,
            phrase_html: self.phrase_html,
            definition: self.definition,
            definition_html: self.definition_html,
            units,
            // Stored patterns are derived data; regenerated in from_entries.
            patterns: HashSet::new(),
            multiple: self.multiple,
            duplicate: self.duplicate,
        })
    }
}
