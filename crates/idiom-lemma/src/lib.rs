//! Tokenization, POS hinting and lemmatization for sentence analysis.
//!
//! The matching engine consumes lemmas; it never computes morphology on
//! its own. This crate is the in-process collaborator supplying that:
//! check exceptions first, then apply POS-specific suffix rules, then
//! optionally verify candidates via a caller-provided lemma existence
//! predicate.
//!
//! A built-in table covers the common English irregulars; callers with a
//! dictionary on disk can overlay classic `*.exc` exception files on top.
//!
//! # Example
//! ```rust
//! use idiom_lemma::{Lemmatizer, Pos, tokenize};
//!
//! let lemmatizer = Lemmatizer::new();
//! assert_eq!(lemmatizer.lemma(Pos::Noun, "children"), "child");
//! assert_eq!(lemmatizer.lemma(Pos::Verb, "running"), "run");
//! assert_eq!(tokenize("Don't stop!"), vec!["don't", "stop"]);
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

/// Part-of-speech hint for lemmatization.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Pos {
    Noun,
    Verb,
    Adj,
    Adv,
}

impl Pos {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Pos::Noun),
            'v' => Some(Pos::Verb),
            'a' | 's' => Some(Pos::Adj),
            'r' => Some(Pos::Adv),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Pos::Noun => 'n',
            Pos::Verb => 'v',
            Pos::Adj => 'a',
            Pos::Adv => 'r',
        }
    }
}

/// Split a sentence into lowercase word tokens.
///
/// Internal apostrophes and hyphens are part of the word ("don't",
/// "well-to-do"); leading and trailing punctuation is dropped.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let lower = sentence.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            current.push(c);
        } else if (c == '\'' || c == '\u{2019}' || c == '-')
            && !current.is_empty()
            && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric())
        {
            current.push(if c == '\u{2019}' { '\'' } else { c });
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Guess a POS hint for a token from its shape.
///
/// This is a coarse stand-in for a full tagger: suffix heuristics plus a
/// short closed-class verb list. Nouns are the default, matching the
/// default lemmatization the engine expects for everything else.
pub fn pos_hint(token: &str) -> Pos {
    const AUX_VERBS: &[&str] = &[
        "be", "is", "am", "are", "was", "were", "been", "being", "have", "has", "had", "do",
        "does", "did", "get", "gets", "got", "gotten", "go", "goes", "went", "gone",
    ];
    if AUX_VERBS.contains(&token) {
        return Pos::Verb;
    }
    if token.ends_with("ly") {
        return Pos::Adv;
    }
    if token.ends_with("ing") || token.ends_with("ed") {
        return Pos::Verb;
    }
    if ["ous", "ful", "ive", "less", "able", "ible"]
        .iter()
        .any(|s| token.ends_with(s))
    {
        return Pos::Adj;
    }
    Pos::Noun
}

/// Exception-and-rules lemmatizer in the classic morphy mold.
pub struct Lemmatizer {
    exceptions: HashMap<Pos, HashMap<String, String>>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    /// Build a lemmatizer with the built-in irregular-form table.
    pub fn new() -> Self {
        let mut exceptions: HashMap<Pos, HashMap<String, String>> = HashMap::new();
        for (pos, surface, lemma) in BUILTIN_EXCEPTIONS {
            exceptions
                .entry(*pos)
                .or_default()
                .insert((*surface).to_string(), (*lemma).to_string());
        }
        Self { exceptions }
    }

    /// Overlay `noun.exc`/`verb.exc`/`adj.exc`/`adv.exc` files from a
    /// dictionary directory on top of the built-in table.
    ///
    /// Files are optional; missing ones are treated as empty.
    pub fn with_exc_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut this = Self::new();
        for (pos, name) in [
            (Pos::Noun, "noun.exc"),
            (Pos::Verb, "verb.exc"),
            (Pos::Adj, "adj.exc"),
            (Pos::Adv, "adv.exc"),
        ] {
            let map = this.exceptions.entry(pos).or_default();
            for (surface, lemma) in load_exc(&dir.join(name))? {
                map.insert(surface, lemma);
            }
        }
        Ok(this)
    }

    /// All lemma candidates for a surface form, exceptions before rules,
    /// filtered by the caller's existence predicate.
    pub fn lemmas_for<F>(&self, pos: Pos, surface: &str, lemma_exists: F) -> Vec<String>
    where
        F: Fn(Pos, &str) -> bool,
    {
        let surface = normalize(surface);
        let mut out = Vec::new();
        if let Some(lemma) = self.exceptions.get(&pos).and_then(|m| m.get(&surface))
            && lemma_exists(pos, lemma)
        {
            out.push(lemma.clone());
        }
        for (suffix, replacement) in rules_for(pos) {
            if let Some(candidate) = apply_rule(&surface, suffix, replacement)
                && lemma_exists(pos, &candidate)
                && !out.contains(&candidate)
            {
                out.push(candidate);
            }
        }
        out
    }

    /// Best-effort single lemma: the first exception or plausible rule
    /// candidate, else the surface form unchanged.
    pub fn lemma(&self, pos: Pos, surface: &str) -> String {
        let surface = normalize(surface);
        if let Some(lemma) = self.exceptions.get(&pos).and_then(|m| m.get(&surface)) {
            return lemma.clone();
        }
        for (suffix, replacement) in rules_for(pos) {
            if let Some(candidate) = apply_rule(&surface, suffix, replacement)
                && is_plausible(&candidate)
            {
                return candidate;
            }
        }
        surface
    }
}

fn load_exc(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).with_context(|| format!("open exception file {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut pairs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
        let mut parts = line.split_whitespace();
        let (Some(surface), Some(lemma)) = (parts.next(), parts.next()) else {
            continue;
        };
        pairs.push((normalize(surface), normalize(lemma)));
    }
    Ok(pairs)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Candidates shorter than two characters or without a vowel are rule
/// artifacts ("is" -> "i"), not words.
fn is_plausible(candidate: &str) -> bool {
    candidate.len() >= 2 && candidate.chars().any(|c| "aeiouy".contains(c))
}

fn apply_rule(surface: &str, suffix: &str, replacement: &str) -> Option<String> {
    surface.strip_suffix(suffix).map(|stem| {
        let mut candidate = if replacement.is_empty() {
            stem.to_string()
        } else {
            format!("{stem}{replacement}")
        };

        // Undo doubled consonants from inflection ("stopped" -> "stopp").
        // 'l' and 's' double legitimately at word ends (fall, kiss).
        if replacement.is_empty() && candidate.len() >= 3 {
            let mut chars = candidate.chars();
            let last = chars.next_back();
            let prev = chars.next_back();
            if let (Some(a), Some(b)) = (last, prev)
                && a == b
                && !"aeiousl".contains(a)
            {
                candidate.pop();
            }
        }

        candidate
    })
}

fn rules_for(pos: Pos) -> &'static [(&'static str, &'static str)] {
    match pos {
        Pos::Noun => &[
            ("ses", "s"),
            ("xes", "x"),
            ("zes", "z"),
            ("ches", "ch"),
            ("shes", "sh"),
            ("men", "man"),
            ("ies", "y"),
            ("s", ""),
        ],
        Pos::Verb => &[
            ("ies", "y"),
            ("ing", ""),
            ("ing", "e"),
            ("ed", ""),
            ("ed", "e"),
            ("es", ""),
            ("es", "e"),
            ("s", ""),
        ],
        Pos::Adj | Pos::Adv => &[("er", ""), ("er", "e"), ("est", ""), ("est", "e")],
    }
}

const BUILTIN_EXCEPTIONS: &[(Pos, &str, &str)] = &[
    (Pos::Noun, "children", "child"),
    (Pos::Noun, "feet", "foot"),
    (Pos::Noun, "teeth", "tooth"),
    (Pos::Noun, "men", "man"),
    (Pos::Noun, "women", "woman"),
    (Pos::Noun, "mice", "mouse"),
    (Pos::Noun, "geese", "goose"),
    (Pos::Noun, "lives", "life"),
    (Pos::Noun, "wives", "wife"),
    (Pos::Noun, "knives", "knife"),
    (Pos::Noun, "leaves", "leaf"),
    (Pos::Noun, "halves", "half"),
    (Pos::Verb, "is", "be"),
    (Pos::Verb, "am", "be"),
    (Pos::Verb, "are", "be"),
    (Pos::Verb, "was", "be"),
    (Pos::Verb, "were", "be"),
    (Pos::Verb, "been", "be"),
    (Pos::Verb, "being", "be"),
    (Pos::Verb, "has", "have"),
    (Pos::Verb, "had", "have"),
    (Pos::Verb, "does", "do"),
    (Pos::Verb, "did", "do"),
    (Pos::Verb, "done", "do"),
    (Pos::Verb, "went", "go"),
    (Pos::Verb, "gone", "go"),
    (Pos::Verb, "got", "get"),
    (Pos::Verb, "gotten", "get"),
    (Pos::Verb, "gave", "give"),
    (Pos::Verb, "given", "give"),
    (Pos::Verb, "took", "take"),
    (Pos::Verb, "taken", "take"),
    (Pos::Verb, "made", "make"),
    (Pos::Verb, "said", "say"),
    (Pos::Verb, "came", "come"),
    (Pos::Verb, "knew", "know"),
    (Pos::Verb, "known", "know"),
    (Pos::Verb, "saw", "see"),
    (Pos::Verb, "seen", "see"),
    (Pos::Verb, "ran", "run"),
    (Pos::Verb, "ate", "eat"),
    (Pos::Verb, "eaten", "eat"),
    (Pos::Verb, "threw", "throw"),
    (Pos::Verb, "thrown", "throw"),
    (Pos::Verb, "wore", "wear"),
    (Pos::Verb, "worn", "wear"),
    (Pos::Verb, "broke", "break"),
    (Pos::Verb, "broken", "break"),
    (Pos::Verb, "bought", "buy"),
    (Pos::Verb, "brought", "bring"),
    (Pos::Verb, "caught", "catch"),
    (Pos::Verb, "fell", "fall"),
    (Pos::Verb, "fallen", "fall"),
    (Pos::Verb, "felt", "feel"),
    (Pos::Verb, "found", "find"),
    (Pos::Verb, "grew", "grow"),
    (Pos::Verb, "grown", "grow"),
    (Pos::Verb, "kept", "keep"),
    (Pos::Verb, "left", "leave"),
    (Pos::Verb, "lost", "lose"),
    (Pos::Verb, "met", "meet"),
    (Pos::Verb, "paid", "pay"),
    (Pos::Verb, "sat", "sit"),
    (Pos::Verb, "stood", "stand"),
    (Pos::Verb, "told", "tell"),
    (Pos::Verb, "thought", "think"),
    (Pos::Verb, "drew", "draw"),
    (Pos::Verb, "drawn", "draw"),
    (Pos::Verb, "held", "hold"),
    (Pos::Verb, "spoke", "speak"),
    (Pos::Verb, "spoken", "speak"),
    (Pos::Verb, "sang", "sing"),
    (Pos::Verb, "sung", "sing"),
    (Pos::Verb, "swam", "swim"),
    (Pos::Verb, "swum", "swim"),
    (Pos::Adj, "better", "good"),
    (Pos::Adj, "best", "good"),
    (Pos::Adj, "worse", "bad"),
    (Pos::Adj, "worst", "bad"),
    (Pos::Adv, "further", "far"),
    (Pos::Adv, "farther", "far"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn tokenizes_with_internal_apostrophes() {
        assert_eq!(
            tokenize("The children are accustomed to eating late."),
            vec!["the", "children", "are", "accustomed", "to", "eating", "late"]
        );
        assert_eq!(tokenize("Don't touch Bob's hat!"), vec!["don't", "touch", "bob's", "hat"]);
        assert_eq!(tokenize("  "), Vec::<String>::new());
    }

    #[test]
    fn exceptions_beat_rules() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemma(Pos::Noun, "children"), "child");
        assert_eq!(l.lemma(Pos::Verb, "were"), "be");
        assert_eq!(l.lemma(Pos::Verb, "ate"), "eat");
    }

    #[test]
    fn suffix_rules_cover_regular_inflection() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemma(Pos::Verb, "eating"), "eat");
        assert_eq!(l.lemma(Pos::Verb, "stopped"), "stop");
        assert_eq!(l.lemma(Pos::Verb, "falling"), "fall");
        assert_eq!(l.lemma(Pos::Verb, "accustomed"), "accustom");
        assert_eq!(l.lemma(Pos::Noun, "buckets"), "bucket");
        assert_eq!(l.lemma(Pos::Noun, "boxes"), "box");
    }

    #[test]
    fn lemma_falls_back_to_surface() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemma(Pos::Noun, "jazz"), "jazz");
        // Rule output "i" fails the plausibility check.
        assert_eq!(l.lemma(Pos::Noun, "is"), "is");
    }

    #[test]
    fn lemmas_for_respects_existence_predicate() {
        let l = Lemmatizer::new();
        let known = |_: Pos, lemma: &str| ["run", "eat"].contains(&lemma);
        assert_eq!(l.lemmas_for(Pos::Verb, "running", known), vec!["run"]);
        assert_eq!(
            l.lemmas_for(Pos::Verb, "running", |_, _| false),
            Vec::<String>::new()
        );
    }

    #[test]
    fn exc_overlay_extends_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("noun.exc")).unwrap();
        writeln!(file, "oxen ox").unwrap();
        drop(file);

        let l = Lemmatizer::with_exc_dir(dir.path()).unwrap();
        assert_eq!(l.lemma(Pos::Noun, "oxen"), "ox");
        assert_eq!(l.lemma(Pos::Noun, "children"), "child");
    }
}
