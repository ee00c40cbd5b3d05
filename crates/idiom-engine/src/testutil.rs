//! Synthetic dictionaries shared by the engine tests.

use idiom_corpus::Corpus;
use idiom_types::{DictionaryEntry, SourceRange, Tag, Unit};
use std::collections::HashSet;

/// Unit whose only accepted form per constituent is the base word.
pub fn unit(tag: Tag, text: &str) -> Unit {
    let forms = if tag.is_matchable() {
        Some(
            text.split_whitespace()
                .map(|w| vec![w.to_string()])
                .collect(),
        )
    } else {
        None
    };
    Unit {
        tag,
        text: text.to_string(),
        forms,
    }
}

/// Unit with explicit inflection lists, one per constituent.
pub fn unit_with_forms(tag: Tag, text: &str, forms: &[&[&str]]) -> Unit {
    Unit {
        tag,
        text: text.to_string(),
        forms: Some(
            forms
                .iter()
                .map(|list| list.iter().map(|f| f.to_string()).collect())
                .collect(),
        ),
    }
}

pub fn entry(id: u32, range: (u32, u32), phrase: &str, units: Vec<Unit>) -> DictionaryEntry {
    DictionaryEntry {
        id,
        range: SourceRange(range.0, range.1),
        phrase: phrase.to_string(),
        phrase_html: format!("<b>{phrase}</b>"),
        definition: format!("definition of {phrase}"),
        definition_html: format!("definition of <i>{phrase}</i>"),
        units,
        patterns: HashSet::new(),
        multiple: false,
        duplicate: false,
    }
}

/// A handful of entries exercising verbs, variables, optional words,
/// articles and inflection lists.
pub fn small_corpus() -> Corpus {
    let entries = vec![
        entry(
            1,
            (100, 103),
            "*accustomed to someone or something",
            vec![
                unit_with_forms(
                    Tag::Verb,
                    "be",
                    &[&["be", "is", "am", "are", "was", "were", "been", "being"]],
                ),
                unit_with_forms(
                    Tag::Verb,
                    "become",
                    &[&["become", "becomes", "became", "becoming"]],
                ),
                unit_with_forms(
                    Tag::Verb,
                    "grow",
                    &[&["grow", "grows", "grew", "grown", "growing"]],
                ),
                unit_with_forms(
                    Tag::Constant,
                    "accustomed to",
                    &[&["accustomed", "accustom", "accustoms", "accustoming"], &["to"]],
                ),
                unit(Tag::Variable, "someone or something"),
            ],
        ),
        entry(
            2,
            (200, 204),
            "bail someone out of jail",
            vec![
                unit_with_forms(Tag::Constant, "bail", &[&["bail", "bails", "bailed", "bailing"]]),
                unit(Tag::Variable, "someone"),
                unit_with_forms(Tag::Constant, "out", &[&["out"]]),
                unit_with_forms(Tag::OConstant, "of jail", &[&["of"], &["jail", "jails"]]),
            ],
        ),
        entry(
            3,
            (300, 302),
            "kick the bucket",
            vec![
                unit_with_forms(
                    Tag::Constant,
                    "kick",
                    &[&["kick", "kicks", "kicked", "kicking"]],
                ),
                unit_with_forms(Tag::Article, "the", &[&["the"]]),
                unit_with_forms(Tag::Constant, "bucket", &[&["bucket", "buckets"]]),
            ],
        ),
        entry(
            4,
            (400, 401),
            "silly goose",
            vec![unit_with_forms(Tag::Constant, "goose", &[&["goose"]])],
        ),
        entry(
            5,
            (500, 502),
            "want for nothing",
            vec![
                unit_with_forms(
                    Tag::Constant,
                    "want",
                    &[&["want", "wants", "wanted", "wanting"]],
                ),
                unit_with_forms(Tag::Constant, "for", &[&["for"]]),
                unit_with_forms(Tag::Constant, "nothing", &[&["nothing"]]),
            ],
        ),
    ];
    Corpus::from_entries(entries).unwrap()
}
