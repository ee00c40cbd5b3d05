//! Pattern generation.
//!
//! A pattern is one legal linear sequence of matchable words derived from
//! an entry's unit structure. The fine matcher later checks candidate word
//! combinations for membership in this set, so generation has to cover
//! every inclusion choice of the optional elements:
//!
//! - `constant` units form the mandatory baseline of every pattern;
//! - `o-constant` and `article` units contribute via their full powerset;
//! - each `verb` unit is a mutually exclusive alternative: at most one
//!   verb accompanies any pattern ("be ~; get ~" are preceding
//!   auxiliaries that never co-occur);
//! - `variable` and `asterisk` units never appear.
//!
//! Words always keep their original unit order, whichever subset is
//! included.

use std::collections::HashSet;

use idiom_types::{Tag, Unit};

/// Generate the full pattern set for an entry's units.
///
/// For `k` optional units and `v` verbs this yields `2^k * (1 + v)`
/// sequences before duplicate collapse.
pub fn generate_patterns(units: &[Unit]) -> HashSet<String> {
    let optional: Vec<usize> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| matches!(u.tag, Tag::OConstant | Tag::Article))
        .map(|(i, _)| i)
        .collect();
    let verbs: Vec<usize> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.tag == Tag::Verb)
        .map(|(i, _)| i)
        .collect();

    let mut patterns = HashSet::new();
    for subset in 0u64..(1u64 << optional.len()) {
        let included: Vec<usize> = optional
            .iter()
            .enumerate()
            .filter(|(bit, _)| subset & (1 << bit) != 0)
            .map(|(_, idx)| *idx)
            .collect();

        patterns.insert(join_selected(units, &included, None));
        for verb in &verbs {
            patterns.insert(join_selected(units, &included, Some(*verb)));
        }
    }
    patterns
}

/// Space-join the texts of the constants plus the selected optional and
/// verb units, in unit order.
fn join_selected(units: &[Unit], optional: &[usize], verb: Option<usize>) -> String {
    let mut words = Vec::new();
    for (idx, unit) in units.iter().enumerate() {
        let take = unit.tag == Tag::Constant
            || optional.contains(&idx)
            || verb == Some(idx);
        if take {
            words.push(unit.text.as_str());
        }
    }
    words.join(" ")
}
