//! Mistake mining: scan historical sessions for mistyped words and build
//! a frequency-ranked practice list.

use crate::session::SessionRecord;
use crate::word_bank::WordList;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Name of the derived practice list; mined output replaces any previous
/// list of the same name in the bank and on disk.
pub const MINED_LIST_NAME: &str = "frequent";

/// At most this many words make it into the mined list.
pub const MINED_LIST_CAP: usize = 50;

/// Counts mistyped target words across one record. Only the typed prefix
/// of the target is compared; the trailing word (no terminating space) is
/// handled like any other span. Comparisons are byte-slice equality, so
/// inputs with out-of-alphabet bytes just count as mismatches.
fn count_mistakes(record: &SessionRecord, counts: &mut BTreeMap<String, usize>) {
    let input = record.input.as_bytes();
    let typed = record.target.len().min(input.len());
    let target = &record.target.as_bytes()[..typed];
    let input = &input[..typed];

    let mut left = 0;
    let mut i = 0;
    while i < target.len() {
        if target[i] != b' ' {
            i += 1;
            continue;
        }
        if input[left..i] != target[left..i] {
            bump(counts, &target[left..i]);
        }
        i += 1;
        left = i;
    }

    if left < target.len() && input[left..] != target[left..] {
        bump(counts, &target[left..]);
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, word: &[u8]) {
    if word.is_empty() {
        return;
    }
    let word = String::from_utf8_lossy(word).into_owned();
    *counts.entry(word).or_insert(0) += 1;
}

/// Mines the full history into a frequency map. Record order never
/// affects the result; accumulation is keyed alphabetically.
pub fn mistake_frequencies(history: &[SessionRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in history {
        count_mistakes(record, &mut counts);
    }
    counts
}

/// Builds the ranked practice list: stable ascending sort by count over
/// the alphabetical accumulation, then the tail taken in reverse so the
/// most frequent word comes first. Empty history yields an empty list.
pub fn mine_mistakes(history: &[SessionRecord]) -> WordList {
    let counts = mistake_frequencies(history);

    let words: Vec<String> = counts
        .into_iter()
        .sorted_by_key(|(_, count)| *count)
        .rev()
        .take(MINED_LIST_CAP)
        .map(|(word, _)| word)
        .collect();

    WordList {
        name: MINED_LIST_NAME.to_string(),
        no_lazy_mode: false,
        ordered_by_frequency: true,
        words,
    }
}
