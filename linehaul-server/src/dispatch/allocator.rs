//! Trip number allocation.
//!
//! The sequence chosen here is only a guess that keeps numbers dense: two
//! concurrent creates can read the same state and pick the same number. The
//! store's unique index rejects the second insert and the coordinator
//! retries, so allocation must run inside the inserting transaction.

use chrono::NaiveDate;

use crate::domain::{TemplateCode, TripNumber, parse_sequence};
use crate::store::StoreView;

/// Next sequence after the highest one among `existing` numbers, or 1.
///
/// For three-digit sequences the highest number is also the lexicographically
/// greatest; comparing numerically keeps allocation correct past 999.
pub fn next_sequence<'a>(existing: impl IntoIterator<Item = &'a str>) -> u32 {
    existing
        .into_iter()
        .filter_map(parse_sequence)
        .max()
        .map_or(1, |last| last.saturating_add(1))
}

/// Propose a trip number for `code` on `date`, given what `view` can see.
pub fn allocate(view: &dyn StoreView, code: &TemplateCode, date: NaiveDate) -> TripNumber {
    let prefix = TripNumber::prefix(code, date);
    let existing = view.trip_numbers_with_prefix(&prefix);
    // Numbers of a longer code that extends this one share the prefix.
    let own = existing
        .iter()
        .map(|n| n.as_str())
        .filter(|n| n.strip_prefix(prefix.as_str()).is_some_and(|seq| !seq.contains('-')));
    let seq = next_sequence(own);
    TripNumber::new(code, date, seq)
}
