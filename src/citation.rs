// ============================================================================
// File: src/citation.rs
// Citation marker resolution against the source list
// ============================================================================

use crate::models::Source;

/// What a `[n]` marker turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Citation<'a> {
    /// 1-based number and the source it points at
    Resolved { number: usize, source: &'a Source },
    /// Zero, too large, or unparseable: keep the marker text as written
    OutOfRange,
}

/// Resolve the digits of a citation marker (1-based) against `sources`.
///
/// Leading zeros are accepted; `0`, values past the end, and values too large
/// for `usize` are out of range.
pub fn resolve<'a>(digits: &str, sources: &'a [Source]) -> Citation<'a> {
    let Ok(number) = digits.parse::<usize>() else {
        return Citation::OutOfRange;
    };
    match number.checked_sub(1).and_then(|index| sources.get(index)) {
        Some(source) => Citation::Resolved { number, source },
        None => Citation::OutOfRange,
    }
}
