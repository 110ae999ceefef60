//! Matching primitives shared by every matcher.
//!
//! Records live in plain vectors (the arena); availability lives in a
//! parallel vector next to them. Candidate search is a pure function of
//! (pool, availability, target, tolerance); only the caller flips flags.

use rust_decimal::Decimal;

use crate::model::{BankMovement, LedgerEntry};
use crate::similarity::token_set_ratio;

/// Base score for a candidate with a valid movement date.
pub const DATED_BASE_SCORE: f64 = 1000.0;
/// Date proximity bonus: `max(0, window - |days|)`.
pub const DATE_PROXIMITY_WINDOW: i64 = 300;

/// Which amount column of the bank statement a matcher reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    /// The side's amount; a `0.00` cell in the unused column counts as absent.
    pub fn amount(&self, movement: &BankMovement) -> Option<Decimal> {
        let amount = match self {
            Self::Debit => movement.debit,
            Self::Credit => movement.credit,
        };
        amount.filter(|a| !a.is_zero())
    }
}

/// `|a - b| <= tolerance`. A missing value never matches anything.
pub fn within_tolerance(a: Option<Decimal>, b: Option<Decimal>, tolerance: Decimal) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() <= tolerance,
        _ => false,
    }
}

/// Indices of available pool members within tolerance of `target`, in pool order.
pub fn amount_candidates(
    pool: &[Option<Decimal>],
    available: &[bool],
    target: Decimal,
    tolerance: Decimal,
) -> Vec<usize> {
    pool.iter()
        .enumerate()
        .filter(|(i, amount)| {
            available.get(*i).copied().unwrap_or(false)
                && within_tolerance(**amount, Some(target), tolerance)
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Multi-factor score of `movement` as the payment of `entry`.
/// `None` when the movement has no date (not a candidate at all).
pub fn score(entry: &LedgerEntry, movement: &BankMovement) -> Option<f64> {
    let movement_date = movement.date?;
    let mut total = DATED_BASE_SCORE;

    if let Some(issued) = entry.issue_date {
        let days = (issued - movement_date).num_days().abs();
        total += (DATE_PROXIMITY_WINDOW - days).max(0) as f64;
    }

    if !entry.concept.is_empty() && !movement.description.is_empty() {
        total += token_set_ratio(&entry.concept, &movement.description);
    }

    Some(total)
}

/// Highest-scoring candidate; ties go to the earliest index in `candidates`.
pub fn best_candidate(
    entry: &LedgerEntry,
    bank: &[BankMovement],
    candidates: &[usize],
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for &i in candidates {
        let Some(s) = bank.get(i).and_then(|m| score(entry, m)) else {
            continue;
        };
        if best.map_or(true, |(_, top)| s > top) {
            best = Some((i, s));
        }
    }
    best
}
