//! The balance guard every entry passes before it is written.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{Posting, Side};
use crate::currency::is_storable;

/// Largest absolute debit/credit difference still considered balanced.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryTotals {
    /// Sum of debit amounts.
    pub debit: Decimal,
    /// Sum of credit amounts.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Sums the lines by side.
    pub fn of<'a, P, I>(lines: I) -> Self
    where
        P: Posting + 'a,
        I: IntoIterator<Item = &'a P>,
    {
        lines
            .into_iter()
            .fold(Self::default(), |mut totals, line| {
                match line.side() {
                    Side::Debit => totals.debit += line.amount(),
                    Side::Credit => totals.credit += line.amount(),
                }
                totals
            })
    }

    /// Absolute difference between the two sides.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        (self.debit - self.credit).abs()
    }

    /// Returns true if the sides agree within [`BALANCE_TOLERANCE`].
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.difference() <= BALANCE_TOLERANCE
    }
}

/// Checks that `lines` form a valid entry.
///
/// Applies to every entry the engine writes, including reversals with more
/// than two lines.
///
/// # Errors
///
/// - `InsufficientLines` with fewer than two lines
/// - `NegativeAmount` if any amount is below zero
/// - `AmountOutOfRange` if any amount does not fit in a ledger amount
/// - `Unbalanced` if debits and credits differ by more than the tolerance
pub fn validate_lines<P: Posting>(lines: &[P]) -> Result<EntryTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }
    if lines.iter().any(|l| l.amount() < Decimal::ZERO) {
        return Err(LedgerError::NegativeAmount);
    }
    // bounded lines keep every sum below Decimal::MAX
    if let Some(line) = lines.iter().find(|l| !is_storable(l.amount())) {
        return Err(LedgerError::AmountOutOfRange(line.amount()));
    }

    let totals = EntryTotals::of(lines);
    if !totals.is_balanced() {
        return Err(LedgerError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(totals)
}
