//! Property-based tests for the balance guard.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{NewJournalLine, Side};
use super::validation::{BALANCE_TOLERANCE, EntryTotals, validate_lines};

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Debit), Just(Side::Credit)]
}

fn line(side: Side, amount: Decimal) -> NewJournalLine {
    NewJournalLine {
        account_id: AccountId::new(),
        side,
        amount,
    }
}

/// Splits `total` into `parts` positive-or-zero pieces that sum exactly.
fn split(total: Decimal, parts: usize) -> Vec<Decimal> {
    let parts_dec = Decimal::from(parts);
    let share = (total / parts_dec).round_dp(2);
    let mut pieces = vec![share; parts - 1];
    let used: Decimal = pieces.iter().sum();
    pieces.push(total - used);
    pieces
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any multi-line entry whose sides sum equally passes the guard.
    #[test]
    fn prop_balanced_entries_pass(
        total in positive_amount(),
        debit_parts in 1usize..5,
        credit_parts in 1usize..5,
    ) {
        prop_assume!(total >= Decimal::new(5, 0));
        let mut lines: Vec<NewJournalLine> = split(total, debit_parts)
            .into_iter()
            .map(|a| line(Side::Debit, a))
            .collect();
        lines.extend(split(total, credit_parts).into_iter().map(|a| line(Side::Credit, a)));
        prop_assume!(lines.iter().all(|l| l.amount >= Decimal::ZERO));

        let totals = validate_lines(&lines).unwrap();
        prop_assert_eq!(totals.debit, total);
        prop_assert_eq!(totals.credit, total);
    }

    /// A difference larger than the tolerance is always rejected.
    #[test]
    fn prop_difference_beyond_tolerance_rejected(
        amount in positive_amount(),
        extra in 2i64..1_000_000i64,
        side in side_strategy(),
    ) {
        let extra = Decimal::new(extra, 4);
        prop_assert!(extra > BALANCE_TOLERANCE);
        let lines = [line(side, amount + extra), line(side.flip(), amount)];

        let result = validate_lines(&lines);
        prop_assert!(matches!(result, Err(LedgerError::Unbalanced { .. })), "got {:?}", result);
    }

    /// Negative amounts are rejected regardless of balance.
    #[test]
    fn prop_negative_amount_rejected(amount in positive_amount(), side in side_strategy()) {
        let lines = [line(side, -amount), line(side.flip(), -amount)];
        prop_assert!(matches!(validate_lines(&lines), Err(LedgerError::NegativeAmount)));
    }

    /// Flipping every side of a valid entry keeps it valid with totals swapped.
    #[test]
    fn prop_flipped_entry_stays_balanced(amount in positive_amount(), side in side_strategy()) {
        let lines = [line(side, amount), line(side.flip(), amount)];
        let flipped: Vec<NewJournalLine> = lines
            .iter()
            .map(|l| line(l.side.flip(), l.amount))
            .collect();

        let before = EntryTotals::of(&lines);
        let after = validate_lines(&flipped).unwrap();
        prop_assert_eq!(before.debit, after.credit);
        prop_assert_eq!(before.credit, after.debit);
    }
}
