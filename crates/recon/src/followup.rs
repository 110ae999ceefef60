//! Secondary pass over the statement, after complements.

use log::debug;
use rust_decimal::Decimal;

use crate::matcher::{within_tolerance, Side};
use crate::model::{LedgerEntry, Observation, Status};
use crate::normalize::format_date;
use crate::rules::{RuleContext, RuleTable};
use crate::statement::{BankState, StatementBook};

/// Unpaid receivables against free bank credits, amount only. First free
/// credit within tolerance wins. Rows the rule table keeps off the bank
/// (PPD, cash, restricted PUE) are left as they are.
pub fn settle_by_amount(
    book: &mut StatementBook,
    receivables: &mut [LedgerEntry],
    rules: &RuleTable,
    tolerance: Decimal,
) -> usize {
    let mut settled = 0;
    for entry in receivables.iter_mut() {
        if entry.status != Status::Unpaid || entry.amount.is_none() || entry.payment_form.is_cash() {
            continue;
        }
        if !rules
            .decide(RuleContext::Statement, entry.method, entry.payment_form)
            .settles_on_statement()
        {
            continue;
        }
        let hit = (0..book.movements.len()).find(|&i| {
            book.states[i].is_free()
                && within_tolerance(Side::Credit.amount(&book.movements[i]), entry.amount, tolerance)
        });
        let Some(idx) = hit else {
            continue;
        };

        let movement = &mut book.movements[idx];
        entry.settle(movement.date, Observation::AmountOnly);
        if !movement.has_invoice_folio() && entry.has_folio() {
            movement.invoice_folio = Some(entry.folio.clone());
            if !movement.has_invoice_date() {
                movement.invoice_date = entry.issue_date.map(format_date);
            }
        }
        book.states[idx] = BankState::Consumed;
        settled += 1;
        debug!("ledger row {} settled by amount on bank row {}", entry.row, movement.row);
    }
    settled
}

/// Copy folio and invoice date from a referenced movement to an
/// unreferenced one of the same amount. Both must be unconsumed; each
/// origin feeds at most one destination.
pub fn propagate_pass_through(book: &mut StatementBook, tolerance: Decimal) -> usize {
    let open = |state: &BankState| *state != BankState::Consumed;

    let origins: Vec<usize> = (0..book.movements.len())
        .filter(|&i| open(&book.states[i]) && book.movements[i].has_invoice_folio())
        .collect();

    let mut copied = 0;
    for origin in origins {
        let amount = book.movements[origin].amount();
        let target = (0..book.movements.len()).find(|&i| {
            i != origin
                && open(&book.states[i])
                && !book.movements[i].has_invoice_folio()
                && within_tolerance(book.movements[i].amount(), amount, tolerance)
        });
        let Some(dest) = target else {
            continue;
        };

        let folio = book.movements[origin].invoice_folio.clone();
        let date = book.movements[origin].invoice_date.clone();
        let movement = &mut book.movements[dest];
        movement.invoice_folio = folio;
        movement.invoice_date = date;
        copied += 1;
        debug!("pass-through: bank row {origin} -> bank row {dest}");
    }
    copied
}
