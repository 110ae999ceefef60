//! Payables and receivables matchers.
//!
//! Both walk the ledger in row order, ask the rule table what to do with
//! each entry, and only then search bank movements on one side of the
//! statement. A winning movement is consumed for the rest of the run.

use log::debug;
use rust_decimal::Decimal;

use crate::matcher::{amount_candidates, best_candidate, Side};
use crate::model::{BankMovement, LedgerEntry, Observation};
use crate::rules::{RuleAction, RuleContext, RuleTable};

/// Outcome of a bank search for one entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Search {
    NoCandidate,
    /// Amount candidates exist, none of them dated.
    NoDatedCandidate,
    Found { index: usize, by_folio: bool },
}

/// Shared state of one ledger pass.
pub struct LedgerPass<'a> {
    pub bank: &'a [BankMovement],
    pub available: &'a mut [bool],
    pub tolerance: Decimal,
    pub rules: &'a RuleTable,
}

impl LedgerPass<'_> {
    fn pool(&self, side: Side) -> Vec<Option<Decimal>> {
        self.bank.iter().map(|m| side.amount(m)).collect()
    }

    fn search(&self, entry: &LedgerEntry, side: Side, folio_first: bool) -> Search {
        let Some(target) = entry.amount else {
            return Search::NoCandidate;
        };
        let pool = self.pool(side);
        let candidates = amount_candidates(&pool, &*self.available, target, self.tolerance);
        if candidates.is_empty() {
            return Search::NoCandidate;
        }

        let by_folio: Vec<usize> = if folio_first && entry.has_folio() {
            candidates
                .iter()
                .copied()
                .filter(|&i| references_folio(&self.bank[i], &entry.folio))
                .collect()
        } else {
            Vec::new()
        };

        let (scope, restricted) = if by_folio.is_empty() {
            (&candidates, false)
        } else {
            (&by_folio, true)
        };

        match best_candidate(entry, self.bank, scope) {
            Some((index, score)) => {
                debug!("row {} -> bank row {} (score {score:.1})", entry.row, self.bank[index].row);
                Search::Found { index, by_folio: restricted }
            }
            None => Search::NoDatedCandidate,
        }
    }

    fn consume(&mut self, index: usize) {
        self.available[index] = false;
    }

    /// Run `entry` through the rule table and the bank search.
    fn resolve(&mut self, entry: &mut LedgerEntry, context: RuleContext, side: Side, folio_first: bool) {
        if entry.amount.is_none() {
            entry.mark_unpaid(Observation::NoAmount);
            return;
        }

        match self.rules.decide(context, entry.method, entry.payment_form) {
            RuleAction::PaidOutsideBank => {
                let reason = if entry.payment_form.is_cash() {
                    Observation::CashPayment
                } else {
                    Observation::OutsideBank
                };
                entry.mark_paid_other(reason);
            }
            RuleAction::WithholdUnpaid => match self.search(entry, side, folio_first) {
                Search::Found { .. } => entry.mark_unpaid(Observation::PpdWithheld),
                _ => entry.mark_unpaid(Observation::PpdPending),
            },
            RuleAction::LinkUnpaid => match self.search(entry, side, folio_first) {
                Search::Found { .. } => entry.mark_unpaid(Observation::LinkedUnpaid),
                Search::NoCandidate => entry.mark_unpaid(Observation::NoCandidate),
                Search::NoDatedCandidate => entry.mark_unpaid(Observation::NoDatedCandidate),
            },
            RuleAction::SettleOnIssueDate if entry.issue_date.is_some() => {
                entry.settle_on_issue_date();
                if let Search::Found { index, .. } = self.search(entry, side, folio_first) {
                    self.consume(index);
                    entry.settle(self.bank[index].date, Observation::PueConfirmed);
                }
            }
            RuleAction::SettleOnIssueDate | RuleAction::RequireBankMatch => {
                match self.search(entry, side, folio_first) {
                    Search::Found { index, by_folio } => {
                        self.consume(index);
                        let reason = if by_folio {
                            Observation::FolioAndAmount
                        } else {
                            Observation::Reconciled
                        };
                        entry.settle(self.bank[index].date, reason);
                    }
                    Search::NoCandidate => entry.mark_unpaid(Observation::NoCandidate),
                    Search::NoDatedCandidate => entry.mark_unpaid(Observation::NoDatedCandidate),
                }
            }
        }
    }
}

/// The bank row mentions `folio` in its description or already carries it.
pub fn references_folio(movement: &BankMovement, folio: &str) -> bool {
    let folio = folio.trim();
    if folio.is_empty() {
        return false;
    }
    movement
        .description
        .to_uppercase()
        .contains(&folio.to_uppercase())
        || movement
            .invoice_folio
            .as_deref()
            .is_some_and(|f| f.trim().eq_ignore_ascii_case(folio))
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Payables against bank debits.
pub fn reconcile_payables(entries: &mut [LedgerEntry], pass: &mut LedgerPass<'_>) {
    for entry in entries.iter_mut() {
        pass.resolve(entry, RuleContext::Payables, Side::Debit, false);
    }
}

/// Receivables against bank credits, folio references first.
pub fn reconcile_receivables(entries: &mut [LedgerEntry], pass: &mut LedgerPass<'_>) {
    for entry in entries.iter_mut() {
        pass.resolve(entry, RuleContext::Receivables, Side::Credit, true);
    }
}
