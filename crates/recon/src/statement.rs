//! Statement cross-reference: walk the bank statement and attribute each
//! movement to a payable (debits) or a receivable (credits).

use log::debug;
use rust_decimal::Decimal;

use crate::matcher::within_tolerance;
use crate::model::{BankMovement, LedgerEntry, Observation, SettlementMethod};
use crate::normalize::format_date;
use crate::rules::{RuleContext, RuleTable};

/// Attribution state of one bank movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankState {
    Free,
    /// Folio attached by a link-only match; nothing settled yet.
    Provisional { folio: String },
    Consumed,
}

impl BankState {
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    /// Free, or provisionally linked to `folio`.
    pub fn open_for(&self, folio: &str) -> bool {
        match self {
            Self::Free => true,
            Self::Provisional { folio: linked } => linked == folio,
            Self::Consumed => false,
        }
    }
}

/// Bank statement plus per-movement state, shared by the statement stages.
#[derive(Debug, Clone)]
pub struct StatementBook {
    pub movements: Vec<BankMovement>,
    pub states: Vec<BankState>,
}

impl StatementBook {
    pub fn new(movements: Vec<BankMovement>) -> Self {
        let states = vec![BankState::Free; movements.len()];
        Self { movements, states }
    }
}

/// One ledger side of the unified pass.
pub struct Pool<'a> {
    pub entries: &'a mut [LedgerEntry],
    /// Entry indices by issue date, undated last.
    order: Vec<usize>,
    used: Vec<bool>,
}

impl<'a> Pool<'a> {
    pub fn new(entries: &'a mut [LedgerEntry]) -> Self {
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by_key(|&i| (entries[i].issue_date.is_none(), entries[i].issue_date));
        let used = vec![false; entries.len()];
        Self { entries, order, used }
    }

    /// First non-PPD candidate in issue-date order; the earliest PPD one only
    /// when `ppd_fallback` is set and no other candidate exists.
    fn select(&self, amount: Decimal, tolerance: Decimal, ppd_fallback: bool) -> Option<usize> {
        let mut fallback = None;
        for &i in &self.order {
            let e = &self.entries[i];
            if self.used[i] || !within_tolerance(e.amount, Some(amount), tolerance) {
                continue;
            }
            if e.method != SettlementMethod::Ppd {
                return Some(i);
            }
            if fallback.is_none() {
                fallback = Some(i);
            }
        }
        fallback.filter(|_| ppd_fallback)
    }
}

pub struct UnifiedPass<'a> {
    pub tolerance: Decimal,
    pub rules: &'a RuleTable,
    pub ppd_fallback: bool,
}

impl UnifiedPass<'_> {
    pub fn run(
        &self,
        book: &mut StatementBook,
        mut payables: Option<&mut Pool<'_>>,
        mut receivables: Option<&mut Pool<'_>>,
    ) -> usize {
        let mut attributed = 0;
        for idx in 0..book.movements.len() {
            if !book.states[idx].is_free() {
                continue;
            }
            let movement = &book.movements[idx];
            let debit = movement.debit.filter(|d| !d.is_zero());
            let credit = movement.credit.filter(|c| !c.is_zero());

            let hit = match (debit, payables.as_deref_mut()) {
                (Some(amount), Some(pool)) => self.attribute(book, idx, pool, amount),
                _ => false,
            };
            let hit = hit
                || match (credit, receivables.as_deref_mut()) {
                    (Some(amount), Some(pool)) => self.attribute(book, idx, pool, amount),
                    _ => false,
                };
            if hit {
                attributed += 1;
            }
        }
        attributed
    }

    fn attribute(&self, book: &mut StatementBook, idx: usize, pool: &mut Pool<'_>, amount: Decimal) -> bool {
        let Some(i) = pool.select(amount, self.tolerance, self.ppd_fallback) else {
            return false;
        };
        pool.used[i] = true;

        let entry = &mut pool.entries[i];
        let movement = &mut book.movements[idx];
        let action = self
            .rules
            .decide(RuleContext::Statement, entry.method, entry.payment_form);
        // Blank ledger values never erase what the bank row already carries
        if entry.has_folio() {
            movement.invoice_folio = Some(entry.folio.trim().to_string());
        }

        if action.settles_on_statement() {
            entry.settle(movement.date, Observation::Reconciled);
            if let Some(issued) = entry.issue_date {
                movement.invoice_date = Some(format_date(issued));
            }
            book.states[idx] = BankState::Consumed;
            debug!("bank row {} settles ledger row {}", movement.row, entry.row);
        } else {
            let reason = if entry.method == SettlementMethod::Ppd {
                Observation::PpdPending
            } else {
                Observation::LinkedUnpaid
            };
            entry.mark_unpaid(reason);
            book.states[idx] = BankState::Provisional { folio: entry.folio.clone() };
            debug!("bank row {} linked to ledger row {} ({action:?})", movement.row, entry.row);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PaymentForm, Status};
    use chrono::NaiveDate;

    fn d(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn movement(row: usize, debit: Option<i64>, credit: Option<i64>, on: &str) -> BankMovement {
        let mut m = BankMovement::new(row);
        m.debit = debit.map(Decimal::from);
        m.credit = credit.map(Decimal::from);
        m.date = d(on);
        m
    }

    fn entry(row: usize, folio: &str, amount: i64, issued: &str, method: SettlementMethod) -> LedgerEntry {
        let mut e = LedgerEntry::new(row, Some(Decimal::from(amount)));
        e.folio = folio.into();
        e.issue_date = d(issued);
        e.method = method;
        e
    }

    fn pass(rules: &RuleTable) -> UnifiedPass<'_> {
        UnifiedPass { tolerance: Decimal::ONE, rules, ppd_fallback: true }
    }

    #[test]
    fn pool_orders_by_issue_date_undated_last() {
        let mut entries = vec![
            entry(0, "A", 1, "", SettlementMethod::Pue),
            entry(1, "B", 1, "2024-02-01", SettlementMethod::Pue),
            entry(2, "C", 1, "2024-01-01", SettlementMethod::Pue),
        ];
        let pool = Pool::new(&mut entries);
        assert_eq!(pool.order, vec![2, 1, 0]);
    }

    #[test]
    fn debit_settles_earliest_payable() {
        let rules = RuleTable::default();
        let mut book = StatementBook::new(vec![movement(0, Some(500), None, "2024-01-12")]);
        let mut payables = vec![
            entry(0, "P-2", 500, "2024-01-09", SettlementMethod::Pue),
            entry(1, "P-1", 500, "2024-01-05", SettlementMethod::Pue),
        ];
        let mut pool = Pool::new(&mut payables);
        assert_eq!(pass(&rules).run(&mut book, Some(&mut pool), None), 1);

        assert_eq!(payables[1].status, Status::Paid);
        assert_eq!(payables[1].payment_date, d("2024-01-12"));
        assert_eq!(payables[0].status, Status::Unpaid);
        assert_eq!(book.movements[0].invoice_folio.as_deref(), Some("P-1"));
        assert_eq!(book.movements[0].invoice_date.as_deref(), Some("05/01/2024"));
        assert_eq!(book.states[0], BankState::Consumed);
    }

    #[test]
    fn non_ppd_preferred_over_earlier_ppd() {
        let rules = RuleTable::default();
        let mut book = StatementBook::new(vec![movement(0, None, Some(800), "2024-03-01")]);
        let mut receivables = vec![
            entry(0, "R-PPD", 800, "2024-01-01", SettlementMethod::Ppd),
            entry(1, "R-PUE", 800, "2024-02-01", SettlementMethod::Pue),
        ];
        let mut pool = Pool::new(&mut receivables);
        pass(&rules).run(&mut book, None, Some(&mut pool));
        assert_eq!(receivables[1].status, Status::Paid);
        assert_eq!(book.movements[0].invoice_folio.as_deref(), Some("R-PUE"));
    }

    #[test]
    fn ppd_fallback_links_without_settling() {
        let rules = RuleTable::default();
        let mut book = StatementBook::new(vec![movement(0, None, Some(1000), "2024-03-01")]);
        let mut receivables = vec![entry(0, "F-100", 1000, "2024-01-01", SettlementMethod::Ppd)];
        let mut pool = Pool::new(&mut receivables);
        pass(&rules).run(&mut book, None, Some(&mut pool));

        assert_eq!(receivables[0].status, Status::Unpaid);
        assert_eq!(receivables[0].observation, Some(Observation::PpdPending));
        assert_eq!(book.movements[0].invoice_folio.as_deref(), Some("F-100"));
        assert_eq!(book.movements[0].invoice_date, None);
        assert_eq!(book.states[0], BankState::Provisional { folio: "F-100".into() });
        assert!(book.states[0].open_for("F-100"));
        assert!(!book.states[0].open_for("F-200"));
    }

    #[test]
    fn ppd_fallback_disabled() {
        let rules = RuleTable::default();
        let mut book = StatementBook::new(vec![movement(0, None, Some(1000), "2024-03-01")]);
        let mut receivables = vec![entry(0, "F-100", 1000, "2024-01-01", SettlementMethod::Ppd)];
        let mut pool = Pool::new(&mut receivables);
        let p = UnifiedPass { ppd_fallback: false, ..pass(&rules) };
        assert_eq!(p.run(&mut book, None, Some(&mut pool)), 0);
        assert!(book.states[0].is_free());
    }

    #[test]
    fn restricted_pue_only_links() {
        let rules = RuleTable::default();
        let mut book = StatementBook::new(vec![movement(0, Some(250), None, "2024-01-20")]);
        let mut e = entry(0, "P-9", 250, "2024-01-15", SettlementMethod::Pue);
        e.payment_form = PaymentForm::CreditCard;
        let mut payables = vec![e];
        let mut pool = Pool::new(&mut payables);
        pass(&rules).run(&mut book, Some(&mut pool), None);
        assert_eq!(payables[0].status, Status::Unpaid);
        assert_eq!(payables[0].observation, Some(Observation::LinkedUnpaid));
        assert_eq!(book.movements[0].invoice_folio.as_deref(), Some("P-9"));
    }

    #[test]
    fn cash_entries_only_link_whatever_the_method() {
        let rules = RuleTable::default();
        let mut book = StatementBook::new(vec![
            movement(0, Some(500), None, "2024-01-12"),
            movement(1, None, Some(300), "2024-01-13"),
        ]);
        let mut p = entry(0, "P-5", 500, "2024-01-10", SettlementMethod::Unspecified);
        p.payment_form = PaymentForm::Cash;
        let mut r = entry(0, "R-5", 300, "2024-01-10", SettlementMethod::Unspecified);
        r.payment_form = PaymentForm::Cash;
        let (mut payables, mut receivables) = (vec![p], vec![r]);
        let mut pay_pool = Pool::new(&mut payables);
        let mut rec_pool = Pool::new(&mut receivables);
        pass(&rules).run(&mut book, Some(&mut pay_pool), Some(&mut rec_pool));

        for e in payables.iter().chain(receivables.iter()) {
            assert_eq!(e.status, Status::Unpaid);
            assert_eq!(e.payment_date, None);
            assert_eq!(e.observation, Some(Observation::LinkedUnpaid));
        }
        assert_eq!(book.movements[0].invoice_folio.as_deref(), Some("P-5"));
        assert_eq!(book.states[1], BankState::Provisional { folio: "R-5".into() });
    }

    #[test]
    fn blank_ledger_values_keep_bank_annotations() {
        let rules = RuleTable::default();
        let mut m = movement(0, Some(75), None, "2024-02-02");
        m.invoice_folio = Some("EXT-1".into());
        m.invoice_date = Some("01/02/2024".into());
        let mut book = StatementBook::new(vec![m]);
        let mut payables = vec![entry(0, "", 75, "", SettlementMethod::Pue)];
        let mut pool = Pool::new(&mut payables);
        pass(&rules).run(&mut book, Some(&mut pool), None);

        assert_eq!(payables[0].status, Status::Paid);
        assert_eq!(book.movements[0].invoice_folio.as_deref(), Some("EXT-1"));
        assert_eq!(book.movements[0].invoice_date.as_deref(), Some("01/02/2024"));
    }

    #[test]
    fn ledger_row_used_once() {
        let rules = RuleTable::default();
        let mut book = StatementBook::new(vec![
            movement(0, Some(90), None, "2024-01-02"),
            movement(1, Some(90), None, "2024-01-03"),
        ]);
        let mut payables = vec![entry(0, "P-1", 90, "2024-01-01", SettlementMethod::Pue)];
        let mut pool = Pool::new(&mut payables);
        assert_eq!(pass(&rules).run(&mut book, Some(&mut pool), None), 1);
        assert!(book.states[1].is_free());
        assert_eq!(book.movements[1].invoice_folio, None);
    }
}
