//! PPD settlement through payment complements (CFDI de pago).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::matcher::{within_tolerance, Side};
use crate::model::{LedgerEntry, Observation, PaymentComplement};
use crate::normalize::format_date;
use crate::statement::{BankState, StatementBook};

/// All complements paying one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementGroup {
    pub document_folio: String,
    /// Sum of the parsable amounts; `None` when no row had one.
    pub total: Option<Decimal>,
    /// Distinct complement folios, `-`-joined in row order.
    pub complement_folios: String,
    pub document_date: Option<NaiveDate>,
    pub complement_date: Option<NaiveDate>,
}

/// Group by document folio, ascending. Rows without a folio are dropped.
pub fn group_complements(rows: &[PaymentComplement]) -> Vec<ComplementGroup> {
    let mut groups: BTreeMap<&str, Vec<&PaymentComplement>> = BTreeMap::new();
    for row in rows {
        let folio = row.document_folio.trim();
        if folio.is_empty() {
            continue;
        }
        groups.entry(folio).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(folio, members)| {
            let amounts: Vec<Decimal> = members.iter().filter_map(|c| c.amount_paid).collect();
            let total = (!amounts.is_empty()).then(|| amounts.iter().copied().sum::<Decimal>());

            let mut folios: Vec<&str> = Vec::new();
            for c in &members {
                let f = c.complement_folio.trim();
                if !f.is_empty() && !folios.contains(&f) {
                    folios.push(f);
                }
            }

            ComplementGroup {
                document_folio: folio.to_string(),
                total,
                complement_folios: folios.join("-"),
                document_date: members.iter().filter_map(|c| c.document_date).min(),
                complement_date: members.iter().filter_map(|c| c.complement_date).max(),
            }
        })
        .collect()
}

/// Match each group against bank credits that are free or provisionally
/// linked to the same folio. Returns the number of groups settled.
pub fn settle_complements(
    groups: &[ComplementGroup],
    book: &mut StatementBook,
    mut receivables: Option<&mut [LedgerEntry]>,
    tolerance: Decimal,
) -> usize {
    let mut settled = 0;

    for group in groups {
        let total = match group.total {
            Some(t) if t > Decimal::ZERO => t,
            other => {
                warn!(
                    "complements for folio {}: skipped, total {:?} is not positive",
                    group.document_folio, other
                );
                continue;
            }
        };

        let hit = (0..book.movements.len()).find(|&i| {
            book.states[i].open_for(&group.document_folio)
                && within_tolerance(Side::Credit.amount(&book.movements[i]), Some(total), tolerance)
        });
        let Some(idx) = hit else {
            debug!("complements for folio {}: no bank credit of {total}", group.document_folio);
            continue;
        };

        let movement = &mut book.movements[idx];
        movement.invoice_folio = Some(group.document_folio.clone());
        if !group.complement_folios.is_empty() {
            movement.complement_folio = Some(group.complement_folios.clone());
        }
        if !movement.has_invoice_date() {
            movement.invoice_date = group.document_date.map(format_date);
        }
        movement.complement_date = group.complement_date.map(format_date);
        book.states[idx] = BankState::Consumed;
        settled += 1;

        let date = movement.date;
        if let Some(entries) = receivables.as_deref_mut() {
            // every row of the invoice, split lines included
            for entry in entries.iter_mut().filter(|e| e.folio.trim() == group.document_folio) {
                entry.settle(date, Observation::ComplementSettled);
            }
        }
        debug!("complements for folio {} settled on bank row {}", group.document_folio, movement.row);
    }

    settled
}
