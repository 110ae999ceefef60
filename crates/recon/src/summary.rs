use std::collections::BTreeMap;

use serde::Serialize;

use crate::fields::TableKind;
use crate::model::{BankMovement, LedgerEntry, Observation, Status};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payables: Option<LedgerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receivables: Option<LedgerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<BankSummary>,
}

impl ReconSummary {
    /// Ledger rows not paid by any means.
    pub fn unpaid(&self) -> usize {
        [&self.payables, &self.receivables]
            .into_iter()
            .flatten()
            .map(|s| s.unpaid)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub total: usize,
    pub paid: usize,
    pub paid_other: usize,
    pub unpaid: usize,
    /// Observation label → count.
    pub by_reason: BTreeMap<String, usize>,
    #[serde(skip)]
    kind: TableKind,
}

impl LedgerSummary {
    /// Report lines keyed the way the business reads them.
    pub fn labeled(&self) -> Vec<(&'static str, usize)> {
        let total_label = match self.kind {
            TableKind::Receivables => "Ingresos totales",
            _ => "Egresos totales",
        };
        vec![
            (total_label, self.total),
            ("Pagados", self.paid),
            ("Pagados por otro medio", self.paid_other),
            ("No pagados", self.unpaid),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankSummary {
    pub total: usize,
    pub with_folio: usize,
    pub with_complement: usize,
    pub unreferenced: usize,
}

pub fn summarize_ledger(kind: TableKind, entries: &[LedgerEntry]) -> LedgerSummary {
    let mut by_reason: BTreeMap<Observation, usize> = BTreeMap::new();
    let (mut paid, mut paid_other, mut unpaid) = (0, 0, 0);

    for e in entries {
        match e.status {
            Status::Paid => paid += 1,
            Status::PaidOther => paid_other += 1,
            Status::Unpaid => unpaid += 1,
        }
        if let Some(o) = e.observation {
            *by_reason.entry(o).or_insert(0) += 1;
        }
    }

    LedgerSummary {
        total: entries.len(),
        paid,
        paid_other,
        unpaid,
        by_reason: by_reason
            .into_iter()
            .map(|(o, n)| (o.label().to_string(), n))
            .collect(),
        kind,
    }
}

pub fn summarize_bank(movements: &[BankMovement]) -> BankSummary {
    let with_folio = movements.iter().filter(|m| m.has_invoice_folio()).count();
    let with_complement = movements
        .iter()
        .filter(|m| m.complement_folio.as_deref().is_some_and(|f| !f.trim().is_empty()))
        .count();
    BankSummary {
        total: movements.len(),
        with_folio,
        with_complement,
        unreferenced: movements.len() - with_folio,
    }
}
