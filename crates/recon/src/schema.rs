//! Schema mapping: resolve columns once, produce typed records.
//!
//! Nothing downstream of this module looks at header strings. Each loader
//! returns the records plus a binding that remembers where annotations go
//! when results are written back onto the table.

use log::debug;

use crate::error::Result;
use crate::fields::{ColumnAliases, Field, Resolver, TableKind};
use crate::model::{BankMovement, LedgerEntry, PaymentComplement, PaymentForm, SettlementMethod};
use crate::normalize::{parse_amount, parse_date, parse_date_column};
use crate::table::Table;

fn text_at(table: &Table, row: usize, col: Option<usize>) -> String {
    col.and_then(|c| table.get(row, c).text()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Bank
// ---------------------------------------------------------------------------

/// Which amount columns the current mode cannot do without.
#[derive(Debug, Clone, Copy, Default)]
pub struct BankNeeds {
    pub debit: bool,
    pub credit: bool,
}

/// Output headers on the bank table.
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    pub invoice_folio: String,
    pub invoice_date: String,
    pub complement_folio: String,
    pub complement_date: String,
}

pub fn load_bank(
    table: &Table,
    aliases: &ColumnAliases,
    needs: BankNeeds,
) -> Result<(Vec<BankMovement>, ColumnBinding)> {
    let r = Resolver::new(table, TableKind::Bank, aliases);

    let debit = if needs.debit { Some(r.required(Field::Debit)?) } else { r.optional(Field::Debit) };
    let credit = if needs.credit { Some(r.required(Field::Credit)?) } else { r.optional(Field::Credit) };
    let date = r.required(Field::MovementDate)?;
    let description = r.optional(Field::Description);
    let invoice_folio = r.optional(Field::InvoiceFolio);
    let invoice_date = r.optional(Field::InvoiceDate);
    let complement_folio = r.optional(Field::ComplementFolio);
    let complement_date = r.optional(Field::ComplementDate);

    let dates = parse_date_column(table.column_values(date));
    let present = |row: usize, col: Option<usize>| Some(text_at(table, row, col)).filter(|s| !s.is_empty());

    let movements: Vec<BankMovement> = (0..table.len())
        .map(|row| BankMovement {
            row,
            debit: debit.and_then(|c| parse_amount(table.get(row, c))),
            credit: credit.and_then(|c| parse_amount(table.get(row, c))),
            date: dates[row],
            description: text_at(table, row, description),
            invoice_folio: present(row, invoice_folio),
            invoice_date: present(row, invoice_date),
            complement_folio: present(row, complement_folio),
            complement_date: present(row, complement_date),
        })
        .collect();

    debug!(
        "bank: {} movements, {} dated",
        movements.len(),
        movements.iter().filter(|m| m.date.is_some()).count()
    );

    let binding = ColumnBinding {
        invoice_folio: r.output_header(Field::InvoiceFolio),
        invoice_date: r.output_header(Field::InvoiceDate),
        complement_folio: r.output_header(Field::ComplementFolio),
        complement_date: r.output_header(Field::ComplementDate),
    };

    Ok((movements, binding))
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Payables or receivables table.
pub fn load_ledger(
    table: &Table,
    kind: TableKind,
    aliases: &ColumnAliases,
    require_folio: bool,
) -> Result<Vec<LedgerEntry>> {
    let r = Resolver::new(table, kind, aliases);

    let amount = r.required(Field::Amount)?;
    let folio = if require_folio { Some(r.required(Field::Folio)?) } else { r.optional(Field::Folio) };
    let issue_date = r.optional(Field::IssueDate);
    let concept = r.optional(Field::Concept);
    let payment_form = r.optional(Field::PaymentForm);
    let method = r.optional(Field::SettlementMethod);

    let entries: Vec<LedgerEntry> = (0..table.len())
        .map(|row| {
            let mut e = LedgerEntry::new(row, parse_amount(table.get(row, amount)));
            e.issue_date = issue_date.and_then(|c| parse_date(table.get(row, c)));
            e.concept = text_at(table, row, concept);
            e.payment_form = PaymentForm::parse(&text_at(table, row, payment_form));
            e.method = SettlementMethod::parse(&text_at(table, row, method));
            e.folio = text_at(table, row, folio);
            e
        })
        .collect();

    debug!(
        "{kind}: {} entries, {} without a parsable amount",
        entries.len(),
        entries.iter().filter(|e| e.amount.is_none()).count()
    );

    Ok(entries)
}

// ---------------------------------------------------------------------------
// Complements
// ---------------------------------------------------------------------------

pub fn load_complements(table: &Table, aliases: &ColumnAliases) -> Result<Vec<PaymentComplement>> {
    let r = Resolver::new(table, TableKind::Complements, aliases);

    let document_folio = r.required(Field::DocumentFolio)?;
    let amount_paid = r.required(Field::AmountPaid)?;
    let complement_folio = r.optional(Field::ComplementFolio);
    let document_date = r.optional(Field::DocumentDate);
    let complement_date = r.optional(Field::ComplementDate);

    Ok((0..table.len())
        .map(|row| PaymentComplement {
            row,
            document_folio: text_at(table, row, Some(document_folio)),
            amount_paid: parse_amount(table.get(row, amount_paid)),
            complement_folio: text_at(table, row, complement_folio),
            document_date: document_date.and_then(|c| parse_date(table.get(row, c))),
            complement_date: complement_date.and_then(|c| parse_date(table.get(row, c))),
        })
        .collect())
}
