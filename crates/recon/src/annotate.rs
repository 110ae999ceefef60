//! Write match results back onto the output tables.

use crate::fields::TableKind;
use crate::model::{BankMovement, LedgerEntry};
use crate::normalize::format_date;
use crate::schema::ColumnBinding;
use crate::table::{Table, Value};

pub const RECONCILED_COLUMN: &str = "CONCILIADO_BANCO";
pub const PAYMENT_DATE_COLUMN: &str = "FECHA_DE_PAGO";
pub const OBSERVATION_COLUMN: &str = "OBSERVACION";

pub fn status_column(kind: TableKind) -> &'static str {
    match kind {
        TableKind::Receivables => "ESTADO_INGRESO",
        _ => "ESTADO_EGRESO",
    }
}

pub fn write_ledger(table: &mut Table, kind: TableKind, entries: &[LedgerEntry]) {
    let reconciled = table.ensure_column(RECONCILED_COLUMN);
    let status = table.ensure_column(status_column(kind));
    let payment_date = table.ensure_column(PAYMENT_DATE_COLUMN);
    let observation = table.ensure_column(OBSERVATION_COLUMN);

    for e in entries {
        table.set(e.row, reconciled, Value::from(if e.reconciled { "SI" } else { "NO" }));
        table.set(e.row, status, Value::from(e.status.label()));
        table.set(e.row, payment_date, Value::from(e.payment_date.map(format_date)));
        table.set(e.row, observation, Value::from(e.observation.map(|o| o.label())));
    }
}

pub fn write_bank(table: &mut Table, binding: &ColumnBinding, movements: &[BankMovement]) {
    let folio = table.ensure_column(&binding.invoice_folio);
    let invoice_date = table.ensure_column(&binding.invoice_date);
    let complement_folio = table.ensure_column(&binding.complement_folio);
    let complement_date = table.ensure_column(&binding.complement_date);

    for m in movements {
        table.set(m.row, folio, Value::from(m.invoice_folio.clone()));
        table.set(m.row, invoice_date, Value::from(m.invoice_date.clone()));
        table.set(m.row, complement_folio, Value::from(m.complement_folio.clone()));
        table.set(m.row, complement_date, Value::from(m.complement_date.clone()));
    }
}
