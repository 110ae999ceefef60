//! Cancelled rows go last; everything else keeps its order.

use crate::fields::{pick_column, ColumnAliases, Field, TableKind};
use crate::table::Table;

/// Stable partition of `table` by "status contains CANCEL". Returns false
/// when no status-like column resolves (table untouched).
pub fn cancelled_last(table: &mut Table, kind: TableKind, aliases: &ColumnAliases) -> bool {
    let Some(col) = pick_column(table, &aliases.candidates(kind, Field::Status)) else {
        return false;
    };

    let cancelled: Vec<bool> = (0..table.len())
        .map(|r| {
            table
                .get(r, col)
                .text()
                .is_some_and(|s| s.to_uppercase().contains("CANCEL"))
        })
        .collect();

    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by_key(|&r| cancelled[r]);
    table.reorder(&order);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_rows_move_to_end() {
        let mut t = Table::from_rows(
            "payables",
            &["FOLIO", "ESTATUS"],
            &[
                &["A", "Cancelado"],
                &["B", "Vigente"],
                &["C", "CANCELADA"],
                &["D", ""],
            ],
        );
        assert!(cancelled_last(&mut t, TableKind::Payables, &ColumnAliases::default()));
        let folios: Vec<String> = (0..t.len()).map(|r| t.get(r, 0).to_string()).collect();
        assert_eq!(folios, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn no_status_column_is_noop() {
        let mut t = Table::from_rows("bank", &["FOLIO"], &[&["A"], &["B"]]);
        assert!(!cancelled_last(&mut t, TableKind::Bank, &ColumnAliases::default()));
        assert_eq!(t.get(0, 0).to_string(), "A");
    }
}
