//! Field resolver: semantic fields → actual column headers.
//!
//! Every field has an ordered list of candidate headers. The first candidate
//! present in the table wins. Headers must already be upper-cased and trimmed
//! (see [`Table::normalize_headers`]).

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ReconError, Result};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    Bank,
    Payables,
    Receivables,
    Complements,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [Self::Bank, Self::Payables, Self::Receivables, Self::Complements];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Payables => "payables",
            Self::Receivables => "receivables",
            Self::Complements => "complements",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    // bank
    Debit,
    Credit,
    MovementDate,
    Description,
    InvoiceFolio,
    InvoiceDate,
    ComplementFolio,
    ComplementDate,
    // ledger
    Amount,
    IssueDate,
    Concept,
    PaymentForm,
    SettlementMethod,
    Folio,
    // complements
    DocumentFolio,
    AmountPaid,
    DocumentDate,
    // any table
    Status,
}

impl Field {
    const ALL: [Field; 18] = [
        Self::Debit,
        Self::Credit,
        Self::MovementDate,
        Self::Description,
        Self::InvoiceFolio,
        Self::InvoiceDate,
        Self::ComplementFolio,
        Self::ComplementDate,
        Self::Amount,
        Self::IssueDate,
        Self::Concept,
        Self::PaymentForm,
        Self::SettlementMethod,
        Self::Folio,
        Self::DocumentFolio,
        Self::AmountPaid,
        Self::DocumentDate,
        Self::Status,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::MovementDate => "date",
            Self::Description => "description",
            Self::InvoiceFolio => "invoice_folio",
            Self::InvoiceDate => "invoice_date",
            Self::ComplementFolio => "complement_folio",
            Self::ComplementDate => "complement_date",
            Self::Amount => "amount",
            Self::IssueDate => "issue_date",
            Self::Concept => "concept",
            Self::PaymentForm => "payment_form",
            Self::SettlementMethod => "settlement_method",
            Self::Folio => "folio",
            Self::DocumentFolio => "document_folio",
            Self::AmountPaid => "amount_paid",
            Self::DocumentDate => "document_date",
            Self::Status => "status",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Built-in candidate headers, most specific first.
    pub fn default_aliases(&self, kind: TableKind) -> &'static [&'static str] {
        match (self, kind) {
            (Self::Debit, _) => &["CARGO", "CARGOS", "RETIRO", "RETIROS", "DEBITO", "DÉBITO"],
            (Self::Credit, _) => &["ABONO", "ABONOS", "CREDITO", "CRÉDITO", "DEPOSITO", "DEPÓSITO"],
            (Self::MovementDate, _) => &[
                "FECHA",
                "FECHA OPERACION",
                "FECHA OPERACIÓN",
                "FECHA MOVIMIENTO",
                "FECHA DE OPERACION",
                "DIA",
            ],
            (Self::Description, _) => &[
                "DESCRIPCION",
                "DESCRIPCIÓN",
                "CONCEPTO",
                "DETALLE",
                "REFERENCIA",
            ],
            (Self::InvoiceFolio, _) => &["FOLIO FACTURA", "FOLIO_FACTURA", "FACTURA"],
            (Self::InvoiceDate, _) => &["FECHA FACTURA", "FECHA_FACTURA"],
            (Self::ComplementFolio, TableKind::Complements) => {
                &["FOLIO", "FOLIO COMPLEMENTO DE PAGO", "FOLIO COMPLEMENTO"]
            }
            (Self::ComplementFolio, _) => &["FOLIO COMPLEMENTO DE PAGO", "FOLIO COMPLEMENTO"],
            (Self::ComplementDate, TableKind::Complements) => {
                &["FECHA EMISION", "FECHA EMISIÓN", "FECHA COMPLEMENTO DE PAGO", "FECHA PAGO"]
            }
            (Self::ComplementDate, _) => &["FECHA COMPLEMENTO DE PAGO", "FECHA COMPLEMENTO"],
            (Self::Amount, _) => &["TOTAL", "IMPORTE", "MONTO", "IMPORTE TOTAL", "TOTAL MXN"],
            (Self::IssueDate, _) => &[
                "FECHA EMISION",
                "FECHA_EMISION",
                "FECHA EMISIÓN",
                "FECHA FACTURA",
                "FECHA",
            ],
            (Self::Concept, TableKind::Receivables) => &[
                "CONCEPTO",
                "DESCRIPCION",
                "DESCRIPCIÓN",
                "NOMBRE RECEPTOR",
                "CLIENTE",
                "RAZON SOCIAL",
            ],
            (Self::Concept, _) => &[
                "CONCEPTO",
                "DESCRIPCION",
                "DESCRIPCIÓN",
                "NOMBRE EMISOR",
                "PROVEEDOR",
                "RAZON SOCIAL",
            ],
            (Self::PaymentForm, _) => &["FORMA PAGO", "FORMA DE PAGO", "FORMA_PAGO"],
            (Self::SettlementMethod, _) => {
                &["METODO PAGO", "METODO DE PAGO", "MÉTODO DE PAGO", "METODO_PAGO"]
            }
            (Self::Folio, _) => &["FOLIO", "FOLIO FACTURA", "FACTURA", "NO FACTURA", "NO_FACTURA"],
            (Self::DocumentFolio, _) => &["FOLIO DOCUMENTO", "FOLIO DOC"],
            (Self::AmountPaid, _) => &["IMPORTE PAGADO", "MONTO PAGADO"],
            (Self::DocumentDate, _) => &[
                "FECHA EMISION (DOC)",
                "FECHA EMISION(DOC)",
                "FECHA EMISION DOC",
                "FECHA DOC",
            ],
            (Self::Status, _) => &[
                "ESTADO",
                "ESTADO DE PAGO",
                "ESTADO_PAGO",
                "ESTATUS",
                "ESTATUS CFDI",
                "ESTADO CFDI",
                "STATUS",
                "SITUACION",
                "SITUACIÓN",
            ],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Alias overrides
// ---------------------------------------------------------------------------

/// Per-table alias overrides, keyed `table → field → candidates`.
/// Fields without an override use [`Field::default_aliases`].
#[derive(Debug, Clone, Default)]
pub struct ColumnAliases {
    overrides: BTreeMap<(TableKind, Field), Vec<String>>,
}

impl ColumnAliases {
    /// Build from the raw `[columns.<table>]` config sections.
    pub fn from_sections(sections: &BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Result<Self> {
        let mut overrides = BTreeMap::new();
        for (table_key, fields) in sections {
            let kind = TableKind::from_key(table_key).ok_or_else(|| {
                ReconError::ConfigValidation(format!("unknown table in [columns]: '{table_key}'"))
            })?;
            for (field_key, aliases) in fields {
                let field = Field::from_key(field_key).ok_or_else(|| {
                    ReconError::ConfigValidation(format!(
                        "[columns.{table_key}]: unknown field '{field_key}'"
                    ))
                })?;
                if aliases.is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "[columns.{table_key}]: '{field_key}' needs at least one alias"
                    )));
                }
                let normalized = aliases.iter().map(|a| a.trim().to_uppercase()).collect();
                overrides.insert((kind, field), normalized);
            }
        }
        Ok(Self { overrides })
    }

    pub fn candidates(&self, kind: TableKind, field: Field) -> Vec<String> {
        match self.overrides.get(&(kind, field)) {
            Some(list) => list.clone(),
            None => field.default_aliases(kind).iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// First candidate present as a column, by candidate order (not column order).
pub fn pick_column<S: AsRef<str>>(table: &Table, candidates: &[S]) -> Option<usize> {
    candidates.iter().find_map(|c| table.column(c.as_ref()))
}

/// Resolves the semantic fields of one table.
pub struct Resolver<'a> {
    table: &'a Table,
    kind: TableKind,
    aliases: &'a ColumnAliases,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a Table, kind: TableKind, aliases: &'a ColumnAliases) -> Self {
        Self { table, kind, aliases }
    }

    pub fn optional(&self, field: Field) -> Option<usize> {
        pick_column(self.table, &self.aliases.candidates(self.kind, field))
    }

    pub fn required(&self, field: Field) -> Result<usize> {
        self.optional(field)
            .ok_or_else(|| ReconError::missing_column(self.kind.key(), field.key()))
    }

    /// Header to write `field` into: the resolved column, or the first alias.
    pub fn output_header(&self, field: Field) -> String {
        let candidates = self.aliases.candidates(self.kind, field);
        match pick_column(self.table, &candidates) {
            Some(idx) => self.table.headers()[idx].clone(),
            None => candidates.into_iter().next().unwrap_or_else(|| field.key().to_uppercase()),
        }
    }
}
