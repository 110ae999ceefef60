use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::summary::ReconSummary;
use crate::table::Table;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Tables handed over by the I/O layer. Headers must already be normalized.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub bank: Table,
    pub payables: Option<Table>,
    pub receivables: Option<Table>,
    pub complements: Option<Table>,
}

// ---------------------------------------------------------------------------
// Business codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Paid,
    Unpaid,
    PaidOther,
}

impl Status {
    /// Cell text written to the output tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Paid => "PAGADO",
            Self::Unpaid => "NO PAGADO",
            Self::PaidOther => "PAGADO OTRO MEDIO",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paid => write!(f, "PAID"),
            Self::Unpaid => write!(f, "UNPAID"),
            Self::PaidOther => write!(f, "PAID-OTHER"),
        }
    }
}

/// CFDI *método de pago*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementMethod {
    /// Pago en una sola exhibición.
    Pue,
    /// Pago en parcialidades o diferido.
    Ppd,
    Unspecified,
}

impl SettlementMethod {
    pub fn parse(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("PPD") {
            Self::Ppd
        } else if upper.contains("PUE") {
            Self::Pue
        } else {
            Self::Unspecified
        }
    }
}

/// CFDI *forma de pago* (SAT catalogue c_FormaPago), reduced to the codes
/// the rule table distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentForm {
    Cash,
    Check,
    Transfer,
    CreditCard,
    DebitCard,
    DebtForgiveness,
    Novation,
    ToBeDefined,
    Other,
    Unspecified,
}

impl PaymentForm {
    pub fn parse(text: &str) -> Self {
        let upper = text.trim().to_uppercase();
        if upper.is_empty() {
            return Self::Unspecified;
        }

        let code: String = upper.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !code.is_empty() {
            return match code.parse::<u32>().unwrap_or(0) {
                1 => Self::Cash,
                2 => Self::Check,
                3 => Self::Transfer,
                4 => Self::CreditCard,
                15 => Self::DebtForgiveness,
                23 => Self::Novation,
                28 => Self::DebitCard,
                99 => Self::ToBeDefined,
                _ => Self::Other,
            };
        }

        const KEYWORDS: [(&str, PaymentForm); 13] = [
            ("EFECTIVO", PaymentForm::Cash),
            ("CASH", PaymentForm::Cash),
            ("CHEQUE", PaymentForm::Check),
            ("TRANSFERENCIA", PaymentForm::Transfer),
            ("TARJETA DE CREDITO", PaymentForm::CreditCard),
            ("TARJETA DE CRÉDITO", PaymentForm::CreditCard),
            ("TARJETA DE DEBITO", PaymentForm::DebitCard),
            ("TARJETA DE DÉBITO", PaymentForm::DebitCard),
            ("CONDONACION", PaymentForm::DebtForgiveness),
            ("CONDONACIÓN", PaymentForm::DebtForgiveness),
            ("NOVACION", PaymentForm::Novation),
            ("NOVACIÓN", PaymentForm::Novation),
            ("POR DEFINIR", PaymentForm::ToBeDefined),
        ];
        KEYWORDS
            .iter()
            .find(|(k, _)| upper.contains(k))
            .map(|(_, f)| *f)
            .unwrap_or(Self::Other)
    }

    pub fn is_cash(&self) -> bool {
        matches!(self, Self::Cash)
    }

    /// Forms that never produce a bank movement settling the invoice itself.
    pub fn is_restricted(&self) -> bool {
        matches!(
            self,
            Self::Cash | Self::CreditCard | Self::DebtForgiveness | Self::Novation
        )
    }
}

/// Reason recorded in the ledger's observation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    NoAmount,
    CashPayment,
    OutsideBank,
    NoCandidate,
    NoDatedCandidate,
    Reconciled,
    FolioAndAmount,
    PueOnIssueDate,
    PueConfirmed,
    PpdPending,
    PpdWithheld,
    LinkedUnpaid,
    ComplementSettled,
    AmountOnly,
}

impl Observation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoAmount => "Sin monto",
            Self::CashPayment => "Forma de pago EFECTIVO",
            Self::OutsideBank => "Pagado fuera de estado de cuenta",
            Self::NoCandidate => "Sin movimiento en estado de cuenta",
            Self::NoDatedCandidate => "Movimientos sin fecha valida",
            Self::Reconciled => "Conciliado con estado de cuenta",
            Self::FolioAndAmount => "Conciliado por FOLIO + MONTO",
            Self::PueOnIssueDate => "Pago PUE - Una sola exhibicion",
            Self::PueConfirmed => "Pago PUE - Confirmado en estado de cuenta",
            Self::PpdPending => "PPD - Pendiente de complemento de pago",
            Self::PpdWithheld => "PPD - Movimiento encontrado, pendiente de complemento",
            Self::LinkedUnpaid => "Folio vinculado sin liquidar",
            Self::ComplementSettled => "Liquidado por complemento de pago",
            Self::AmountOnly => "Conciliado por monto",
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One payable or receivable row. `row` is its index in the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub row: usize,
    pub amount: Option<Decimal>,
    pub issue_date: Option<NaiveDate>,
    pub concept: String,
    pub payment_form: PaymentForm,
    pub method: SettlementMethod,
    pub folio: String,

    pub reconciled: bool,
    pub status: Status,
    pub payment_date: Option<NaiveDate>,
    pub observation: Option<Observation>,
}

impl LedgerEntry {
    pub fn new(row: usize, amount: Option<Decimal>) -> Self {
        Self {
            row,
            amount,
            issue_date: None,
            concept: String::new(),
            payment_form: PaymentForm::Unspecified,
            method: SettlementMethod::Unspecified,
            folio: String::new(),
            reconciled: false,
            status: Status::Unpaid,
            payment_date: None,
            observation: None,
        }
    }

    pub fn settle(&mut self, payment_date: Option<NaiveDate>, observation: Observation) {
        self.reconciled = true;
        self.status = Status::Paid;
        self.payment_date = payment_date;
        self.observation = Some(observation);
    }

    /// Paid on the issue date with no bank evidence.
    pub fn settle_on_issue_date(&mut self) {
        self.reconciled = false;
        self.status = Status::Paid;
        self.payment_date = self.issue_date;
        self.observation = Some(Observation::PueOnIssueDate);
    }

    pub fn mark_unpaid(&mut self, observation: Observation) {
        self.reconciled = false;
        self.status = Status::Unpaid;
        self.payment_date = None;
        self.observation = Some(observation);
    }

    /// Paid, but not through the bank.
    pub fn mark_paid_other(&mut self, observation: Observation) {
        self.reconciled = false;
        self.status = Status::PaidOther;
        self.payment_date = None;
        self.observation = Some(observation);
    }

    pub fn has_folio(&self) -> bool {
        !self.folio.is_empty()
    }
}

/// One bank statement row with its annotation slots.
#[derive(Debug, Clone, PartialEq)]
pub struct BankMovement {
    pub row: usize,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub description: String,

    pub invoice_folio: Option<String>,
    pub invoice_date: Option<String>,
    pub complement_folio: Option<String>,
    pub complement_date: Option<String>,
}

impl BankMovement {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            debit: None,
            credit: None,
            date: None,
            description: String::new(),
            invoice_folio: None,
            invoice_date: None,
            complement_folio: None,
            complement_date: None,
        }
    }

    /// The populated side: a positive debit, otherwise the credit.
    pub fn amount(&self) -> Option<Decimal> {
        match self.debit {
            Some(d) if !d.is_zero() => Some(d),
            _ => self.credit.filter(|c| !c.is_zero()),
        }
    }

    pub fn has_invoice_folio(&self) -> bool {
        self.invoice_folio.as_deref().is_some_and(|f| !f.trim().is_empty())
    }

    pub fn has_invoice_date(&self) -> bool {
        self.invoice_date.as_deref().is_some_and(|f| !f.trim().is_empty())
    }
}

/// One payment-complement (CFDI de pago) row.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentComplement {
    pub row: usize,
    pub document_folio: String,
    pub amount_paid: Option<Decimal>,
    pub complement_folio: String,
    pub document_date: Option<NaiveDate>,
    pub complement_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub mode: String,
    pub tolerance: Decimal,
    pub engine_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    #[serde(skip)]
    pub bank: Table,
    #[serde(skip)]
    pub payables: Option<Table>,
    #[serde(skip)]
    pub receivables: Option<Table>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_method_parsing() {
        assert_eq!(SettlementMethod::parse("PPD - Pago en parcialidades"), SettlementMethod::Ppd);
        assert_eq!(SettlementMethod::parse("pue"), SettlementMethod::Pue);
        assert_eq!(SettlementMethod::parse(""), SettlementMethod::Unspecified);
    }

    #[test]
    fn payment_form_codes_and_keywords() {
        assert_eq!(PaymentForm::parse("01 - Efectivo"), PaymentForm::Cash);
        assert_eq!(PaymentForm::parse("01"), PaymentForm::Cash);
        assert_eq!(PaymentForm::parse("03"), PaymentForm::Transfer);
        assert_eq!(PaymentForm::parse("04 Tarjeta de crédito"), PaymentForm::CreditCard);
        assert_eq!(PaymentForm::parse("EFECTIVO"), PaymentForm::Cash);
        assert_eq!(PaymentForm::parse("Condonación"), PaymentForm::DebtForgiveness);
        assert_eq!(PaymentForm::parse("101"), PaymentForm::Other);
        assert_eq!(PaymentForm::parse("  "), PaymentForm::Unspecified);
        assert!(PaymentForm::Novation.is_restricted());
        assert!(!PaymentForm::Transfer.is_restricted());
    }

    #[test]
    fn movement_amount_prefers_populated_side() {
        let mut m = BankMovement::new(0);
        m.debit = Some(Decimal::ZERO);
        m.credit = Some(Decimal::from(40));
        assert_eq!(m.amount(), Some(Decimal::from(40)));
        m.debit = Some(Decimal::from(15));
        assert_eq!(m.amount(), Some(Decimal::from(15)));
    }

    #[test]
    fn ledger_transitions() {
        let mut e = LedgerEntry::new(0, Some(Decimal::from(10)));
        let d = NaiveDate::from_ymd_opt(2024, 1, 12);
        e.settle(d, Observation::Reconciled);
        assert_eq!(e.status, Status::Paid);
        assert!(e.reconciled);
        e.mark_unpaid(Observation::LinkedUnpaid);
        assert_eq!(e.payment_date, None);
        e.mark_paid_other(Observation::CashPayment);
        assert_eq!(e.status, Status::PaidOther);
        assert_eq!(e.status.to_string(), "PAID-OTHER");
    }
}
