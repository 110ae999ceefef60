use log::{debug, info};
use rust_decimal::Decimal;

use crate::annotate::{write_bank, write_ledger};
use crate::complements::{group_complements, settle_complements};
use crate::config::{Mode, ReconConfig};
use crate::error::ReconError;
use crate::fields::{ColumnAliases, TableKind};
use crate::followup::{propagate_pass_through, settle_by_amount};
use crate::ledger::{reconcile_payables, reconcile_receivables, LedgerPass};
use crate::model::{LedgerEntry, Observation, ReconInput, ReconMeta, ReconResult};
use crate::ordering::cancelled_last;
use crate::rules::RuleTable;
use crate::schema::{load_bank, load_complements, load_ledger, BankNeeds};
use crate::statement::{Pool, StatementBook, UnifiedPass};
use crate::summary::{summarize_bank, summarize_ledger, LedgerSummary, ReconSummary};
use crate::table::Table;

/// Run reconciliation per config. Inputs are cloned; the caller's tables
/// are never touched.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;
    let ctx = Context {
        aliases: config.aliases()?,
        rules: config.rule_table(),
        config,
    };

    info!(
        "recon '{}': mode {}, tolerance {}",
        config.name, config.mode, config.tolerance.amount
    );

    let mut out = match config.mode {
        Mode::Payables => ctx.run_payables(input)?,
        Mode::Receivables => ctx.run_receivables(input)?,
        Mode::Statement => ctx.run_statement(input)?,
    };

    cancelled_last(&mut out.bank, TableKind::Bank, &ctx.aliases);
    if let Some(t) = out.payables.as_mut() {
        cancelled_last(t, TableKind::Payables, &ctx.aliases);
    }
    if let Some(t) = out.receivables.as_mut() {
        cancelled_last(t, TableKind::Receivables, &ctx.aliases);
    }

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            mode: config.mode.to_string(),
            tolerance: config.tolerance.amount,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        summary: out.summary,
        bank: out.bank,
        payables: out.payables,
        receivables: out.receivables,
    })
}

struct Context<'a> {
    config: &'a ReconConfig,
    aliases: ColumnAliases,
    rules: RuleTable,
}

struct Outcome {
    bank: Table,
    payables: Option<Table>,
    receivables: Option<Table>,
    summary: ReconSummary,
}

fn prepared(table: &Table) -> Table {
    let mut t = table.clone();
    t.normalize_headers();
    t
}

fn required<'t>(table: Option<&'t Table>, mode: Mode, kind: TableKind) -> Result<&'t Table, ReconError> {
    table.ok_or_else(|| ReconError::MissingTable {
        mode: mode.to_string(),
        table: kind.to_string(),
    })
}

/// Entries no stage touched get an explicit reason.
fn close_unmatched(entries: &mut [LedgerEntry]) {
    for e in entries.iter_mut().filter(|e| e.observation.is_none()) {
        let reason = if e.amount.is_none() {
            Observation::NoAmount
        } else {
            Observation::NoCandidate
        };
        e.mark_unpaid(reason);
    }
}

fn ledger_outcome(kind: TableKind, table: &mut Table, entries: &[LedgerEntry]) -> LedgerSummary {
    write_ledger(table, kind, entries);
    let summary = summarize_ledger(kind, entries);
    info!(
        "{kind}: {} rows, {} paid, {} paid other, {} unpaid",
        summary.total, summary.paid, summary.paid_other, summary.unpaid
    );
    summary
}

impl Context<'_> {
    fn tolerance(&self) -> Decimal {
        self.config.tolerance.amount
    }

    fn ignore_complements(&self, input: &ReconInput) {
        if input.complements.is_some() {
            debug!("complements table ignored in {} mode", self.config.mode);
        }
    }

    // -----------------------------------------------------------------------
    // Payables
    // -----------------------------------------------------------------------

    fn run_payables(&self, input: &ReconInput) -> Result<Outcome, ReconError> {
        let mut table = prepared(required(input.payables.as_ref(), Mode::Payables, TableKind::Payables)?);
        let bank = prepared(&input.bank);
        self.ignore_complements(input);

        let needs = BankNeeds { debit: true, credit: false };
        let (movements, _) = load_bank(&bank, &self.aliases, needs)?;
        let mut entries = load_ledger(&table, TableKind::Payables, &self.aliases, false)?;

        let mut available = vec![true; movements.len()];
        let mut pass = LedgerPass {
            bank: &movements,
            available: &mut available,
            tolerance: self.tolerance(),
            rules: &self.rules,
        };
        reconcile_payables(&mut entries, &mut pass);

        let summary = ledger_outcome(TableKind::Payables, &mut table, &entries);
        Ok(Outcome {
            bank,
            payables: Some(table),
            receivables: None,
            summary: ReconSummary {
                payables: Some(summary),
                ..ReconSummary::default()
            },
        })
    }

    // -----------------------------------------------------------------------
    // Receivables
    // -----------------------------------------------------------------------

    fn run_receivables(&self, input: &ReconInput) -> Result<Outcome, ReconError> {
        let mut table = prepared(required(
            input.receivables.as_ref(),
            Mode::Receivables,
            TableKind::Receivables,
        )?);
        let bank = prepared(&input.bank);
        self.ignore_complements(input);

        let needs = BankNeeds { debit: false, credit: true };
        let (movements, _) = load_bank(&bank, &self.aliases, needs)?;
        let mut entries = load_ledger(&table, TableKind::Receivables, &self.aliases, true)?;

        let mut available = vec![true; movements.len()];
        let mut pass = LedgerPass {
            bank: &movements,
            available: &mut available,
            tolerance: self.tolerance(),
            rules: &self.rules,
        };
        reconcile_receivables(&mut entries, &mut pass);

        let summary = ledger_outcome(TableKind::Receivables, &mut table, &entries);
        Ok(Outcome {
            bank,
            payables: None,
            receivables: Some(table),
            summary: ReconSummary {
                receivables: Some(summary),
                ..ReconSummary::default()
            },
        })
    }

    // -----------------------------------------------------------------------
    // Statement
    // -----------------------------------------------------------------------

    fn run_statement(&self, input: &ReconInput) -> Result<Outcome, ReconError> {
        if input.payables.is_none() && input.receivables.is_none() {
            return Err(ReconError::MissingTable {
                mode: Mode::Statement.to_string(),
                table: "payables or receivables".into(),
            });
        }

        let mut bank = prepared(&input.bank);
        let mut pay_table = input.payables.as_ref().map(prepared);
        let mut rec_table = input.receivables.as_ref().map(prepared);

        let needs = BankNeeds {
            debit: pay_table.is_some(),
            credit: rec_table.is_some(),
        };
        let (movements, binding) = load_bank(&bank, &self.aliases, needs)?;
        let mut pay_entries = pay_table
            .as_ref()
            .map(|t| load_ledger(t, TableKind::Payables, &self.aliases, false))
            .transpose()?;
        let mut rec_entries = rec_table
            .as_ref()
            .map(|t| load_ledger(t, TableKind::Receivables, &self.aliases, false))
            .transpose()?;
        let complements = input
            .complements
            .as_ref()
            .map(|t| load_complements(&prepared(t), &self.aliases))
            .transpose()?;

        let mut book = StatementBook::new(movements);
        let tolerance = self.tolerance();

        // 1. Unified pass
        {
            let mut pay_pool = pay_entries.as_deref_mut().map(Pool::new);
            let mut rec_pool = rec_entries.as_deref_mut().map(Pool::new);
            let unified = UnifiedPass {
                tolerance,
                rules: &self.rules,
                ppd_fallback: self.config.policy.ppd_fallback,
            };
            let attributed = unified.run(&mut book, pay_pool.as_mut(), rec_pool.as_mut());
            info!("statement: {attributed} of {} movements attributed", book.movements.len());
        }

        // 2. Payment complements
        if let Some(rows) = complements {
            let groups = group_complements(&rows);
            let settled = settle_complements(&groups, &mut book, rec_entries.as_deref_mut(), tolerance);
            info!("complements: {settled} of {} folio groups settled", groups.len());
        }

        // 3. Secondary pass
        if let Some(entries) = rec_entries.as_deref_mut() {
            let settled = settle_by_amount(&mut book, entries, &self.rules, tolerance);
            info!("secondary pass: {settled} receivables settled by amount");
        }
        let copied = propagate_pass_through(&mut book, tolerance);
        debug!("pass-through: {copied} movements referenced");

        let mut summary = ReconSummary::default();
        if let (Some(table), Some(entries)) = (pay_table.as_mut(), pay_entries.as_deref_mut()) {
            close_unmatched(entries);
            summary.payables = Some(ledger_outcome(TableKind::Payables, table, entries));
        }
        if let (Some(table), Some(entries)) = (rec_table.as_mut(), rec_entries.as_deref_mut()) {
            close_unmatched(entries);
            summary.receivables = Some(ledger_outcome(TableKind::Receivables, table, entries));
        }

        write_bank(&mut bank, &binding, &book.movements);
        summary.bank = Some(summarize_bank(&book.movements));

        Ok(Outcome {
            bank,
            payables: pay_table,
            receivables: rec_table,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn input(bank: Table, payables: Option<Table>, receivables: Option<Table>) -> ReconInput {
        ReconInput {
            bank,
            payables,
            receivables,
            complements: None,
        }
    }

    fn config(mode: Mode) -> ReconConfig {
        ReconConfig {
            mode,
            ..ReconConfig::default()
        }
    }

    #[test]
    fn payables_mode_requires_payables() {
        let bank = Table::from_rows("bank", &["FECHA", "CARGO"], &[]);
        let err = run(&config(Mode::Payables), &input(bank, None, None)).unwrap_err();
        assert_eq!(err.to_string(), "mode 'payables' requires the 'payables' table");
    }

    #[test]
    fn statement_requires_a_ledger() {
        let bank = Table::from_rows("bank", &["FECHA", "CARGO"], &[]);
        assert!(matches!(
            run(&config(Mode::Statement), &input(bank, None, None)),
            Err(ReconError::MissingTable { .. })
        ));
    }

    #[test]
    fn payables_mode_end_to_end() {
        let bank = Table::from_rows("bank", &["Fecha", "Cargo"], &[&["12/01/2024", "500.00"]]);
        let payables = Table::from_rows(
            "payables",
            &["FOLIO", "FECHA EMISION", "TOTAL"],
            &[&["A1", "10/01/2024", "500.00"]],
        );
        let input = input(bank, Some(payables), None);
        let result = run(&config(Mode::Payables), &input).unwrap();

        let t = result.payables.unwrap();
        let status = t.column("ESTADO_EGRESO").unwrap();
        let date = t.column("FECHA_DE_PAGO").unwrap();
        assert_eq!(t.get(0, status).to_string(), Status::Paid.label());
        assert_eq!(t.get(0, date).to_string(), "12/01/2024");
        assert_eq!(result.summary.payables.unwrap().paid, 1);
        // caller's table untouched
        assert_eq!(input.payables.as_ref().unwrap().headers().len(), 3);
    }

    #[test]
    fn statement_closes_untouched_rows() {
        let bank = Table::from_rows("bank", &["FECHA", "CARGO"], &[&["12/01/2024", "10"]]);
        let payables = Table::from_rows("payables", &["FOLIO", "TOTAL"], &[&["A1", "99"], &["A2", "x"]]);
        let result = run(&config(Mode::Statement), &input(bank, Some(payables), None)).unwrap();
        let s = result.summary.payables.unwrap();
        assert_eq!(s.unpaid, 2);
        assert_eq!(s.by_reason["Sin monto"], 1);
        assert_eq!(s.by_reason["Sin movimiento en estado de cuenta"], 1);
        assert_eq!(result.summary.bank.unwrap().unreferenced, 1);
    }
}
