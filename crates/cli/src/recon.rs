//! `concilia run` and `concilia validate`.

use std::fs::File;
use std::path::{Path, PathBuf};

use concilia_recon::summary::LedgerSummary;
use concilia_recon::{ReconConfig, ReconInput, ReconResult, Table};

use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_UNPAID};
use crate::{CliError, RunArgs};

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

fn load_table(name: &str, path: &Path) -> Result<Table, CliError> {
    let file = File::open(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    let table = Table::from_csv_reader(name, file)?;
    log::debug!("{name}: {} rows from {}", table.len(), path.display());
    Ok(table)
}

fn load_optional(name: &str, path: Option<&PathBuf>) -> Result<Option<Table>, CliError> {
    path.map(|p| load_table(name, p)).transpose()
}

/// `<out_dir>/<stem>_conciliado.csv`
fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tabla".into());
    out_dir.join(format!("{stem}_conciliado.csv"))
}

fn write_table(table: &Table, path: &Path) -> Result<(), CliError> {
    let file = File::create(path)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    table.write_csv(file)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    if args.payables.is_none() && args.receivables.is_none() {
        return Err(CliError::args("nothing to reconcile")
            .with_hint("pass --payables, --receivables, or both"));
    }

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ReconConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance.amount = tolerance;
    }
    config.validate()?;

    let input = ReconInput {
        bank: load_table("bank", &args.bank)?,
        payables: load_optional("payables", args.payables.as_ref())?,
        receivables: load_optional("receivables", args.receivables.as_ref())?,
        complements: load_optional("complements", args.complements.as_ref())?,
    };

    let result = concilia_recon::run(&config, &input)?;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        CliError::io(format!("cannot create {}: {e}", args.out_dir.display()))
    })?;
    write_table(&result.bank, &output_path(&args.out_dir, &args.bank))?;
    if let (Some(table), Some(path)) = (&result.payables, &args.payables) {
        write_table(table, &output_path(&args.out_dir, path))?;
    }
    if let (Some(table), Some(path)) = (&result.receivables, &args.receivables) {
        write_table(table, &output_path(&args.out_dir, path))?;
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&result);

    let unpaid = result.summary.unpaid();
    if args.strict && unpaid > 0 {
        return Err(CliError::new(EXIT_UNPAID, format!("{unpaid} ledger rows remain unpaid (--strict)")));
    }

    Ok(())
}

fn print_ledger(title: &str, summary: &LedgerSummary) {
    eprintln!("{title}:");
    for (label, count) in summary.labeled() {
        eprintln!("  {label:<24} {count}");
    }
    for (reason, count) in &summary.by_reason {
        eprintln!("    {reason}: {count}");
    }
}

/// Human summary to stderr
fn print_summary(result: &ReconResult) {
    eprintln!(
        "{} recon ({}), tolerance {}",
        result.meta.mode, result.meta.config_name, result.meta.tolerance
    );
    let s = &result.summary;
    if let Some(ref payables) = s.payables {
        print_ledger("egresos", payables);
    }
    if let Some(ref receivables) = s.receivables {
        print_ledger("ingresos", receivables);
    }
    if let Some(ref bank) = s.bank {
        eprintln!(
            "banco: {} movements, {} with folio, {} with complement, {} unreferenced",
            bank.total, bank.with_folio, bank.with_complement, bank.unreferenced,
        );
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path).map_err(|e| {
        if e.code == EXIT_INVALID_CONFIG {
            e.with_hint(format!("check {}", config_path.display()))
        } else {
            e
        }
    })?;

    eprintln!("config ok: {}", config.name);
    eprintln!("  mode:      {}", config.mode);
    eprintln!("  tolerance: {}", config.tolerance.amount);
    eprintln!("  pue:       {:?}", config.policy.pue);
    eprintln!("  rules:     {}", config.rules.len());
    for (table, fields) in &config.columns {
        for (field, aliases) in fields {
            eprintln!("  alias:     {table}.{field} = {}", aliases.join(", "));
        }
    }
    Ok(())
}
