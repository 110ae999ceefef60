// End-to-end tests for the `concilia` binary: exit codes, output files and
// the --json stdout contract.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn concilia() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_concilia"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("CONCILIA_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn run_statement(out_dir: &Path, extra: &[&str]) -> Output {
    let (config, bank) = (fixture("statement.recon.toml"), fixture("bank.csv"));
    let (payables, receivables) = (fixture("payables.csv"), fixture("receivables.csv"));
    let complements = fixture("complements.csv");
    concilia()
        .args(["run", "--config", arg(&config), "--bank", arg(&bank)])
        .args(["--payables", arg(&payables), "--receivables", arg(&receivables)])
        .args(["--complements", arg(&complements), "--out-dir", arg(out_dir)])
        .args(extra)
        .output()
        .expect("concilia run")
}

// ===========================================================================
// concilia validate
// ===========================================================================

#[test]
fn validate_accepts_fixture_config() {
    let output = concilia()
        .args(["validate", arg(&fixture("statement.recon.toml"))])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("config ok: Enero 2024"));
    assert!(output.stdout.is_empty(), "validate prints nothing to stdout");
}

#[test]
fn validate_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.recon.toml");
    std::fs::write(&path, "name = \"x\"\n[tolerance]\namount = -1\n").unwrap();

    let output = concilia().args(["validate", arg(&path)]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("tolerance"));

    std::fs::write(&path, "mode = \"monthly\"\n").unwrap();
    let output = concilia().args(["validate", arg(&path)]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn validate_missing_file_is_io_error() {
    let output = concilia()
        .args(["validate", "does/not/exist.recon.toml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
}

// ===========================================================================
// concilia run
// ===========================================================================

#[test]
fn run_writes_annotated_tables() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_statement(dir.path(), &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    for name in ["bank", "payables", "receivables"] {
        let path = dir.path().join(format!("{name}_conciliado.csv"));
        assert!(path.exists(), "missing {}", path.display());
    }
    assert!(!dir.path().join("complements_conciliado.csv").exists());

    let bank = std::fs::read_to_string(dir.path().join("bank_conciliado.csv")).unwrap();
    let header = bank.lines().next().unwrap();
    assert!(header.ends_with(
        "FOLIO FACTURA,FECHA FACTURA,FOLIO COMPLEMENTO DE PAGO,FECHA COMPLEMENTO DE PAGO"
    ));
    assert!(bank.contains("CP-1-CP-2"));

    let rec = std::fs::read_to_string(dir.path().join("receivables_conciliado.csv")).unwrap();
    assert!(rec.lines().next().unwrap().contains("ESTADO_INGRESO"));

    let err = stderr(&output);
    assert!(err.contains("Ingresos totales"), "stderr: {err}");
    assert!(output.stdout.is_empty(), "human summary goes to stderr only");
}

#[test]
fn run_json_is_single_value() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_statement(dir.path(), &["--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be valid JSON: {e}\n{stdout}"));

    assert_eq!(val["meta"]["mode"], "statement");
    assert_eq!(val["summary"]["receivables"]["total"], 4);
    assert_eq!(val["summary"]["bank"]["with_complement"], 1);
    assert!(val.get("bank").is_none(), "tables are written as CSV, not JSON");
}

#[test]
fn run_strict_reports_unpaid() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_statement(dir.path(), &["--strict"]);
    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("3 ledger rows remain unpaid"));
    // tables are still written
    assert!(dir.path().join("bank_conciliado.csv").exists());
}

#[test]
fn run_strict_passes_when_all_paid() {
    let dir = tempfile::tempdir().unwrap();
    let (bank, payables) = (fixture("bank.csv"), fixture("payables.csv"));
    let output = concilia()
        .args(["run", "--mode", "payables", "--bank", arg(&bank)])
        .args(["--payables", arg(&payables), "--out-dir", arg(dir.path()), "--strict"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("bank_conciliado.csv").exists());
    assert!(dir.path().join("payables_conciliado.csv").exists());
}

#[test]
fn run_missing_column_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let bank = dir.path().join("banco.csv");
    std::fs::write(&bank, "Fecha,Abono\n01/01/2024,10\n").unwrap();
    let payables = fixture("payables.csv");

    let output = concilia()
        .args(["run", "--mode", "payables", "--bank", arg(&bank)])
        .args(["--payables", arg(&payables), "--out-dir", arg(dir.path())])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("hint:"), "stderr: {err}");
    assert!(err.contains("[columns.bank]"), "stderr: {err}");
}

#[test]
fn run_unknown_mode_is_usage_error() {
    let output = concilia()
        .args(["run", "--mode", "monthly", "--bank", "banco.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn run_without_ledgers_is_usage_error() {
    let output = concilia()
        .args(["run", "--bank", arg(&fixture("bank.csv"))])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--payables"), "stderr: {}", stderr(&output));
}

#[test]
fn run_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = concilia()
        .args(["run", "--bank", "no-such-bank.csv", "--payables", "no-such.csv"])
        .args(["--out-dir", arg(dir.path())])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn tolerance_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let bank = dir.path().join("banco.csv");
    std::fs::write(&bank, "Fecha,Cargo\n02/03/2024,100.40\n").unwrap();
    let payables = dir.path().join("egresos.csv");
    std::fs::write(&payables, "FOLIO,TOTAL\nP1,100.00\n").unwrap();

    let run = |tolerance: &str| {
        concilia()
            .args(["run", "--mode", "payables", "--bank", arg(&bank)])
            .args(["--payables", arg(&payables), "--out-dir", arg(dir.path())])
            .args(["--tolerance", tolerance, "--strict"])
            .output()
            .unwrap()
    };
    assert_eq!(run("0.01").status.code(), Some(6));
    assert!(run("0.50").status.success());

    let out = std::fs::read_to_string(dir.path().join("egresos_conciliado.csv")).unwrap();
    assert!(out.contains("02/03/2024"), "{out}");
}
