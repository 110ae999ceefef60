use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::fields::ColumnAliases;
use crate::rules::{Rule, RuleTable};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// `[columns.<table>] <field> = ["ALIAS", ...]`
    #[serde(default)]
    pub columns: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_name() -> String {
    "conciliacion".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            mode: Mode::default(),
            tolerance: ToleranceConfig::default(),
            policy: PolicyConfig::default(),
            columns: BTreeMap::new(),
            rules: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which reconciliation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Payables against bank debits.
    Payables,
    /// Receivables against bank credits.
    Receivables,
    /// Unified statement cross-reference, complements, secondary pass.
    #[default]
    Statement,
}

impl Mode {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Payables => "payables",
            Self::Receivables => "receivables",
            Self::Statement => "statement",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [Self::Payables, Self::Receivables, Self::Statement]
            .into_iter()
            .find(|m| m.key() == key)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Tolerance + Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceConfig {
    /// Largest absolute amount difference treated as a match.
    #[serde(default = "default_amount_tolerance")]
    pub amount: Decimal,
}

fn default_amount_tolerance() -> Decimal {
    Decimal::ONE
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            amount: default_amount_tolerance(),
        }
    }
}

/// How PUE receivables settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuePolicy {
    /// Paid on the issue date; a bank match only supplies the real date.
    #[default]
    IssueDate,
    /// Paid only when a bank movement matches.
    BankMatch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub pue: PuePolicy,
    /// Statement pass: fall back to the earliest PPD candidate when no
    /// non-PPD candidate matches the movement.
    #[serde(default = "default_true")]
    pub ppd_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            pue: PuePolicy::default(),
            ppd_fallback: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.tolerance.amount.is_sign_negative() {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance.amount must be non-negative, got {}",
                self.tolerance.amount
            )));
        }

        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        // Alias sections must name known tables and fields
        self.aliases()?;

        Ok(())
    }

    pub fn aliases(&self) -> Result<ColumnAliases, ReconError> {
        ColumnAliases::from_sections(&self.columns)
    }

    pub fn rule_table(&self) -> RuleTable {
        RuleTable::new(&self.rules, &self.policy)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
