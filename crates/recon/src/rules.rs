//! Business-rule table: (context, settlement method, payment form) → action.
//!
//! Evaluated once per ledger entry before any candidate scoring. Rules are
//! ordered; the first rule whose selectors all match decides. Config rules
//! are placed ahead of the built-in defaults.

use serde::Deserialize;

use crate::config::{PolicyConfig, PuePolicy};
use crate::model::{PaymentForm, SettlementMethod};

/// Which matcher is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleContext {
    Payables,
    Receivables,
    Statement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodSelector {
    Pue,
    Ppd,
    Unspecified,
}

impl MethodSelector {
    fn matches(&self, method: SettlementMethod) -> bool {
        matches!(
            (self, method),
            (Self::Pue, SettlementMethod::Pue)
                | (Self::Ppd, SettlementMethod::Ppd)
                | (Self::Unspecified, SettlementMethod::Unspecified)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormSelector {
    /// Cash, credit card, debt forgiveness or novation.
    Restricted,
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

impl FormSelector {
    fn matches(&self, form: PaymentForm) -> bool {
        match self {
            Self::Restricted => form.is_restricted(),
            Self::Cash => form == PaymentForm::Cash,
            Self::Check => form == PaymentForm::Check,
            Self::Transfer => form == PaymentForm::Transfer,
            Self::CreditCard => form == PaymentForm::CreditCard,
            Self::DebitCard => form == PaymentForm::DebitCard,
            Self::DebtForgiveness => form == PaymentForm::DebtForgiveness,
            Self::Novation => form == PaymentForm::Novation,
            Self::ToBeDefined => form == PaymentForm::ToBeDefined,
            Self::Other => form == PaymentForm::Other,
            Self::Unspecified => form == PaymentForm::Unspecified,
        }
    }
}

/// What the matcher does with an entry.
///
/// In the statement pass the actions collapse to two outcomes: settle
/// (`require_bank_match`, `settle_on_issue_date`) or link the folio while
/// leaving the entry unpaid (everything else).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Score bank candidates; paid only when one wins.
    RequireBankMatch,
    /// Paid, but not through the bank. No search is performed.
    PaidOutsideBank,
    /// Paid on the issue date; a bank match only refines the payment date.
    SettleOnIssueDate,
    /// Never paid on this path, even when a candidate exists.
    WithholdUnpaid,
    /// Attach the folio to the bank row but leave the entry unpaid.
    LinkUnpaid,
}

impl RuleAction {
    /// True when a statement-pass match settles the entry.
    pub fn settles_on_statement(&self) -> bool {
        matches!(self, Self::RequireBankMatch | Self::SettleOnIssueDate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub context: Option<RuleContext>,
    #[serde(default)]
    pub method: Option<MethodSelector>,
    #[serde(default)]
    pub form: Option<FormSelector>,
    pub action: RuleAction,
}

impl Rule {
    fn new(
        context: Option<RuleContext>,
        method: Option<MethodSelector>,
        form: Option<FormSelector>,
        action: RuleAction,
    ) -> Self {
        Self { context, method, form, action }
    }

    fn matches(&self, context: RuleContext, method: SettlementMethod, form: PaymentForm) -> bool {
        self.context.map_or(true, |c| c == context)
            && self.method.map_or(true, |m| m.matches(method))
            && self.form.map_or(true, |f| f.matches(form))
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Custom rules first, then the built-in table shaped by `policy`.
    pub fn new(custom: &[Rule], policy: &PolicyConfig) -> Self {
        use RuleAction::*;
        use RuleContext::*;

        let mut rules = custom.to_vec();
        rules.push(Rule::new(Some(Payables), None, Some(FormSelector::Cash), PaidOutsideBank));
        rules.push(Rule::new(Some(Receivables), Some(MethodSelector::Ppd), None, WithholdUnpaid));
        if policy.pue == PuePolicy::IssueDate {
            rules.push(Rule::new(
                Some(Receivables),
                Some(MethodSelector::Pue),
                None,
                SettleOnIssueDate,
            ));
        }
        rules.push(Rule::new(Some(Statement), Some(MethodSelector::Ppd), None, LinkUnpaid));
        rules.push(Rule::new(
            Some(Statement),
            Some(MethodSelector::Pue),
            Some(FormSelector::Restricted),
            LinkUnpaid,
        ));
        rules.push(Rule::new(Some(Statement), None, Some(FormSelector::Cash), LinkUnpaid));
        Self { rules }
    }

    /// First matching rule, clamped by [`guarded`].
    pub fn decide(&self, context: RuleContext, method: SettlementMethod, form: PaymentForm) -> RuleAction {
        let action = self
            .rules
            .iter()
            .find(|r| r.matches(context, method, form))
            .map(|r| r.action)
            .unwrap_or(RuleAction::RequireBankMatch);
        guarded(context, method, form, action)
    }
}

/// Invariants no rule can override: PPD receivables settle only through
/// payment complements, and a cash entry never takes a bank date.
fn guarded(context: RuleContext, method: SettlementMethod, form: PaymentForm, action: RuleAction) -> RuleAction {
    use RuleAction::*;

    let bank_dated = matches!(action, RequireBankMatch | SettleOnIssueDate);
    match context {
        RuleContext::Receivables if method == SettlementMethod::Ppd => match action {
            WithholdUnpaid | LinkUnpaid => action,
            _ => WithholdUnpaid,
        },
        RuleContext::Statement if method == SettlementMethod::Ppd || form.is_cash() => {
            if action.settles_on_statement() {
                LinkUnpaid
            } else {
                action
            }
        }
        RuleContext::Payables | RuleContext::Receivables if form.is_cash() && bank_dated => PaidOutsideBank,
        _ => action,
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(&[], &PolicyConfig::default())
    }
}
