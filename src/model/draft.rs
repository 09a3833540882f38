use crate::model::{Amount, TxKind};
use crate::Result;
use anyhow::bail;
use rust_decimal::Decimal;

/// The in-progress transaction accumulated across one dialogue. Every field starts out unset
/// and the state machine fills them in one step at a time. A draft only ever turns into a
/// ledger row through [`TransactionDraft::finish`], which enforces the invariants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDraft {
    pub(crate) kind: Option<TxKind>,
    pub(crate) day: Option<u32>,
    pub(crate) account: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) amount: Option<Amount>,
    pub(crate) to_account: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) hours: Option<Decimal>,
}

impl TransactionDraft {
    /// Clears every field, returning the draft to its initial state.
    pub fn reset(&mut self) {
        *self = TransactionDraft::default();
    }

    pub fn kind(&self) -> Option<TxKind> {
        self.kind
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    /// Formats the draft for the confirmation step. Field order is fixed: kind, day, amount,
    /// account, then the optional category, destination account, comment and hours.
    pub fn preview(&self, currency: &str) -> String {
        let mut lines = Vec::new();
        if let Some(kind) = self.kind {
            lines.push(kind.to_string());
        }
        if let Some(day) = self.day {
            lines.push(format!("Date: day {day}"));
        }
        if let Some(amount) = self.amount {
            lines.push(format!("Amount: {}", crate::format::money(amount.value(), currency)));
        }
        if let Some(account) = &self.account {
            lines.push(format!("Account: {account}"));
        }
        if let Some(category) = &self.category {
            lines.push(format!("Category: {category}"));
        }
        if let Some(to_account) = &self.to_account {
            lines.push(format!("To account: {to_account}"));
        }
        if let Some(comment) = &self.comment {
            lines.push(format!("Comment: {comment}"));
        }
        if let Some(hours) = self.hours {
            lines.push(format!("Hours: {hours}"));
        }
        lines.join("\n")
    }

    /// Validates the draft and produces the finished row. Fails when a required field is
    /// missing or when the kind's field rules are violated.
    pub fn finish(&self) -> Result<NewTransaction> {
        let Some(kind) = self.kind else {
            bail!("The draft has no transaction kind");
        };
        let Some(amount) = self.amount else {
            bail!("The draft has no amount");
        };
        let Some(day) = self.day else {
            bail!("The draft has no day of month");
        };
        let Some(account) = self.account.clone() else {
            bail!("The draft has no account");
        };
        NewTransaction::new(
            day,
            kind,
            account,
            self.category.clone(),
            amount,
            self.to_account.clone(),
            self.comment.clone(),
            self.hours,
        )
    }
}

/// A finished, validated transaction ready to be appended to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub(crate) day: u32,
    pub(crate) kind: TxKind,
    pub(crate) account: String,
    pub(crate) category: Option<String>,
    pub(crate) amount: Amount,
    pub(crate) to_account: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) hours: Option<Decimal>,
}

impl NewTransaction {
    /// Validates and builds a transaction row. The rules are:
    /// - `day` must fall in 1-31
    /// - `amount` and `hours` (when present) must be positive
    /// - a `Transfer` carries a destination account and no category
    /// - an `Income` or `Expense` carries a category and no destination account
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        day: u32,
        kind: TxKind,
        account: String,
        category: Option<String>,
        amount: Amount,
        to_account: Option<String>,
        comment: Option<String>,
        hours: Option<Decimal>,
    ) -> Result<Self> {
        if !(1..=31).contains(&day) {
            bail!("Day {day} is outside 1-31");
        }
        if !amount.is_positive() {
            bail!("Amount must be positive, got {amount}");
        }
        if let Some(hours) = hours {
            if hours.is_zero() || hours.is_sign_negative() {
                bail!("Hours must be positive, got {hours}");
            }
        }
        match kind {
            TxKind::Transfer => {
                if to_account.is_none() {
                    bail!("A transfer needs a destination account");
                }
                if category.is_some() {
                    bail!("A transfer cannot carry a category");
                }
            }
            TxKind::Income | TxKind::Expense => {
                if category.is_none() {
                    bail!("A {kind} needs a category");
                }
                if to_account.is_some() {
                    bail!("A {kind} cannot carry a destination account");
                }
            }
        }
        Ok(Self {
            day,
            kind,
            account,
            category,
            amount,
            to_account,
            comment,
            hours,
        })
    }

    pub(crate) fn kind(&self) -> TxKind {
        self.kind
    }

    pub(crate) fn amount(&self) -> Amount {
        self.amount
    }
}
