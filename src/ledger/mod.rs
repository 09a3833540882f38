//! The ledger collaborator: reference-list reads and the atomic transaction append.
//!
//! The dialogue engine only ever talks to the [`Ledger`] trait. `SheetLedger` implements it
//! against the Google sheet; `TestLedger` implements it in memory so the whole app can run,
//! top-to-bottom, without touching Google.

mod sheet;
mod test_ledger;

use crate::model::NewTransaction;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};

pub(crate) use sheet::SheetLedger;
pub(crate) use test_ledger::TestLedger;

/// When this environment variable is set and non-empty, [`Mode::from_env`] returns
/// `Mode::Test` and the app runs against the in-memory ledger.
pub const ENV_TEST_MODE: &str = "LEDGER_BOT_IN_TEST_MODE";

/// Errors crossing the ledger boundary. Fetch failures are recoverable (the caller substitutes
/// the fixed fallback lists); an append failure is terminal for the draft being committed.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to fetch {what} from the ledger sheet")]
    Fetch {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to append a transaction row to the ledger sheet")]
    Append {
        #[source]
        source: anyhow::Error,
    },
}

/// The reference lists read from the ledger: known account names and known expense category
/// names, in sheet order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReferenceLists {
    pub accounts: Vec<String>,
    pub categories: Vec<String>,
}

/// The operations the dialogue engine needs from the ledger store. There is no transactional
/// guarantee across calls; a reference fetch and a later append are independent requests.
#[async_trait::async_trait]
pub trait Ledger {
    /// Reads the account and expense-category reference lists.
    async fn fetch_reference_lists(&mut self) -> std::result::Result<ReferenceLists, LedgerError>;

    /// Reads the income category names from the budget tab.
    async fn fetch_income_categories(&mut self)
        -> std::result::Result<Vec<String>, LedgerError>;

    /// Appends one finished transaction as a single row. All-or-nothing: either the row lands
    /// or an error comes back.
    async fn append_transaction(
        &mut self,
        tx: &NewTransaction,
    ) -> std::result::Result<(), LedgerError>;
}

/// Selects the ledger backend. This allows for running the program without hitting the Google
/// APIs: when `LEDGER_BOT_IN_TEST_MODE` is set and non-zero in length the mode will be
/// `Mode::Test`, otherwise it will be `Mode::Google`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Google,
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    pub fn from_env() -> Mode {
        match std::env::var(ENV_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the ledger backend for `mode`.
pub(crate) async fn ledger(config: &Config, mode: Mode) -> Result<Box<dyn Ledger + Send>> {
    match mode {
        Mode::Google => Ok(Box::new(SheetLedger::new(config.clone()).await?)),
        Mode::Test => Ok(Box::new(TestLedger::default())),
    }
}

/// Serializes a transaction into the ledger's 10-column row shape. Columns H (full date) and
/// J (wage amount) hold sheet-side formulas and are written blank.
pub(crate) fn row_values(tx: &NewTransaction) -> Vec<String> {
    vec![
        tx.day.to_string(),
        tx.kind.to_string(),
        tx.account.clone(),
        tx.category.clone().unwrap_or_default(),
        tx.amount.to_string(),
        tx.to_account.clone().unwrap_or_default(),
        tx.comment.clone().unwrap_or_default(),
        String::new(),
        tx.hours.map(|hours| hours.to_string()).unwrap_or_default(),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TxKind};
    use std::str::FromStr;

    #[test]
    fn test_row_values_expense() {
        let tx = NewTransaction::new(
            15,
            TxKind::Expense,
            "Cash".to_string(),
            Some("Products".to_string()),
            Amount::from_str("42.50").unwrap(),
            None,
            Some("groceries".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(
            row_values(&tx),
            vec!["15", "Expense", "Cash", "Products", "42.50", "", "groceries", "", "", ""]
        );
    }

    #[test]
    fn test_row_values_transfer() {
        let tx = NewTransaction::new(
            3,
            TxKind::Transfer,
            "Cash".to_string(),
            None,
            Amount::from_str("100").unwrap(),
            Some("Card".to_string()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            row_values(&tx),
            vec!["3", "Transfer", "Cash", "", "100", "Card", "", "", "", ""]
        );
    }

    #[test]
    fn test_mode_from_env_default() {
        // The variable is not set in the test environment.
        assert_eq!(Mode::from_env(), Mode::Google);
    }
}
