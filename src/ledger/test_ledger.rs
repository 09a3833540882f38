//! Implements the `Ledger` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the
//! whole app, top-to-bottom, without using Google Sheets (`LEDGER_BOT_IN_TEST_MODE`).

use crate::ledger::{Ledger, LedgerError, ReferenceLists};
use crate::model::NewTransaction;
use crate::Result;
use anyhow::anyhow;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// An implementation of the `Ledger` trait that does not use Google sheets. It serves the
/// seeded reference data from this module and records every appended transaction.
pub(crate) struct TestLedger {
    references: Vec<Vec<String>>,
    budget: Vec<Vec<String>>,
    appended: Arc<Mutex<Vec<NewTransaction>>>,
    fail_fetch: bool,
    fail_append: bool,
}

impl Default for TestLedger {
    /// Loads seed data from this module.
    fn default() -> Self {
        Self {
            references: load_csv(REFERENCES_DATA).unwrap(),
            budget: load_csv(BUDGET_DATA).unwrap(),
            appended: Arc::default(),
            fail_fetch: false,
            fail_append: false,
        }
    }
}

impl TestLedger {
    /// Every fetch call will fail, as if the sheet were unreachable.
    #[cfg(test)]
    pub(crate) fn with_failing_fetches(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Every append call will fail.
    #[cfg(test)]
    pub(crate) fn with_failing_appends(mut self) -> Self {
        self.fail_append = true;
        self
    }

    /// A shared handle to the rows recorded by `append_transaction`. Clone it before handing
    /// the ledger to the engine.
    #[cfg(test)]
    pub(crate) fn append_log(&self) -> Arc<Mutex<Vec<NewTransaction>>> {
        Arc::clone(&self.appended)
    }
}

#[async_trait::async_trait]
impl Ledger for TestLedger {
    async fn fetch_reference_lists(&mut self) -> std::result::Result<ReferenceLists, LedgerError> {
        if self.fail_fetch {
            return Err(LedgerError::Fetch {
                what: "reference lists",
                source: anyhow!("the test ledger is configured to fail fetches"),
            });
        }
        let mut lists = ReferenceLists::default();
        for row in self.references.iter().skip(3) {
            if let Some(account) = row.get(1).map(|s| s.trim()).filter(|s| !s.is_empty()) {
                lists.accounts.push(account.to_string());
            }
            if let Some(category) = row.get(2).map(|s| s.trim()).filter(|s| !s.is_empty()) {
                lists.categories.push(category.to_string());
            }
        }
        Ok(lists)
    }

    async fn fetch_income_categories(
        &mut self,
    ) -> std::result::Result<Vec<String>, LedgerError> {
        if self.fail_fetch {
            return Err(LedgerError::Fetch {
                what: "income categories",
                source: anyhow!("the test ledger is configured to fail fetches"),
            });
        }
        Ok(self
            .budget
            .iter()
            .skip(1)
            .filter(|row| row.first().map(|kind| kind.trim() == "Income").unwrap_or(false))
            .filter_map(|row| row.get(1).map(|s| s.trim()).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .collect())
    }

    async fn append_transaction(
        &mut self,
        tx: &NewTransaction,
    ) -> std::result::Result<(), LedgerError> {
        if self.fail_append {
            return Err(LedgerError::Append {
                source: anyhow!("the test ledger is configured to fail appends"),
            });
        }
        self.appended
            .lock()
            .map_err(|_| LedgerError::Append {
                source: anyhow!("the append log mutex is poisoned"),
            })?
            .push(tx.clone());
        Ok(())
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let bytes = csv_data.as_bytes();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(Cursor::new(bytes));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Seed References tab data: a title row, a blank row, a header row, then the lists.
const REFERENCES_DATA: &str = r##"REFERENCE LISTS,,
,,
Type,Account,Category
Income,Cash,Products
Expense,Card,Cafe
Transfer,Savings,Transport
,,Taxi
,,Leisure
,,Shopping
,,Health
,,Pharmacy
,,Utilities
,,Communication
,,Clothes
"##;

/// Seed budget (Categories) tab data.
const BUDGET_DATA: &str = r##"Type,Category,Budget,Spent,Remaining,Progress
Income,Wages/Tips,0,420.00,,
Income,Side Job,0,50.00,,
Income,Other,0,0,,
Expense,Products,300,181.20,118.80,0.60
Expense,Cafe,80,44.00,36.00,0.55
Expense,Transport,60,23.50,36.50,0.39
Expense,Taxi,40,12.00,28.00,0.30
Expense,Utilities,120,0,120.00,0
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TxKind};
    use std::str::FromStr;

    #[tokio::test]
    async fn test_seeded_reference_lists() {
        let mut ledger = TestLedger::default();
        let lists = ledger.fetch_reference_lists().await.unwrap();
        assert_eq!(lists.accounts, vec!["Cash", "Card", "Savings"]);
        assert_eq!(lists.categories.first().map(String::as_str), Some("Products"));
        assert_eq!(lists.categories.len(), 11);
    }

    #[tokio::test]
    async fn test_seeded_income_categories() {
        let mut ledger = TestLedger::default();
        let categories = ledger.fetch_income_categories().await.unwrap();
        assert_eq!(categories, vec!["Wages/Tips", "Side Job", "Other"]);
    }

    #[tokio::test]
    async fn test_failing_fetches() {
        let mut ledger = TestLedger::default().with_failing_fetches();
        assert!(ledger.fetch_reference_lists().await.is_err());
        assert!(ledger.fetch_income_categories().await.is_err());
    }

    #[tokio::test]
    async fn test_append_is_recorded() {
        let mut ledger = TestLedger::default();
        let log = ledger.append_log();
        let tx = NewTransaction::new(
            7,
            TxKind::Expense,
            "Cash".to_string(),
            Some("Cafe".to_string()),
            Amount::from_str("6.50").unwrap(),
            None,
            None,
            None,
        )
        .unwrap();
        ledger.append_transaction(&tx).await.unwrap();
        let recorded = log.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], tx);
    }

    #[tokio::test]
    async fn test_failing_append() {
        let mut ledger = TestLedger::default().with_failing_appends();
        let log = ledger.append_log();
        let tx = NewTransaction::new(
            7,
            TxKind::Expense,
            "Cash".to_string(),
            Some("Cafe".to_string()),
            Amount::from_str("6.50").unwrap(),
            None,
            None,
            None,
        )
        .unwrap();
        assert!(ledger.append_transaction(&tx).await.is_err());
        assert!(log.lock().unwrap().is_empty());
    }
}
