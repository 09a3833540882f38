//! Implements the `Ledger` trait using the `sheets::Client` to interact with the Google sheet.

use crate::ledger::{row_values, Ledger, LedgerError, ReferenceLists};
use crate::model::NewTransaction;
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use sheets::types::{
    DateTimeRenderOption, Dimension, InsertDataOption, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use tracing::trace;

/// The References tab starts with a title row, a blank row and a header row.
const REFERENCES_HEADER_ROWS: usize = 3;
/// The budget (Categories) tab starts with a single header row.
const BUDGET_HEADER_ROWS: usize = 1;

/// Implements the `Ledger` trait against a Google sheet. Token material is loaded from
/// `$LEDGER_BOT_HOME/.secrets/token.json` and the access token is refreshed through the
/// sheets client before each call group.
pub(crate) struct SheetLedger {
    config: Config,
    client: sheets::Client,
    has_refresh_token: bool,
}

/// The contents of `token.json`: the OAuth client pair plus the token material obtained for
/// it. The refresh token may be absent, in which case the access token is used as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    client_id: String,
    client_secret: String,
    access_token: String,
    #[serde(default)]
    refresh_token: String,
}

impl SheetLedger {
    pub(crate) async fn new(config: Config) -> Result<Self> {
        let token_path = config.token_path();
        let token: TokenFile = utils::deserialize(&token_path)
            .await
            .with_context(|| format!("Failed to load token material from {}", token_path.display()))?;
        let has_refresh_token = !token.refresh_token.is_empty();
        let client = sheets::Client::new(
            token.client_id,
            token.client_secret,
            String::new(), // redirect_uri (not needed for API calls with an access token)
            token.access_token,
            token.refresh_token,
        );
        Ok(Self {
            config,
            client,
            has_refresh_token,
        })
    }

    /// Refreshes the access token if refresh material is available.
    async fn refresh(&mut self) -> Result<()> {
        if self.has_refresh_token {
            self.client
                .refresh_access_token()
                .await
                .map_err(map_client_error)
                .context("Failed to refresh the Google access token")?;
        }
        Ok(())
    }

    /// Fetches all rows of a tab as formatted values.
    async fn get(&mut self, tab_name: &str) -> Result<Vec<Vec<String>>> {
        trace!("get for {tab_name}");
        self.refresh().await?;
        let range = format!("{tab_name}!A:ZZ"); // Get all columns
        let response = self
            .client
            .spreadsheets()
            .values_get(
                self.config.spreadsheet_id(),
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {tab_name} sheet data"))?;
        Ok(response.body.values)
    }

    async fn fetch_reference_lists_inner(&mut self) -> Result<ReferenceLists> {
        let tab = self.config.references_tab().to_string();
        let rows = self.get(&tab).await?;
        let mut lists = ReferenceLists::default();
        for row in rows.iter().skip(REFERENCES_HEADER_ROWS) {
            if let Some(account) = non_empty(row.get(1)) {
                lists.accounts.push(account);
            }
            if let Some(category) = non_empty(row.get(2)) {
                lists.categories.push(category);
            }
        }
        Ok(lists)
    }

    async fn fetch_income_categories_inner(&mut self) -> Result<Vec<String>> {
        let tab = self.config.budget_tab().to_string();
        let rows = self.get(&tab).await?;
        let mut categories = Vec::new();
        for row in rows.iter().skip(BUDGET_HEADER_ROWS) {
            let is_income = row.first().map(|kind| kind.trim() == "Income").unwrap_or(false);
            if !is_income {
                continue;
            }
            if let Some(name) = non_empty(row.get(1)) {
                categories.push(name);
            }
        }
        Ok(categories)
    }

    async fn append_transaction_inner(&mut self, tx: &NewTransaction) -> Result<()> {
        self.refresh().await?;
        let range = format!("{}!A:J", self.config.transactions_tab());
        let body = ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: range.clone(),
            values: vec![row_values(tx)],
        };
        self.client
            .spreadsheets()
            .values_append(
                self.config.spreadsheet_id(),
                &range,
                false, // include_values_in_response
                InsertDataOption::InsertRows,
                DateTimeRenderOption::FormattedString,
                ValueRenderOption::FormattedValue,
                ValueInputOption::UserEntered,
                &body,
            )
            .await
            .map_err(map_client_error)
            .context("Failed to append the transaction row")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Ledger for SheetLedger {
    async fn fetch_reference_lists(&mut self) -> std::result::Result<ReferenceLists, LedgerError> {
        self.fetch_reference_lists_inner()
            .await
            .map_err(|source| LedgerError::Fetch {
                what: "reference lists",
                source,
            })
    }

    async fn fetch_income_categories(
        &mut self,
    ) -> std::result::Result<Vec<String>, LedgerError> {
        self.fetch_income_categories_inner()
            .await
            .map_err(|source| LedgerError::Fetch {
                what: "income categories",
                source,
            })
    }

    async fn append_transaction(
        &mut self,
        tx: &NewTransaction,
    ) -> std::result::Result<(), LedgerError> {
        self.append_transaction_inner(tx)
            .await
            .map_err(|source| LedgerError::Append { source })
    }
}

/// Returns the trimmed cell value, or `None` for a missing or blank cell.
fn non_empty(cell: Option<&String>) -> Option<String> {
    cell.map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn map_client_error(e: sheets::ClientError) -> anyhow::Error {
    anyhow::anyhow!("sheets client error: {e}")
}
