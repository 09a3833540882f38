use crate::commands::Out;
use crate::{ledger, reference, Config, Mode, Result};
use serde::Serialize;
use tracing::warn;

/// The lists the dialogue will offer, as structured command output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReferenceSummary {
    accounts: Vec<String>,
    expense_categories: Vec<String>,
    income_categories: Vec<String>,
}

/// Fetches the reference lists the same way the dialogue does: a failed fetch falls back to
/// the fixed lists instead of failing the command.
pub async fn refs(config: Config, mode: Mode) -> Result<Out<ReferenceSummary>> {
    let mut ledger = ledger::ledger(&config, mode).await?;

    let lists = match ledger.fetch_reference_lists().await {
        Ok(lists) => lists,
        Err(e) => {
            warn!("{e}, showing the fallback lists");
            crate::ReferenceLists {
                accounts: reference::to_owned(reference::FALLBACK_ACCOUNTS),
                categories: reference::to_owned(reference::FALLBACK_EXPENSE_CATEGORIES),
            }
        }
    };
    let income_categories = match ledger.fetch_income_categories().await {
        Ok(categories) if !categories.is_empty() => categories,
        Ok(_) | Err(_) => reference::to_owned(reference::FALLBACK_INCOME_CATEGORIES),
    };

    let message = format!(
        "Accounts: {}\nExpense categories: {}\nIncome categories: {}",
        lists.accounts.join(", "),
        lists.categories.join(", "),
        income_categories.join(", "),
    );
    let summary = ReferenceSummary {
        accounts: lists.accounts,
        expense_categories: lists.categories,
        income_categories,
    };
    Ok(Out::new(message, summary))
}
