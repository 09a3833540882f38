//! User-facing message formatting for committed transactions.

use crate::model::NewTransaction;
use chrono::Local;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Formats a monetary value with thousands grouping, two decimal places and the currency
/// label, e.g. `1,250.00 BYN`.
pub(crate) fn money(value: Decimal, currency: &str) -> String {
    format!(
        "{} {currency}",
        format_num::format_num!(",.2", value.to_f64().unwrap_or_default())
    )
}

/// Builds the message shown after a transaction is written to the ledger. When hours are
/// present, a display-only `hours x rate` line is included; the ledger computes its own wage
/// column and this value is never written to the sheet.
pub(crate) fn transaction_saved(
    tx: &NewTransaction,
    currency: &str,
    hourly_rate: Decimal,
) -> String {
    let mut lines = vec![
        "Saved!".to_string(),
        String::new(),
        format!("{}: {}", tx.kind(), money(tx.amount().value(), currency)),
    ];
    if let Some(category) = &tx.category {
        lines.push(format!("Category: {category}"));
    }
    if let Some(to_account) = &tx.to_account {
        lines.push(format!("To account: {to_account}"));
    }
    if let Some(comment) = &tx.comment {
        lines.push(format!("Comment: {comment}"));
    }
    if let Some(hours) = tx.hours {
        let earned = hours * hourly_rate;
        lines.push(format!(
            "Hours: {hours} (= {} at the hourly rate)",
            money(earned, currency)
        ));
    }
    lines.push(format!("Date: {}", Local::now().format("%d.%m.%Y")));
    lines.join("\n")
}
