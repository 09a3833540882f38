//! Builders for the prompts and option lists shown at each dialogue step. The option tokens
//! follow a `prefix_value` scheme that the engine parses back out of the selection events.

use crate::dialog::state::{Choice, Reply};
use crate::model::TxKind;
use chrono::{Datelike, Duration, Local};

pub(super) const TOKEN_ADD_EXPENSE: &str = "add_expense";
pub(super) const TOKEN_ADD_INCOME: &str = "add_income";
pub(super) const TOKEN_ADD_TRANSFER: &str = "add_transfer";
pub(super) const TOKEN_DATE_CUSTOM: &str = "date_custom";
pub(super) const TOKEN_SHOW_ALL_CATEGORIES: &str = "show_all_categories";
pub(super) const TOKEN_CONFIRM_YES: &str = "confirm_yes";
pub(super) const TOKEN_CONFIRM_NO: &str = "confirm_no";
pub(super) const TOKEN_CONFIRM_EDIT: &str = "confirm_edit";

pub(super) const PREFIX_DATE: &str = "date_";
pub(super) const PREFIX_QUICK_CATEGORY: &str = "quick_";
pub(super) const PREFIX_CATEGORY: &str = "cat_";
pub(super) const PREFIX_EXPENSE_ACCOUNT: &str = "expense_";
pub(super) const PREFIX_INCOME_ACCOUNT: &str = "income_";
pub(super) const PREFIX_FROM_ACCOUNT: &str = "from_";
pub(super) const PREFIX_TO_ACCOUNT: &str = "to_";

/// The first prompt: pick the transaction type.
pub(super) fn type_menu() -> Reply {
    Reply::with_options(
        "Add a transaction\n\nChoose a type:",
        vec![
            Choice::new("Expense", TOKEN_ADD_EXPENSE),
            Choice::new("Income", TOKEN_ADD_INCOME),
            Choice::new("Transfer", TOKEN_ADD_TRANSFER),
        ],
    )
}

/// Recent days plus an escape to type a custom day number.
pub(super) fn date_menu(kind: TxKind) -> Reply {
    let today = Local::now();
    let yesterday = today - Duration::days(1);
    let day_before = today - Duration::days(2);

    let day_choice = |label: &str, date: chrono::DateTime<Local>| {
        Choice::new(
            format!("{label} ({}.{:02})", date.day(), date.month()),
            format!("{PREFIX_DATE}{}", date.day()),
        )
    };

    Reply::with_options(
        format!("{kind}\n\nPick a date:"),
        vec![
            day_choice("Today", today),
            day_choice("Yesterday", yesterday),
            day_choice("Day before", day_before),
            Choice::new("Another day (type it)", TOKEN_DATE_CUSTOM),
        ],
    )
}

pub(super) fn custom_date_prompt(kind: TxKind) -> Reply {
    Reply::text(format!("{kind}\n\nType the day of the month (1-31):"))
}

/// The short list of frequent expense categories, with an escape to the full list.
pub(super) fn quick_category_menu(day: u32) -> Reply {
    let mut options: Vec<Choice> = crate::reference::QUICK_EXPENSE_CATEGORIES
        .iter()
        .map(|category| Choice::new(*category, format!("{PREFIX_QUICK_CATEGORY}{category}")))
        .collect();
    options.push(Choice::new("All categories", TOKEN_SHOW_ALL_CATEGORIES));
    Reply::with_options(
        format!("Expense (day {day})\n\nPick a category:"),
        options,
    )
}

pub(super) fn category_menu(title: impl Into<String>, categories: &[String]) -> Reply {
    let options = categories
        .iter()
        .map(|category| Choice::new(category.clone(), format!("{PREFIX_CATEGORY}{category}")))
        .collect();
    Reply::with_options(title, options)
}

pub(super) fn account_menu(title: impl Into<String>, accounts: &[String], prefix: &str) -> Reply {
    let options = accounts
        .iter()
        .map(|account| Choice::new(account.clone(), format!("{prefix}{account}")))
        .collect();
    Reply::with_options(title, options)
}

pub(super) fn comment_prompt() -> Reply {
    Reply::text("Add a comment (or /skip):")
}

pub(super) fn hours_prompt() -> Reply {
    Reply::text("How many hours did you work?\n(type a number or /skip)")
}

pub(super) fn confirm_menu(preview: &str) -> Reply {
    Reply::with_options(
        format!("Check the details:\n\n{preview}\n\nAll good?"),
        vec![
            Choice::new("Confirm", TOKEN_CONFIRM_YES),
            Choice::new("Cancel", TOKEN_CONFIRM_NO),
            Choice::new("Edit", TOKEN_CONFIRM_EDIT),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_menu_tokens() {
        let reply = type_menu();
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert_eq!(tokens, vec!["add_expense", "add_income", "add_transfer"]);
    }

    #[test]
    fn test_date_menu_has_three_days_and_custom() {
        let reply = date_menu(TxKind::Expense);
        assert_eq!(reply.options().len(), 4);
        assert!(reply.options()[0].token().starts_with(PREFIX_DATE));
        assert_eq!(reply.options()[3].token(), TOKEN_DATE_CUSTOM);
        let today = Local::now().day();
        assert_eq!(reply.options()[0].token(), format!("date_{today}"));
    }

    #[test]
    fn test_quick_category_menu_ends_with_escape() {
        let reply = quick_category_menu(12);
        let last = reply.options().last().unwrap();
        assert_eq!(last.token(), TOKEN_SHOW_ALL_CATEGORIES);
        assert_eq!(reply.options().len(), 7);
        assert_eq!(reply.options()[0].token(), "quick_Products");
    }

    #[test]
    fn test_account_menu_prefixes() {
        let accounts = vec!["Cash".to_string(), "Card".to_string()];
        let reply = account_menu("Which account?", &accounts, PREFIX_FROM_ACCOUNT);
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert_eq!(tokens, vec!["from_Cash", "from_Card"]);
    }
}
