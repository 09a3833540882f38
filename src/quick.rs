//! The quick-entry parser: one line of free text in, a draft-shaped transaction out.
//!
//! Supported shapes (case-insensitive):
//! - `50 products store run` -> Expense 50, Products, comment "store run"
//! - `135 tips shift 10h` -> Income 135, Wages/Tips, 10 hours
//! - `transfer 100 card` -> Transfer 100 to Card
//!
//! Anything else is unrecognized. The parser has no side effects and never fails: a malformed
//! numeric token simply yields `None` for the line.

use crate::model::{Amount, TxKind};
use crate::reference;
use crate::Result;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// A successfully parsed quick-entry line.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickEntry {
    pub(crate) kind: TxKind,
    pub(crate) amount: Amount,
    pub(crate) category: Option<String>,
    pub(crate) to_account: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) hours: Option<Decimal>,
}

/// Parses quick-entry lines. The regexes are compiled once at construction; the parser itself
/// is stateless and can be reused for every incoming line.
pub struct QuickParser {
    // "10h", "10 h", "2.5hr", "1,5 hours" - comma or dot decimals
    hours_re: Regex,
    // "transfer 100 card" - dot decimals only
    transfer_re: Regex,
    // leading amount followed by whitespace - dot decimals only
    amount_re: Regex,
}

impl QuickParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            hours_re: Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:h|hr|hrs|hour|hours)\b")?,
            transfer_re: Regex::new(r"^transfer\s+(\d+(?:\.\d+)?)\s+(\S+)")?,
            amount_re: Regex::new(r"^(\d+(?:\.\d+)?)\s+")?,
        })
    }

    /// Parses one line of text. Returns `None` when the line does not match the quick-entry
    /// grammar.
    pub fn parse(&self, text: &str) -> Option<QuickEntry> {
        let text = text.trim().to_lowercase();

        // Pull the hours token out first so it cannot be mistaken for the amount or category.
        let hours = self
            .hours_re
            .captures(&text)
            .and_then(|caps| Decimal::from_str(&caps[1].replace(',', ".")).ok());
        let text = if hours.is_some() {
            self.hours_re.replace_all(&text, "").trim().to_string()
        } else {
            text
        };

        if text.starts_with("transfer") {
            let caps = self.transfer_re.captures(&text)?;
            let amount = Amount::from_str(&caps[1]).ok()?;
            return Some(QuickEntry {
                kind: TxKind::Transfer,
                amount,
                category: None,
                to_account: Some(reference::capitalize(&caps[2])),
                comment: None,
                hours: None,
            });
        }

        let amount_match = self.amount_re.captures(&text)?;
        let amount = Amount::from_str(&amount_match[1]).ok()?;
        let rest = text[amount_match.get(0)?.end()..].trim();

        // At most two pieces: the category token and the verbatim comment.
        let mut pieces = rest.splitn(2, char::is_whitespace);
        let category_token = pieces.next().filter(|token| !token.is_empty())?;
        let comment = pieces
            .next()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(String::from);

        let category = match reference::canonical_category(category_token) {
            Some(canonical) => canonical.to_string(),
            None => reference::capitalize(category_token),
        };
        let kind = if reference::is_income_category(&category) {
            TxKind::Income
        } else {
            TxKind::Expense
        };

        Some(QuickEntry {
            kind,
            amount,
            category: Some(category),
            to_account: None,
            comment,
            hours,
        })
    }
}
