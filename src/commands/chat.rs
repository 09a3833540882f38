//! The interactive console conversation. This is a thin stand-in for a chat transport: it
//! renders each dialogue reply as text with numbered options and feeds lines of input back
//! into the engine as selection or text events.

use crate::commands::Out;
use crate::dialog::{Choice, DialogEngine, Event, Reply};
use crate::{ledger, Config, Mode, Result};
use anyhow::Context;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A chat id for the single local user of the console surface.
const LOCAL_CHAT_ID: i64 = 0;

/// Runs the console conversation loop until EOF or `/quit`.
pub async fn chat(config: Config, mode: Mode) -> Result<Out<()>> {
    let ledger = ledger::ledger(&config, mode).await?;
    let mut engine = DialogEngine::new(config, ledger)?;

    println!("ledger-bot console chat ({mode} mode)");
    println!("/add starts a transaction, /cancel cancels it, /quit exits.");
    println!("Or type a quick entry like '50 products store run'.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut options: Vec<Choice> = Vec::new();

    prompt_marker()?;
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim().to_string();
        if line.is_empty() {
            prompt_marker()?;
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        engine.evict_idle();

        let reply = if line == "/add" {
            engine.start(LOCAL_CHAT_ID)
        } else if let Some(token) = picked_token(&options, &line) {
            engine.handle_event(LOCAL_CHAT_ID, Event::Select(token)).await
        } else if engine.has_active(LOCAL_CHAT_ID) || line.starts_with('/') {
            engine.handle_event(LOCAL_CHAT_ID, Event::Text(line)).await
        } else {
            match engine.quick_entry(LOCAL_CHAT_ID, &line).await {
                Some(reply) => reply,
                None => Reply::text(
                    "I didn't recognize that. Type '<amount> <category> [comment]' or /add.",
                ),
            }
        };

        options = reply.options().to_vec();
        render(&reply);
        prompt_marker()?;
    }

    Ok(Out::new_message("Goodbye."))
}

/// Resolves a typed number to the token of the corresponding option from the last reply.
fn picked_token(options: &[Choice], line: &str) -> Option<String> {
    let index: usize = line.parse().ok()?;
    (1..=options.len())
        .contains(&index)
        .then(|| options[index - 1].token().to_string())
}

fn render(reply: &Reply) {
    println!("\n{}", reply.message());
    for (index, choice) in reply.options().iter().enumerate() {
        println!("  [{}] {}", index + 1, choice.label());
    }
}

fn prompt_marker() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<Choice> {
        vec![
            Choice::new("Expense", "add_expense"),
            Choice::new("Income", "add_income"),
        ]
    }

    #[test]
    fn test_picked_token_in_range() {
        assert_eq!(picked_token(&choices(), "1").as_deref(), Some("add_expense"));
        assert_eq!(picked_token(&choices(), "2").as_deref(), Some("add_income"));
    }

    #[test]
    fn test_picked_token_out_of_range_or_text() {
        assert_eq!(picked_token(&choices(), "0"), None);
        assert_eq!(picked_token(&choices(), "3"), None);
        assert_eq!(picked_token(&choices(), "42.50"), None);
        assert_eq!(picked_token(&choices(), "groceries"), None);
        assert_eq!(picked_token(&[], "1"), None);
    }
}
