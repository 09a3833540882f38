use crate::commands::Out;
use crate::dialog::DialogEngine;
use crate::{ledger, Config, Mode, Result};

/// A chat id for the single local user of the CLI surface.
const LOCAL_CHAT_ID: i64 = 0;

/// Parses `line` with the quick-entry grammar and, when recognized, appends it to the ledger
/// with today's date and the cash account.
pub async fn quick(config: Config, mode: Mode, line: &str) -> Result<Out<()>> {
    let ledger = ledger::ledger(&config, mode).await?;
    let mut engine = DialogEngine::new(config, ledger)?;
    match engine.quick_entry(LOCAL_CHAT_ID, line).await {
        Some(reply) => Ok(Out::new_message(reply.message())),
        None => Ok(Out::new_message(
            "Not recognized. Expected '<amount> <category> [comment] [Nh]' or \
             'transfer <amount> <account>'.",
        )),
    }
}
