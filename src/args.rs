//! These structs provide the CLI interface for the ledgerbot CLI.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledgerbot: a conversational transaction-entry front end for a Google Sheets ledger.
///
/// The bot records income, expense and transfer transactions into your ledger spreadsheet,
/// either through a short step-by-step dialogue or through one-line quick entries like
/// '50 products store run'.
///
/// Set LEDGER_BOT_IN_TEST_MODE=1 to run against an in-memory ledger instead of Google Sheets,
/// which is useful for trying the dialogue without credentials.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. Pass the URL of your ledger Google Sheet as
    /// --sheet-url. For google mode you will also need to place OAuth token material at
    /// $LEDGER_BOT_HOME/.secrets/token.json afterward.
    Init(InitArgs),
    /// Run the interactive conversation in the console.
    Chat,
    /// Parse one quick-entry line and append it to the ledger.
    Quick(QuickArgs),
    /// Print the account and category lists the dialogue will offer.
    Refs,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where ledger-bot configuration is held. Defaults to ~/ledger-bot
    #[arg(long, env = "LEDGER_BOT_HOME", default_value_os_t = default_ledger_home())]
    ledger_home: PathBuf,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &Path {
        &self.ledger_home
    }
}

/// Args for the `ledgerbot init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your ledger Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,
}

impl InitArgs {
    pub fn new(sheet_url: impl Into<String>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }
}

/// Args for the `ledgerbot quick` command.
#[derive(Debug, Parser, Clone)]
pub struct QuickArgs {
    /// The quick-entry line, e.g. '50 products store run' or 'transfer 100 card'.
    line: String,
}

impl QuickArgs {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

fn default_ledger_home() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("ledger-bot"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_BOT_HOME instead of relying on the \
                default ledger-bot home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("ledger-bot")
        }
    }
}
