//! Configuration file handling for ledger-bot.
//!
//! The configuration file is stored at `$LEDGER_BOT_HOME/config.json` and contains the Google
//! Sheet URL along with the bot's tunable settings: the sheet tab names, the currency label,
//! the default cash account, the wage hourly rate and the conversation idle timeout.

use crate::{utils, Result};
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "ledger-bot";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

const DEFAULT_REFERENCES_TAB: &str = "References";
const DEFAULT_BUDGET_TAB: &str = "Categories";
const DEFAULT_TRANSACTIONS_TAB: &str = "Transactions";
const DEFAULT_CURRENCY: &str = "BYN";
const DEFAULT_CASH_ACCOUNT: &str = "Cash";
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 900;

/// The default wage hourly rate, used for the display-only `hours x rate` line.
fn default_hourly_rate() -> Decimal {
    // 6.5
    Decimal::new(65, 1)
}

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$LEDGER_BOT_HOME` and from there it loads `$LEDGER_BOT_HOME/config.json`. It
/// provides paths to other items that are expected in a certain location within the ledger-bot
/// home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory and its subdirectories, and writes an initial `config.json`
    /// using `sheet_url` along with default settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory, e.g.
    ///   `$HOME/ledger-bot`
    /// - `sheet_url` - The URL of the Google Sheet where the ledger lives, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or if the URL carries no spreadsheet ID.
    pub async fn create(dir: impl Into<PathBuf>, sheet_url: &str) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the ledger-bot home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: sheet_url.to_string(),
            references_tab: DEFAULT_REFERENCES_TAB.to_string(),
            budget_tab: DEFAULT_BUDGET_TAB.to_string(),
            transactions_tab: DEFAULT_TRANSACTIONS_TAB.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            cash_account: DEFAULT_CASH_ACCOUNT.to_string(),
            hourly_rate: default_hourly_rate(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        };
        config_file.save(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that the ledger-bot home and the config file exist
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The ledger-bot home is missing, run 'ledgerbot init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?;

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Path to the Google token material, `$LEDGER_BOT_HOME/.secrets/token.json`.
    pub fn token_path(&self) -> PathBuf {
        self.secrets.join(TOKEN_JSON)
    }

    pub fn references_tab(&self) -> &str {
        &self.config_file.references_tab
    }

    pub fn budget_tab(&self) -> &str {
        &self.config_file.budget_tab
    }

    pub fn transactions_tab(&self) -> &str {
        &self.config_file.transactions_tab
    }

    pub fn currency(&self) -> &str {
        &self.config_file.currency
    }

    pub fn cash_account(&self) -> &str {
        &self.config_file.cash_account
    }

    pub fn hourly_rate(&self) -> Decimal {
        self.config_file.hourly_rate
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.idle_timeout_secs)
    }
}

/// The serialized form of the configuration, i.e. the contents of `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct ConfigFile {
    app_name: String,
    config_version: u8,
    sheet_url: String,
    references_tab: String,
    budget_tab: String,
    transactions_tab: String,
    currency: String,
    cash_account: String,
    hourly_rate: Decimal,
    idle_timeout_secs: u64,
}

impl ConfigFile {
    async fn load(path: &Path) -> Result<Self> {
        utils::deserialize(path).await
    }

    async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize the config file")?;
        utils::write(path, content).await
    }
}

/// Pulls the spreadsheet ID out of a Google Sheets URL, i.e. the path segment after `/d/`.
fn extract_spreadsheet_id(sheet_url: &str) -> Result<String> {
    let url = Url::parse(sheet_url).with_context(|| format!("Invalid sheet URL '{sheet_url}'"))?;
    let mut segments = url
        .path_segments()
        .with_context(|| format!("The sheet URL '{sheet_url}' has no path"))?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            return segments
                .next()
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .with_context(|| {
                    format!("The sheet URL '{sheet_url}' has no spreadsheet ID after '/d/'")
                });
        }
    }
    bail!("Could not find a spreadsheet ID in '{sheet_url}'")
}
