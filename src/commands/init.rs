use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the ledger-bot home directory and writes an initial `config.json` pointed at
/// `sheet_url`. Token material for Google access goes into the `.secrets` directory afterward.
pub async fn init(home: &Path, sheet_url: &str) -> Result<Out<()>> {
    let config = Config::create(home, sheet_url).await?;
    Ok(Out::new_message(format!(
        "Initialized the ledger-bot home at '{}'. Before running in google mode, place your \
         token material at '{}'.",
        config.root().display(),
        config.token_path().display(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::SHEET_URL;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_config() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("ledger-bot");
        let out = init(&home, SHEET_URL).await.unwrap();
        assert!(out.message().contains("Initialized"));
        assert!(home.join("config.json").is_file());
        assert!(home.join(".secrets").is_dir());
    }
}
