use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::prelude::*;

/// One AWS account we can pull billing data for.
///
/// Loaded once at startup and never mutated. The credential fields map
/// straight onto what SigV4 signing needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Display name, also the prefix of the report file.
    pub name: String,

    pub access_key_id: String,

    pub secret_access_key: String,

    /// Only present for temporary (STS) credentials.
    pub session_token: Option<String>,

    /// Region the Cost Explorer endpoint is resolved in, e.g. "us-east-1".
    pub region: String,
}

#[derive(Debug, Deserialize)]
struct AccountsFile {
    #[serde(default)]
    accounts: Vec<Account>,
}

/// Where the accounts file lives when --config is not given.
pub fn default_path() -> PathBuf {
    // Falls back to a relative path when the platform has no config dir.
    // That case is exotic enough to not deserve its own error.
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("costmeter")
        .join("accounts.toml")
}

/// Reads and validates the accounts file.
///
/// A missing file and an empty account list are both startup errors;
/// there is nothing useful this tool can do without credentials.
pub fn load(path: &Path) -> AppResult<Vec<Account>> {
    if !path.try_exists().into_diagnostic()? {
        let error = Error::AccountsFileNotFound {
            path: path.display().to_string(),
        };

        return Err(error.into());
    }

    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err("Failed to read the accounts file.")?;

    let parsed: AccountsFile = toml::from_str(&content)
        .into_diagnostic()
        .wrap_err("Failed to parse the accounts file as TOML.")?;

    if parsed.accounts.is_empty() {
        return Err(Error::NoAccounts.into());
    }

    Ok(parsed.accounts)
}
