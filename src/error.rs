use miette::Diagnostic;
use thiserror::Error;

// Naming scheme:
// costmeter::parse -> date/input validation.
// costmeter::config -> accounts file, credentials.
// costmeter::api -> provider responses that came back wrong.

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Invalid date: expected YYYY-MM-DD, got '{0}'")]
    #[diagnostic(
        code(costmeter::parse::date),
        help("Please provide a full calendar date, like '2023-11-01'.")
    )]
    InvalidDate(String),

    #[error("Input ended while waiting for {0}.")]
    #[diagnostic(
        code(costmeter::parse::eof),
        help("Pass the date on the command line instead, e.g. --range-start 2023-11-01.")
    )]
    InputClosed(String),

    #[error("Accounts file not found at {path}.")]
    #[diagnostic(
        code(costmeter::config::missing),
        help(
            "Create the file or point to one with --config.\n\
Minimal example:\n\
\n\
[[accounts]]\n\
name = \"Safe\"\n\
access_key_id = \"AKIA...\"\n\
secret_access_key = \"...\"\n\
region = \"us-east-1\"
            "
        )
    )]
    AccountsFileNotFound { path: String },

    #[error("The accounts file has no accounts in it.")]
    #[diagnostic(
        code(costmeter::config::empty),
        help("Add at least one [[accounts]] entry to the file.")
    )]
    NoAccounts,

    #[error("Provider returned an unparseable cost amount: '{0}'")]
    #[diagnostic(
        code(costmeter::api::amount),
        help("Cost Explorer reports amounts as decimal strings; this one was not one.")
    )]
    BadAmount(String),
}
