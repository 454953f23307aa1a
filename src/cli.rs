use std::path::PathBuf;

use clap::Parser;

impl Cli {
    /// Convenience constructor to avoid redundant `Parser` imports in main.
    pub fn new() -> Self {
        Cli::parse()
    }
}

// Structs

#[derive(Parser, Debug)]
#[command(name = "costmeter", version)]
pub struct Cli {
    /// Path to the accounts file.
    /// Defaults to <config dir>/costmeter/accounts.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the report files are written into.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Skip animations
    #[arg(long, default_value_t = false)]
    pub no_animate: bool,

    //
    // Date overrides start here.
    //
    // Any of these that is missing gets prompted for on stdin instead,
    // so the tool stays usable both interactively and from scripts.
    //

    //
    /// Previous month start date (YYYY-MM-DD).
    #[arg(long)]
    pub previous_start: Option<String>,

    /// Previous month end date (YYYY-MM-DD).
    #[arg(long)]
    pub previous_end: Option<String>,

    /// Specified range start date (YYYY-MM-DD).
    #[arg(long)]
    pub range_start: Option<String>,

    /// Specified range end date (YYYY-MM-DD).
    #[arg(long)]
    pub range_end: Option<String>,
}
