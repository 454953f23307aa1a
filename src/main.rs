mod calculation;
mod cli;
mod config;
mod dates;
mod display;
mod error;
mod io;
mod prelude;

use std::path::PathBuf;
use std::process::ExitCode;

use crate::calculation::{aggregate, report};
use crate::cli::Cli;
use crate::config::Account;
use crate::dates::ResolvedWindows;
use crate::display::SpinnerContainer;
use crate::io::cost_explorer::client;
use crate::prelude::*;

fn main() -> AppResult<ExitCode> {
    let cli = Cli::new();

    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let accounts = config::load(&config_path)?;

    // The three windows are shared by every account, so resolve them once,
    // prompting before any network traffic happens.
    let windows = dates::resolve(&cli)?;
    let specified_days = windows.specified.days();

    // One account failing must not take the remaining ones down with it.
    // Report, remember, move on.
    let mut failed = 0;

    for account in &accounts {
        println!("Fetching cost data for {}...", account.name);

        if let Err(error) = run_account(account, &windows, &specified_days, &cli) {
            failed += 1;
            eprintln!("{:?}", error);
        }
    }

    let exit_code = if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    };

    Ok(exit_code)
}

/// The whole pipeline for one account: three fetches, two aggregations, one
/// CSV. Strictly sequential, one blocking call at a time.
fn run_account(
    account: &Account,
    windows: &ResolvedWindows,
    specified_days: &[String],
    cli: &Cli,
) -> AppResult<PathBuf> {
    let mut spinner = SpinnerContainer::create_unless_no_terminal_or(cli.no_animate);

    let previous_month_costs = aggregate::monthly_costs(client::fetch_monthly(
        account,
        &windows.previous_month,
        &mut spinner,
    )?)?;

    let current_month_costs = aggregate::monthly_costs(client::fetch_monthly(
        account,
        &windows.current_month,
        &mut spinner,
    )?)?;

    let specified_date_costs =
        aggregate::daily_costs(client::fetch_daily(account, &windows.specified, &mut spinner)?)?;

    let specified_date_total = aggregate::grand_total(&specified_date_costs);

    let path = report::write_report(
        &cli.output_dir,
        &account.name,
        &windows.previous_month,
        &previous_month_costs,
        &current_month_costs,
        &specified_date_costs,
        specified_date_total,
        specified_days,
    )?;

    spinner.stop_with_message(&format!(
        "Combined cost report for {} written to {}",
        account.name,
        path.display()
    ));

    Ok(path)
}
