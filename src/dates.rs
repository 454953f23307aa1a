use std::io::{self, BufRead, Write};

use jiff::Zoned;
use jiff::civil::Date;

use crate::cli::Cli;
use crate::error::Error;
use crate::prelude::*;

/// An inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Date,
    pub end: Date,
}

impl DateWindow {
    /// Expands the window into an ordered list of ISO date strings, one per
    /// day, both ends included.
    ///
    /// A reversed window (start after end) expands to nothing. That is a
    /// deliberate choice: the report then simply carries no day columns and
    /// all-zero range totals instead of refusing to run.
    pub fn days(&self) -> Vec<String> {
        let mut days = Vec::new();
        let mut cursor = self.start;

        while cursor <= self.end {
            days.push(cursor.to_string());

            // The calendar only runs out at Date::MAX, which a billing query
            // will never reach, but the type makes us say it out loud.
            cursor = match cursor.tomorrow() {
                Ok(next) => next,
                Err(_) => break,
            };
        }

        days
    }

    pub fn start_string(&self) -> String {
        self.start.to_string()
    }

    pub fn end_string(&self) -> String {
        self.end.to_string()
    }
}

/// The three windows every run works with.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedWindows {
    pub previous_month: DateWindow,
    pub current_month: DateWindow,
    pub specified: DateWindow,
}

/// Gathers the four user-controlled dates and derives the current month
/// window from the clock.
///
/// Dates given as CLI flags are taken as-is (and are fatal when malformed,
/// since there is nobody at a prompt to correct them). Missing ones are
/// prompted for on stdin, looping until the input parses.
pub fn resolve(cli: &Cli) -> AppResult<ResolvedWindows> {
    let previous_month = DateWindow {
        start: obtain_date(cli.previous_start.as_deref(), "Previous Month Start Date")?,
        end: obtain_date(cli.previous_end.as_deref(), "Previous Month End Date")?,
    };

    let specified = DateWindow {
        start: obtain_date(cli.range_start.as_deref(), "Specified Start Date")?,
        end: obtain_date(cli.range_end.as_deref(), "Specified End Date")?,
    };

    let current_month = current_month(Zoned::now().date());

    Ok(ResolvedWindows {
        previous_month,
        current_month,
        specified,
    })
}

/// First of the current civil month through today. Clock-derived, never
/// user input.
pub fn current_month(today: Date) -> DateWindow {
    DateWindow {
        start: today.first_of_month(),
        end: today,
    }
}

/// Strict YYYY-MM-DD validation. Empty input is rejected before parsing so
/// the user gets the same message for both mistakes.
pub fn parse_date(raw: &str) -> Result<Date, Error> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidDate(trimmed.to_owned()));
    }

    trimmed
        .parse::<Date>()
        .map_err(|_| Error::InvalidDate(trimmed.to_owned()))
}

// private

fn obtain_date(flag_value: Option<&str>, label: &str) -> AppResult<Date> {
    match flag_value {
        Some(raw) => Ok(parse_date(raw)?),
        None => prompt_date(label),
    }
}

fn prompt_date(label: &str) -> AppResult<Date> {
    prompt_date_from(&mut io::stdin().lock(), label)
}

/// The classic re-prompt loop. Only a valid date (or an interrupt) gets the
/// user out of here — except a closed stdin, which has to be fatal: with
/// nobody left to type a correction, looping would just spin on the same
/// error forever.
fn prompt_date_from(input: &mut impl BufRead, label: &str) -> AppResult<Date> {
    loop {
        print!("{} (YYYY-MM-DD): ", label);
        io::stdout().flush().into_diagnostic()?;

        let mut line = String::new();
        let bytes_read = input.read_line(&mut line).into_diagnostic()?;

        if bytes_read == 0 {
            return Err(Error::InputClosed(label.to_owned()).into());
        }

        match parse_date(&line) {
            Ok(date) => return Ok(date),
            Err(error) => println!("{}", error),
        }
    }
}
