use std::path::{Path, PathBuf};

use itertools::Itertools;
use jiff::Zoned;
use jiff::civil::Date;
use jiff::fmt::strtime;
use rust_decimal::Decimal;

use crate::calculation::aggregate::{DailyCosts, MonthlyCosts};
use crate::dates::DateWindow;
use crate::prelude::*;

/// Merges the three aggregates into one CSV per account and writes it.
///
/// Returns the path of the written file:
/// `<output_dir>/<account_name>_cost_report_<YYYYMMDD-HHMMSS>.csv`.
pub fn write_report(
    output_dir: &Path,
    account_name: &str,
    previous_window: &DateWindow,
    previous_month_costs: &MonthlyCosts,
    current_month_costs: &MonthlyCosts,
    specified_date_costs: &DailyCosts,
    specified_date_total: Decimal,
    specified_date_days: &[String],
) -> AppResult<PathBuf> {
    let rows = build_rows(
        previous_window,
        previous_month_costs,
        current_month_costs,
        specified_date_costs,
        specified_date_total,
        specified_date_days,
    )?;

    let timestamp = strtime::format("%Y%m%d-%H%M%S", &Zoned::now()).into_diagnostic()?;
    let filename = format!("{}_cost_report_{}.csv", account_name, timestamp);
    let path = output_dir.join(filename);

    write_csv(&path, &rows)?;

    Ok(path)
}

/// Assembles header, one row per service, and the trailing totals row.
/// Split out from the file write so the layout is testable as plain strings.
pub fn build_rows(
    previous_window: &DateWindow,
    previous_month_costs: &MonthlyCosts,
    current_month_costs: &MonthlyCosts,
    specified_date_costs: &DailyCosts,
    specified_date_total: Decimal,
    specified_date_days: &[String],
) -> AppResult<Vec<Vec<String>>> {
    let mut rows = vec![header_row(previous_window.start, specified_date_days)?];

    // Union of everything any window saw, sorted so two runs over the same
    // data produce the same file.
    let services: Vec<&String> = previous_month_costs
        .keys()
        .chain(current_month_costs.keys())
        .chain(specified_date_costs.keys())
        .unique()
        .sorted()
        .collect();

    for service in &services {
        let previous_total = lookup(previous_month_costs, service);
        let current_total = lookup(current_month_costs, service);

        let specified_total: Decimal = specified_date_costs
            .get(*service)
            .map(|by_day| by_day.values().copied().sum())
            .unwrap_or(Decimal::ZERO);

        let mut row = vec![
            (*service).clone(),
            format_dollar(previous_total),
            format_dollar(current_total),
            format_dollar(specified_total),
        ];

        for day in specified_date_days {
            row.push(format_dollar(day_amount(specified_date_costs, service, day)));
        }

        rows.push(row);
    }

    rows.push(total_row(
        &services,
        previous_month_costs,
        current_month_costs,
        specified_date_costs,
        specified_date_total,
        specified_date_days,
    ));

    Ok(rows)
}

// private

fn header_row(previous_month_start: Date, specified_date_days: &[String]) -> AppResult<Vec<String>> {
    // The month label comes from the user-supplied previous-month window, so
    // the header always names the window the numbers were fetched for.
    let month_name = strtime::format("%B", previous_month_start).into_diagnostic()?;

    let mut header = vec![
        "Service".to_owned(),
        format!("Total Cost for {}", month_name),
        "Total Cost Current Month".to_owned(),
        "Total Cost for Specified Date".to_owned(),
    ];

    header.extend(specified_date_days.iter().cloned());

    Ok(header)
}

fn total_row(
    services: &[&String],
    previous_month_costs: &MonthlyCosts,
    current_month_costs: &MonthlyCosts,
    specified_date_costs: &DailyCosts,
    specified_date_total: Decimal,
    specified_date_days: &[String],
) -> Vec<String> {
    let total_previous: Decimal = previous_month_costs.values().copied().sum();
    let total_current: Decimal = current_month_costs.values().copied().sum();

    let mut row = vec![
        "Total".to_owned(),
        format_dollar(total_previous),
        format_dollar(total_current),
        // The grand total is handed in from aggregation, not recomputed from
        // the rows above.
        format_dollar(specified_date_total),
    ];

    for day in specified_date_days {
        let daily_total: Decimal = services
            .iter()
            .map(|service| day_amount(specified_date_costs, service, day))
            .sum();

        row.push(format_dollar(daily_total));
    }

    row
}

fn lookup(costs: &MonthlyCosts, service: &str) -> Decimal {
    costs.get(service).copied().unwrap_or(Decimal::ZERO)
}

fn day_amount(costs: &DailyCosts, service: &str, day: &str) -> Decimal {
    costs
        .get(service)
        .and_then(|by_day| by_day.get(day))
        .copied()
        .unwrap_or(Decimal::ZERO)
}

/// Dollar prefix, exactly two decimals.
fn format_dollar(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

fn write_csv(path: &Path, rows: &[Vec<String>]) -> AppResult {
    let mut writer = csv::Writer::from_path(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not create the report file at {}.", path.display()))?;

    for row in rows {
        writer
            .write_record(row)
            .into_diagnostic()
            .wrap_err("Failed to write a report row.")?;
    }

    writer
        .flush()
        .into_diagnostic()
        .wrap_err("Failed to flush the report file.")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::aggregate::{daily_costs, grand_total, monthly_costs};
    use crate::io::cost_explorer::dtos::{Group, MetricValue, ResultByTime, TimePeriod};
    use jiff::civil::date;
    use std::collections::HashMap;

    fn group(service: &str, amount: &str) -> Group {
        Group {
            keys: vec![service.to_owned()],
            metrics: HashMap::from([(
                "UnblendedCost".to_owned(),
                MetricValue {
                    amount: amount.to_owned(),
                    unit: "USD".to_owned(),
                },
            )]),
        }
    }

    fn bucket(day: &str, groups: Vec<Group>) -> ResultByTime {
        ResultByTime {
            time_period: TimePeriod {
                start: day.to_owned(),
                end: day.to_owned(),
            },
            groups,
            estimated: false,
        }
    }

    fn october() -> DateWindow {
        DateWindow {
            start: date(2023, 10, 1),
            end: date(2023, 10, 31),
        }
    }

    /// The reference scenario: account "Safe", two services, a two-day range.
    fn scenario_rows() -> Vec<Vec<String>> {
        let previous =
            monthly_costs(vec![group("EC2", "10.555"), group("S3", "2.001")]).unwrap();
        let current = monthly_costs(vec![group("EC2", "12.0")]).unwrap();
        let specified = daily_costs(vec![
            bucket("2023-11-01", vec![group("EC2", "1.0")]),
            bucket("2023-11-02", vec![group("EC2", "1.0")]),
        ])
        .unwrap();
        let total = grand_total(&specified);
        let days = vec!["2023-11-01".to_owned(), "2023-11-02".to_owned()];

        build_rows(&october(), &previous, &current, &specified, total, &days).unwrap()
    }

    #[test]
    fn header_names_the_previous_window_month_and_all_days() {
        let rows = scenario_rows();

        assert_eq!(
            rows[0],
            vec![
                "Service",
                "Total Cost for October",
                "Total Cost Current Month",
                "Total Cost for Specified Date",
                "2023-11-01",
                "2023-11-02",
            ]
        );
    }

    #[test]
    fn service_rows_follow_the_reference_scenario() {
        let rows = scenario_rows();

        // Sorted services: EC2 before S3.
        assert_eq!(
            rows[1],
            vec!["EC2", "$10.56", "$12.00", "$2.00", "$1.00", "$1.00"]
        );
        assert_eq!(
            rows[2],
            vec!["S3", "$2.00", "$0.00", "$0.00", "$0.00", "$0.00"]
        );
    }

    #[test]
    fn total_row_sums_each_column() {
        let rows = scenario_rows();

        assert_eq!(
            rows.last().unwrap(),
            &vec!["Total", "$12.56", "$12.00", "$2.00", "$1.00", "$1.00"]
        );
    }

    #[test]
    fn every_row_has_one_cell_per_header_column() {
        let rows = scenario_rows();
        let width = rows[0].len();

        assert!(rows.iter().all(|row| row.len() == width));
    }

    #[test]
    fn specified_total_column_equals_the_sum_of_day_columns() {
        let specified = daily_costs(vec![
            bucket("2023-11-01", vec![group("EC2", "1.25"), group("S3", "0.10")]),
            bucket("2023-11-02", vec![group("EC2", "2.50")]),
        ])
        .unwrap();
        let total = grand_total(&specified);
        let days = vec!["2023-11-01".to_owned(), "2023-11-02".to_owned()];

        let rows = build_rows(
            &october(),
            &MonthlyCosts::new(),
            &MonthlyCosts::new(),
            &specified,
            total,
            &days,
        )
        .unwrap();

        // EC2 row: specified total $3.75 = $1.25 + $2.50.
        assert_eq!(rows[1], vec!["EC2", "$0.00", "$0.00", "$3.75", "$1.25", "$2.50"]);
        // S3 row: $0.10 on day one only.
        assert_eq!(rows[2], vec!["S3", "$0.00", "$0.00", "$0.10", "$0.10", "$0.00"]);
    }

    #[test]
    fn empty_day_range_yields_zero_columns_and_zero_totals() {
        let previous = monthly_costs(vec![group("EC2", "5.0")]).unwrap();
        let specified = DailyCosts::new();

        let rows = build_rows(
            &october(),
            &previous,
            &MonthlyCosts::new(),
            &specified,
            Decimal::ZERO,
            &[],
        )
        .unwrap();

        assert_eq!(rows[0].len(), 4); // No day columns at all.
        assert_eq!(rows[1], vec!["EC2", "$5.00", "$0.00", "$0.00"]);
        assert_eq!(rows[2], vec!["Total", "$5.00", "$0.00", "$0.00"]);
    }

    #[test]
    fn rebuilding_from_the_same_aggregates_is_byte_identical() {
        assert_eq!(scenario_rows(), scenario_rows());
    }

    #[test]
    fn writes_a_csv_file_with_the_expected_content() {
        let rows = scenario_rows();
        let dir = std::env::temp_dir();
        let path = dir.join("costmeter_report_writer_test.csv");

        write_csv(&path, &rows).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("Service,Total Cost for October"));
        assert_eq!(
            lines.next().unwrap(),
            "EC2,$10.56,$12.00,$2.00,$1.00,$1.00"
        );
    }
}
