use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::io::cost_explorer::dtos::{Group, ResultByTime};
use crate::prelude::*;

/// Per-service totals for a monthly window.
pub type MonthlyCosts = HashMap<String, Decimal>;

/// Per-service, per-day amounts for the daily window.
pub type DailyCosts = HashMap<String, HashMap<String, Decimal>>;

/// Money rounding: two decimals, midpoint away from zero.
///
/// Rounding happens here, before storage, so every later sum is a sum of
/// already-rounded values. Totals are sums of rounded amounts, never
/// round(sum).
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Folds the single monthly bucket's groups into service -> amount.
///
/// A service appearing twice overwrites; the API contract makes each service
/// show up once per bucket, so there is nothing to defend against.
pub fn monthly_costs(groups: Vec<Group>) -> AppResult<MonthlyCosts> {
    let mut costs = MonthlyCosts::new();

    for group in groups {
        let amount = round2(group.unblended_amount()?);
        costs.insert(group.service_name().to_owned(), amount);
    }

    Ok(costs)
}

/// Folds daily buckets into service -> day -> amount.
///
/// Unlike the monthly fold this one accumulates: the same service/day pair
/// adds up instead of overwriting. Get-or-zero, then add.
pub fn daily_costs(buckets: Vec<ResultByTime>) -> AppResult<DailyCosts> {
    let mut costs = DailyCosts::new();

    for bucket in buckets {
        let day = bucket.time_period.start;

        for group in bucket.groups {
            let amount = round2(group.unblended_amount()?);

            let by_day = costs.entry(group.service_name().to_owned()).or_default();
            *by_day.entry(day.clone()).or_insert(Decimal::ZERO) += amount;
        }
    }

    Ok(costs)
}

/// Sum over all services of sum over all days.
pub fn grand_total(costs: &DailyCosts) -> Decimal {
    costs
        .values()
        .map(|by_day| by_day.values().copied().sum::<Decimal>())
        .sum()
}
