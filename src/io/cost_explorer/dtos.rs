use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::Error;

// Wire shapes for the GetCostAndUsage operation, x-amz-json-1.1 flavor.
//
// Only the parts this tool actually reads are modeled. Cost Explorer ships
// amounts as decimal strings, so they stay strings here and get parsed into
// Decimal at the aggregation boundary.

/// Response body of GetCostAndUsage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostAndUsageResponse {
    /// One bucket per time period. MONTHLY over a single window means a
    /// single bucket; DAILY means one per calendar day.
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,

    /// Continuation token. Present when the result set did not fit in one
    /// page.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A single time bucket of grouped cost results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    pub time_period: TimePeriod,

    #[serde(default)]
    pub groups: Vec<Group>,

    /// Whether the provider considers this bucket still subject to change.
    #[serde(default)]
    pub estimated: bool,
}

/// Start inclusive, end exclusive, both ISO dates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePeriod {
    pub start: String,
    pub end: String,
}

/// One grouped row inside a bucket. With a single SERVICE group-by, `keys`
/// carries exactly one entry: the service name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    #[serde(default)]
    pub keys: Vec<String>,

    #[serde(default)]
    pub metrics: HashMap<String, MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    pub amount: String,
    pub unit: String,
}

impl Group {
    /// The service this row is about. Service names are free text from the
    /// provider's taxonomy, not something to enumerate.
    pub fn service_name(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or("Unknown")
    }

    /// Parses the UnblendedCost amount. A group without that metric counts
    /// as zero rather than an error; the provider always sends it when the
    /// query asked for it.
    pub fn unblended_amount(&self) -> Result<Decimal, Error> {
        let Some(metric) = self.metrics.get("UnblendedCost") else {
            return Ok(Decimal::ZERO);
        };

        metric
            .amount
            .parse::<Decimal>()
            .map_err(|_| Error::BadAmount(metric.amount.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    // Trimmed-down but structurally faithful GetCostAndUsage response.
    const SAMPLE: &str = r#"{
        "ResultsByTime": [
            {
                "TimePeriod": { "Start": "2023-11-01", "End": "2023-11-02" },
                "Groups": [
                    {
                        "Keys": ["Amazon Elastic Compute Cloud - Compute"],
                        "Metrics": {
                            "UnblendedCost": { "Amount": "1.2345678", "Unit": "USD" }
                        }
                    },
                    {
                        "Keys": ["Amazon Simple Storage Service"],
                        "Metrics": {
                            "UnblendedCost": { "Amount": "0.0000031", "Unit": "USD" }
                        }
                    }
                ],
                "Estimated": true
            }
        ],
        "NextPageToken": "opaque-token"
    }"#;

    #[test]
    fn deserializes_a_realistic_response() {
        let parsed: CostAndUsageResponse = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(parsed.next_page_token.as_deref(), Some("opaque-token"));
        assert_eq!(parsed.results_by_time.len(), 1);

        let bucket = &parsed.results_by_time[0];
        assert_eq!(bucket.time_period.start, "2023-11-01");
        assert!(bucket.estimated);
        assert_eq!(bucket.groups.len(), 2);
        assert_eq!(
            bucket.groups[0].service_name(),
            "Amazon Elastic Compute Cloud - Compute"
        );
    }

    #[test]
    fn missing_token_and_groups_default_cleanly() {
        let raw = r#"{
            "ResultsByTime": [
                { "TimePeriod": { "Start": "2023-11-01", "End": "2023-11-02" } }
            ]
        }"#;

        let parsed: CostAndUsageResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.next_page_token, None);
        assert!(parsed.results_by_time[0].groups.is_empty());
        assert!(!parsed.results_by_time[0].estimated);
    }

    #[test]
    fn amount_parses_into_decimal() {
        let parsed: CostAndUsageResponse = serde_json::from_str(SAMPLE).unwrap();
        let amount = parsed.results_by_time[0].groups[0].unblended_amount().unwrap();

        assert_eq!(amount, "1.2345678".parse::<Decimal>().unwrap());
    }

    #[test]
    fn garbage_amount_is_an_error() {
        let group = Group {
            keys: vec!["Amazon S3".to_owned()],
            metrics: HashMap::from([(
                "UnblendedCost".to_owned(),
                MetricValue {
                    amount: "not-a-number".to_owned(),
                    unit: "USD".to_owned(),
                },
            )]),
        };

        assert!(group.unblended_amount().is_err());
    }

    #[test]
    fn absent_metric_counts_as_zero() {
        let group = Group {
            keys: vec!["Amazon S3".to_owned()],
            metrics: HashMap::new(),
        };

        assert_eq!(group.unblended_amount().unwrap(), Decimal::ZERO);
    }
}
