use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use serde_json::json;

use crate::config::Account;
use crate::dates::DateWindow;
use crate::display::SpinnerContainer;
use crate::prelude::*;

use super::dtos::{CostAndUsageResponse, Group, ResultByTime};

const TARGET: &str = "AWSInsightsIndexService.GetCostAndUsage";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const SIGNING_SERVICE: &str = "ce";
const GAP_TIME_BETWEEN_PAGES_IN_SEC: u64 = 1;

/// Time-bucketing resolution of a billing query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
        }
    }
}

/// One MONTHLY query over the whole window.
///
/// The provider answers with a single time bucket whose groups are the
/// per-service totals, but when that bucket overflows a page its remaining
/// groups arrive as further buckets on later pages. So: flatten everything.
/// An empty answer (fresh account, no spend) is just an empty list, not an
/// error.
pub fn fetch_monthly(
    account: &Account,
    window: &DateWindow,
    spinner: &mut SpinnerContainer,
) -> AppResult<Vec<Group>> {
    let buckets = fetch(account, window, Granularity::Monthly, spinner)?;

    Ok(monthly_groups(buckets))
}

/// One DAILY query over the window: one bucket per calendar day.
pub fn fetch_daily(
    account: &Account,
    window: &DateWindow,
    spinner: &mut SpinnerContainer,
) -> AppResult<Vec<ResultByTime>> {
    fetch(account, window, Granularity::Daily, spinner)
}

// private

/// Drives the call, following continuation tokens until the provider says
/// it is done. Large accounts overflow a single page, so the token has to
/// be honored or services silently go missing from the report.
fn fetch(
    account: &Account,
    window: &DateWindow,
    granularity: Granularity,
    spinner: &mut SpinnerContainer,
) -> AppResult<Vec<ResultByTime>> {
    let mut buckets: Vec<ResultByTime> = vec![];
    let mut next_page_token: Option<String> = None;
    let mut page_number = 1;

    loop {
        spinner.update_text(progress_text(&account.name, page_number));

        if page_number > 1 {
            wait();
        }

        let body = call_once(account, window, granularity, next_page_token.as_deref())?;

        buckets.extend(body.results_by_time);

        match body.next_page_token {
            Some(token) => next_page_token = Some(token),
            None => break,
        }

        page_number += 1;
    }

    Ok(buckets)
}

fn call_once(
    account: &Account,
    window: &DateWindow,
    granularity: Granularity,
    page_token: Option<&str>,
) -> AppResult<CostAndUsageResponse> {
    let endpoint = endpoint(&account.region);
    let payload = request_payload(window, granularity, page_token);
    let body = serde_json::to_vec(&payload).into_diagnostic()?;

    let signed_headers = signed_headers(account, &endpoint, &body, SystemTime::now())?;

    let mut request = ureq::post(endpoint.as_str());
    for (name, value) in &signed_headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request
        .send(&body[..])
        .into_diagnostic()
        .wrap_err_with(|| format!("Cost query failed for account '{}'.", account.name))?
        .body_mut()
        .read_json::<CostAndUsageResponse>()
        .into_diagnostic()
        .wrap_err("Cost Explorer answered with a body this tool does not understand.")?;

    Ok(response)
}

/// Joins a paginated monthly answer back into one list of service groups.
fn monthly_groups(buckets: Vec<ResultByTime>) -> Vec<Group> {
    buckets
        .into_iter()
        .flat_map(|bucket| bucket.groups)
        .collect()
}

fn endpoint(region: &str) -> String {
    format!("https://ce.{}.amazonaws.com/", region)
}

/// The GetCostAndUsage body: unblended cost, grouped by service, over the
/// window at the requested granularity.
fn request_payload(
    window: &DateWindow,
    granularity: Granularity,
    page_token: Option<&str>,
) -> serde_json::Value {
    let mut payload = json!({
        "TimePeriod": {
            "Start": window.start_string(),
            "End": window.end_string(),
        },
        "Granularity": granularity.as_str(),
        "Metrics": ["UnblendedCost"],
        "GroupBy": [
            { "Type": "DIMENSION", "Key": "SERVICE" }
        ],
    });

    if let Some(token) = page_token {
        payload["NextPageToken"] = json!(token);
    }

    payload
}

/// SigV4-signs the request and returns the complete header set to send,
/// including host, target and the authorization headers the signer adds.
fn signed_headers(
    account: &Account,
    endpoint: &str,
    body: &[u8],
    at: SystemTime,
) -> AppResult<Vec<(String, String)>> {
    let host = endpoint
        .trim_start_matches("https://")
        .trim_end_matches('/')
        .to_owned();

    let base_headers = [
        ("host", host.as_str()),
        ("content-type", CONTENT_TYPE),
        ("x-amz-target", TARGET),
    ];

    let signable_request = SignableRequest::new(
        "POST",
        endpoint,
        base_headers.iter().copied(),
        SignableBody::Bytes(body),
    )
    .into_diagnostic()?;

    let credentials = Credentials::new(
        account.access_key_id.clone(),
        account.secret_access_key.clone(),
        account.session_token.clone(),
        None,
        "costmeter-accounts-file",
    );
    let identity = Identity::new(credentials, None);

    let signing_params = v4::SigningParams::builder()
        .identity(&identity)
        .region(&account.region)
        .name(SIGNING_SERVICE)
        .time(at)
        .settings(SigningSettings::default())
        .build()
        .into_diagnostic()?
        .into();

    let (instructions, _signature) = sign(signable_request, &signing_params)
        .into_diagnostic()?
        .into_parts();

    // The signer hands back instructions for an http crate request, so build
    // one just to collect the final header set out of it.
    let mut carrier = http::Request::builder()
        .method("POST")
        .uri(endpoint)
        .body(())
        .into_diagnostic()?;

    for (name, value) in base_headers {
        carrier.headers_mut().insert(
            http::HeaderName::try_from(name).into_diagnostic()?,
            http::HeaderValue::try_from(value).into_diagnostic()?,
        );
    }

    instructions.apply_to_request_http1x(&mut carrier);

    let headers = carrier
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = value
                .to_str()
                .into_diagnostic()
                .wrap_err("Signer produced a non-UTF-8 header value.")?;

            Ok((name.as_str().to_owned(), value.to_owned()))
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(headers)
}

/// Keep ourselves under the provider's rate limits. We can wait.
fn wait() {
    let duration = std::time::Duration::from_secs(GAP_TIME_BETWEEN_PAGES_IN_SEC);

    std::thread::sleep(duration);
}

fn progress_text(account_name: &str, page_number: usize) -> String {
    format!("Fetching cost data for {}{}", account_name, ".".repeat(page_number))
}
