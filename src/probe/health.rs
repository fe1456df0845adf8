use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::{ProbeContext, ProbeError, ProbeResult, Transcript, parse_json};

pub const EXPECTED_MESSAGE: &str = "Hello World";

/// `GET /` must answer 200 with `{"message": "Hello World"}`.
pub async fn check_health(ctx: &ProbeContext, transcript: &mut Transcript) -> ProbeResult {
    let url = ctx.target.endpoint("/");
    debug!("GET {url}");
    let response = ctx
        .client
        .get(&url)
        .timeout(ctx.request_timeout)
        .send()
        .await?;

    let status = response.status();
    transcript.push(format!("Status Code: {}", status.as_u16()));
    let body = response.text().await?;
    transcript.push(format!("Response: {body}"));

    if status != StatusCode::OK {
        return Err(ProbeError::UnexpectedStatus { status, body });
    }

    let health: Value = parse_json(&body)?;
    match health.get("message").and_then(Value::as_str) {
        Some(EXPECTED_MESSAGE) => Ok(()),
        Some(other) => Err(ProbeError::Assertion(format!(
            "unexpected message {other:?}, expected {EXPECTED_MESSAGE:?}"
        ))),
        None => Err(ProbeError::Malformed(format!(
            "no \"message\" field in {body}"
        ))),
    }
}
