use reqwest::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, HeaderMap, HeaderName, ORIGIN,
};
use reqwest::{Method, StatusCode};
use tracing::debug;

use super::{ProbeContext, ProbeError, ProbeResult, Transcript};

/// Origin the preflight claims to come from, the usual dev frontend.
pub const PREFLIGHT_ORIGIN: &str = "http://localhost:3000";

fn header_for_display(headers: &HeaderMap, name: &HeaderName) -> String {
    match headers.get(name) {
        Some(value) => value.to_str().unwrap_or("<non-utf8>").to_string(),
        None => "None".to_string(),
    }
}

/// `OPTIONS /` preflight must answer 200 or 204 with a non-empty
/// `Access-Control-Allow-Origin`.
pub async fn check_cors(ctx: &ProbeContext, transcript: &mut Transcript) -> ProbeResult {
    let url = ctx.target.endpoint("/");
    debug!("OPTIONS {url}");
    let response = ctx
        .client
        .request(Method::OPTIONS, &url)
        .header(ORIGIN, PREFLIGHT_ORIGIN)
        .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(ACCESS_CONTROL_REQUEST_HEADERS, "Content-Type")
        .timeout(ctx.request_timeout)
        .send()
        .await?;

    let status = response.status();
    transcript.push(format!("Preflight Status Code: {}", status.as_u16()));

    let headers = response.headers().clone();
    for name in [
        &ACCESS_CONTROL_ALLOW_ORIGIN,
        &ACCESS_CONTROL_ALLOW_METHODS,
        &ACCESS_CONTROL_ALLOW_HEADERS,
    ] {
        transcript.push(format!(
            "{}: {}",
            name.as_str(),
            header_for_display(&headers, name)
        ));
    }

    if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
        let body = response.text().await?;
        return Err(ProbeError::UnexpectedStatus { status, body });
    }

    match headers.get(ACCESS_CONTROL_ALLOW_ORIGIN) {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(ProbeError::Assertion(
            "preflight response has no Access-Control-Allow-Origin".to_string(),
        )),
    }
}
