//! Best-effort discovery of optional routes.
//!
//! The backend's feature surface is not known ahead of time, so these probes
//! only record which candidates exist. They never fail the run.

use reqwest::StatusCode;
use tracing::debug;

use super::{ProbeContext, ProbeResult, Transcript};

pub const AUTH_CANDIDATES: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/logout",
    "/login",
    "/register",
    "/user/login",
];

pub const VIDEO_CANDIDATES: &[&str] = &["/videos", "/video", "/stream", "/upload", "/media"];

/// A candidate route that answered with something other than 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovered {
    pub path: &'static str,
    pub status: StatusCode,
}

/// Sends `GET` to each candidate under the API base. Transport errors are
/// treated the same as a 404.
pub async fn discover(ctx: &ProbeContext, candidates: &[&'static str]) -> Vec<Discovered> {
    let mut found = Vec::new();
    for &path in candidates {
        let url = ctx.target.endpoint(path);
        match ctx
            .client
            .get(&url)
            .timeout(ctx.discovery_timeout)
            .send()
            .await
        {
            Ok(response) if response.status() != StatusCode::NOT_FOUND => {
                found.push(Discovered {
                    path,
                    status: response.status(),
                });
            }
            Ok(_) => debug!("GET {url}: not found"),
            Err(e) => debug!("GET {url}: {e}"),
        }
    }
    found
}

fn record(found: &[Discovered], kind: &str, transcript: &mut Transcript) {
    if found.is_empty() {
        transcript.push(format!(
            "ℹ️  No {kind} endpoints found - This may be expected for this implementation"
        ));
        return;
    }
    let listed: Vec<String> = found
        .iter()
        .map(|d| format!("({}, {})", d.path, d.status.as_u16()))
        .collect();
    transcript.push(format!("Found {kind} endpoints: [{}]", listed.join(", ")));
}

pub async fn check_auth_endpoints(ctx: &ProbeContext, transcript: &mut Transcript) -> ProbeResult {
    let found = discover(ctx, AUTH_CANDIDATES).await;
    record(&found, "authentication", transcript);
    Ok(())
}

pub async fn check_video_endpoints(ctx: &ProbeContext, transcript: &mut Transcript) -> ProbeResult {
    let found = discover(ctx, VIDEO_CANDIDATES).await;
    record(&found, "video", transcript);
    Ok(())
}
