//! Endpoint probes.
//!
//! Every probe issues one or more requests against the [`Target`] held by a
//! [`ProbeContext`] and reports through an explicit [`ProbeError`] instead of
//! panicking. Human-readable progress goes into a [`Transcript`] which the
//! runner prints once the probe is done.

pub mod cors;
pub mod discovery;
pub mod health;
pub mod status;

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{RunConfig, Target};

#[derive(Debug, Error)]
pub enum ProbeError {
    /// DNS failure, refused connection or timeout
    #[error("connection error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    /// The backend answered, but not with what was expected
    #[error("{0}")]
    Assertion(String),
}

impl ProbeError {
    pub fn is_network(&self) -> bool {
        matches!(self, ProbeError::Network(_))
    }
}

pub type ProbeResult = std::result::Result<(), ProbeError>;

/// Shared, read-only state handed to every probe.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub client: Client,
    pub target: Target,
    pub request_timeout: Duration,
    pub discovery_timeout: Duration,
}

impl ProbeContext {
    pub fn new(target: Target, config: &RunConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("backend-smoke/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(ProbeContext {
            client,
            target,
            request_timeout: config.request_timeout,
            discovery_timeout: config.discovery_timeout,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    HealthCheck,
    CorsConfiguration,
    DatabaseConnectivity,
    AuthenticationEndpoints,
    VideoEndpoints,
}

impl Probe {
    /// Invocation and display order.
    pub const ALL: [Probe; 5] = [
        Probe::HealthCheck,
        Probe::CorsConfiguration,
        Probe::DatabaseConnectivity,
        Probe::AuthenticationEndpoints,
        Probe::VideoEndpoints,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Probe::HealthCheck => "health_check",
            Probe::CorsConfiguration => "cors_configuration",
            Probe::DatabaseConnectivity => "database_connectivity",
            Probe::AuthenticationEndpoints => "authentication_endpoints",
            Probe::VideoEndpoints => "video_endpoints",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Probe::HealthCheck => "Health Check",
            Probe::CorsConfiguration => "Cors Configuration",
            Probe::DatabaseConnectivity => "Database Connectivity",
            Probe::AuthenticationEndpoints => "Authentication Endpoints",
            Probe::VideoEndpoints => "Video Endpoints",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Probe::HealthCheck => "Testing Health Check Endpoint...",
            Probe::CorsConfiguration => "Testing CORS Configuration...",
            Probe::DatabaseConnectivity => "Testing Database Connectivity...",
            Probe::AuthenticationEndpoints => "Testing Authentication Endpoints...",
            Probe::VideoEndpoints => "Testing Video-Related Endpoints...",
        }
    }

    pub async fn run(self, ctx: &ProbeContext, transcript: &mut Transcript) -> ProbeResult {
        match self {
            Probe::HealthCheck => health::check_health(ctx, transcript).await,
            Probe::CorsConfiguration => cors::check_cors(ctx, transcript).await,
            Probe::DatabaseConnectivity => status::check_database(ctx, transcript).await,
            Probe::AuthenticationEndpoints => {
                discovery::check_auth_endpoints(ctx, transcript).await
            }
            Probe::VideoEndpoints => discovery::check_video_endpoints(ctx, transcript).await,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reads the body and rejects any status other than `expected`.
pub(crate) async fn expect_status(
    response: Response,
    expected: StatusCode,
) -> Result<String, ProbeError> {
    let status = response.status();
    let body = response.text().await?;
    if status != expected {
        return Err(ProbeError::UnexpectedStatus { status, body });
    }
    Ok(body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ProbeError> {
    serde_json::from_str(body).map_err(|e| ProbeError::Malformed(format!("{e}: {body}")))
}
