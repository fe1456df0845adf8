//! Database connectivity, checked through the status-record endpoints.
//!
//! A record is written with `POST /status` and must show up in the list
//! returned by `GET /status`. Records are never updated or deleted here.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::debug;
use ulid::Ulid;

use super::{ProbeContext, ProbeError, ProbeResult, Transcript, expect_status, parse_json};

/// Only `id` is required. Ids are compared as JSON values, so string and
/// numeric ids both work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: Value,
    #[serde(default)]
    pub client_name: Option<Value>,
    /// Server-assigned, kept as the backend formats it.
    #[serde(default)]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct StatusCreate<'a> {
    pub client_name: &'a str,
}

/// `test_client_<YYYYMMDD_HHMMSS>_<ulid>`, unique per call.
pub fn generate_client_name() -> String {
    let stamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .unwrap_or_default();
    format!("test_client_{stamp}_{}", Ulid::new())
}

pub async fn create_status(
    ctx: &ProbeContext,
    client_name: &str,
) -> Result<StatusRecord, ProbeError> {
    let url = ctx.target.endpoint("/status");
    debug!("POST {url} client_name={client_name}");
    let response = ctx
        .client
        .post(&url)
        .json(&StatusCreate { client_name })
        .timeout(ctx.request_timeout)
        .send()
        .await?;
    let body = expect_status(response, StatusCode::OK).await?;
    parse_created(&body)
}

/// A missing `id` deserializes as `null`, so it is rejected here.
fn parse_created(body: &str) -> Result<StatusRecord, ProbeError> {
    let record: StatusRecord = parse_json(body)?;
    if record.id.is_null() {
        return Err(ProbeError::Malformed(format!("no \"id\" in {body}")));
    }
    Ok(record)
}

/// Records stay untyped so one odd stored record cannot fail the whole list.
pub async fn list_status(ctx: &ProbeContext) -> Result<Vec<Value>, ProbeError> {
    let url = ctx.target.endpoint("/status");
    debug!("GET {url}");
    let response = ctx
        .client
        .get(&url)
        .timeout(ctx.request_timeout)
        .send()
        .await?;
    let body = expect_status(response, StatusCode::OK).await?;
    parse_json(&body)
}

/// Number of listed records whose `id` equals `id`.
pub fn count_with_id(records: &[Value], id: &Value) -> usize {
    records
        .iter()
        .filter(|record| record.get("id") == Some(id))
        .count()
}

pub async fn check_database(ctx: &ProbeContext, transcript: &mut Transcript) -> ProbeResult {
    let client_name = generate_client_name();

    let created = create_status(ctx, &client_name)
        .await
        .inspect_err(|_| transcript.push("Database write operation failed"))?;
    transcript.push(format!("Created Status: {created:?}"));

    let records = list_status(ctx)
        .await
        .inspect_err(|_| transcript.push("Database read operation failed"))?;
    transcript.push(format!("Retrieved {} status records", records.len()));

    if count_with_id(&records, &created.id) > 0 {
        transcript.push("Read/Write operations successful");
        Ok(())
    } else {
        Err(ProbeError::Assertion(format!(
            "created record {} not found in status list",
            created.id
        )))
    }
}
