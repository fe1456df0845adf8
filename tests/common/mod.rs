#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::get,
};
use backend_smoke::{ProbeContext, RunConfig, Target};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::Level;
use ulid::Ulid;

pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_level(true)
        .with_max_level(Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Copy)]
pub enum HealthBody {
    Message(&'static str),
    /// JSON without a `message` field
    NoMessage,
    NotJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cors {
    Permissive,
    /// Preflight answers 204 without any CORS headers.
    Missing,
    /// Preflight answers 405 but still sends `Access-Control-Allow-Origin`.
    Rejected,
}

/// Shape of the fake backend the probes are run against.
#[derive(Debug, Clone)]
pub struct MockBackend {
    pub health_status: StatusCode,
    pub health_body: HealthBody,
    pub cors: Cors,
    /// When false, created status records are not kept.
    pub persist: bool,
    /// Integer ids and unix timestamps instead of strings.
    pub numeric_fields: bool,
    /// Records already stored before the run.
    pub seeded: Vec<Value>,
    pub auth_routes: bool,
    pub video_routes: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend {
            health_status: StatusCode::OK,
            health_body: HealthBody::Message("Hello World"),
            cors: Cors::Permissive,
            persist: true,
            numeric_fields: false,
            seeded: Vec::new(),
            auth_routes: false,
            video_routes: false,
        }
    }
}

#[derive(Clone)]
struct Store {
    records: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<AtomicU64>,
    persist: bool,
    numeric_fields: bool,
}

async fn create_record(
    State(store): State<Store>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(client_name) = body.get("client_name").and_then(Value::as_str) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "client_name is required"})),
        );
    };
    let now = OffsetDateTime::now_utc();
    let record = if store.numeric_fields {
        json!({
            "id": store.next_id.fetch_add(1, Ordering::Relaxed),
            "client_name": client_name,
            "timestamp": now.unix_timestamp(),
        })
    } else {
        json!({
            "id": Ulid::new().to_string(),
            "client_name": client_name,
            "timestamp": now.format(&Rfc3339).unwrap(),
        })
    };
    if store.persist {
        store.records.lock().await.push(record.clone());
    }
    (StatusCode::OK, Json(record))
}

async fn list_records(State(store): State<Store>) -> Json<Value> {
    Json(Value::Array(store.records.lock().await.clone()))
}

pub struct MockServer {
    pub origin: String,
    handle: JoinHandle<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns the mock backend on an ephemeral port.
/// The listener is bound before returning, so requests never race the server.
pub async fn spawn_backend(mock: MockBackend) -> MockServer {
    let listener = tokio::net::TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();

    let MockBackend {
        health_status,
        health_body,
        ..
    } = mock;
    let mut root = get(move || async move {
        match health_body {
            HealthBody::Message(message) => {
                (health_status, Json(json!({ "message": message }))).into_response()
            }
            HealthBody::NoMessage => {
                (health_status, Json(json!({ "status": "ok" }))).into_response()
            }
            HealthBody::NotJson => (health_status, "Hello World").into_response(),
        }
    });
    match mock.cors {
        Cors::Permissive => {}
        Cors::Missing => root = root.options(|| async { StatusCode::NO_CONTENT }),
        Cors::Rejected => {
            root = root.options(|| async {
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
                )
            })
        }
    }

    let mut router = Router::new()
        .route("/api/", root)
        .route("/api/status", get(list_records).post(create_record));
    if mock.auth_routes {
        router = router
            .route(
                "/api/auth/login",
                get(|| async { StatusCode::METHOD_NOT_ALLOWED }),
            )
            .route("/api/login", get(|| async { "login" }));
    }
    if mock.video_routes {
        router = router.route("/api/videos", get(|| async { Json(json!([])) }));
    }
    if mock.cors == Cors::Permissive {
        router = router.layer(ServiceBuilder::new().layer(CorsLayer::permissive()));
    }
    let app = router.with_state(Store {
        records: Arc::new(Mutex::new(mock.seeded.clone())),
        next_id: Arc::new(AtomicU64::new(1)),
        persist: mock.persist,
        numeric_fields: mock.numeric_fields,
    });

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockServer {
        origin: format!("http://127.0.0.1:{port}"),
        handle,
    }
}

/// An origin nothing is listening on.
pub async fn unused_origin() -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn test_config(origin: &str) -> RunConfig {
    RunConfig {
        base_url: Some(origin.to_string()),
        request_timeout: Duration::from_secs(5),
        discovery_timeout: Duration::from_secs(2),
        ..RunConfig::default()
    }
}

pub fn probe_context(origin: &str) -> ProbeContext {
    ProbeContext::new(Target::new(origin), &test_config(origin)).unwrap()
}
