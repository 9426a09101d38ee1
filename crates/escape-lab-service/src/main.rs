use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use escape_lab_core::{AttemptRecord, LeaderboardSort, NewAttempt};
use escape_lab_store_csv::{CsvAttemptStore, StoreError};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EXPORT_FILE_NAME: &str = "leaderboard.csv";

#[derive(Debug, Clone)]
struct ServiceState {
    store: Arc<CsvAttemptStore>,
    telemetry: Arc<ServiceTelemetry>,
}

#[derive(Debug, Clone, Serialize)]
struct EntryCreated {
    success: bool,
    entry: AttemptRecord,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    success: bool,
    error: String,
}

#[derive(Debug, Clone)]
struct ServiceFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddEntryRequest {
    full_name: String,
    time_spent: u64,
    time_remaining: u64,
    money_lost: f64,
    hints_used: u64,
    grade: String,
    status: String,
    completed_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardQuery {
    sort_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    table: String,
    telemetry: ServiceTelemetrySnapshot,
}

#[derive(Debug, Default)]
#[allow(clippy::struct_field_names)]
struct ServiceTelemetry {
    requests_total: AtomicU64,
    requests_success_total: AtomicU64,
    requests_failure_total: AtomicU64,
    invalid_json_total: AtomicU64,
    validation_error_total: AtomicU64,
    write_failed_total: AtomicU64,
    read_failed_total: AtomicU64,
    internal_error_total: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[allow(clippy::struct_field_names)]
struct ServiceTelemetrySnapshot {
    requests_total: u64,
    requests_success_total: u64,
    requests_failure_total: u64,
    invalid_json_total: u64,
    validation_error_total: u64,
    write_failed_total: u64,
    read_failed_total: u64,
    internal_error_total: u64,
}

#[derive(Debug, Parser)]
#[command(name = "escape-lab-service")]
#[command(about = "Leaderboard HTTP service for the escape room")]
struct Args {
    #[arg(long, default_value = "./data/leaderboard.csv")]
    table: PathBuf,
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: SocketAddr,
    #[arg(long, default_value = ".")]
    static_dir: PathBuf,
    #[arg(long, default_value = "server.pid")]
    pid_file: PathBuf,
    #[arg(long)]
    no_pid_file: bool,
}

/// Process-identity file that lives exactly as long as the server.
#[derive(Debug)]
struct PidFile {
    path: PathBuf,
}

impl PidFile {
    fn create(path: PathBuf) -> Result<Self> {
        fs::write(&path, std::process::id().to_string())
            .with_context(|| format!("failed to write pid file {}", path.display()))?;
        Ok(Self { path })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "failed to remove pid file");
            }
        }
    }
}

impl From<AddEntryRequest> for NewAttempt {
    fn from(request: AddEntryRequest) -> Self {
        Self {
            name: request.full_name,
            time_spent_sec: request.time_spent,
            time_remaining_sec: request.time_remaining,
            money_lost: request.money_lost,
            hints_used: request.hints_used,
            grade: request.grade,
            status: request.status,
            completed_at: request.completed_at,
        }
    }
}

impl IntoResponse for ServiceFailure {
    fn into_response(self) -> Response {
        let payload = ServiceError { success: false, error: self.message };
        (self.status, Json(payload)).into_response()
    }
}

impl ServiceFailure {
    fn is_storage(&self) -> bool {
        matches!(self.code, "write_failed" | "read_failed")
    }
}

impl ServiceState {
    fn new(store: CsvAttemptStore) -> Self {
        Self { store: Arc::new(store), telemetry: Arc::new(ServiceTelemetry::default()) }
    }

    fn failure(status: StatusCode, code: &'static str, message: impl Into<String>) -> ServiceFailure {
        ServiceFailure { status, code, message: message.into() }
    }

    fn invalid_json_with_telemetry(&self, rejection: &JsonRejection) -> ServiceFailure {
        self.telemetry.requests_total.fetch_add(1, Ordering::Relaxed);
        self.telemetry.record_failure("invalid_json");
        Self::failure(StatusCode::BAD_REQUEST, "invalid_json", rejection.body_text())
    }

    fn validation_with_telemetry(&self, message: impl Into<String>) -> ServiceFailure {
        self.telemetry.requests_total.fetch_add(1, Ordering::Relaxed);
        self.telemetry.record_failure("validation_error");
        Self::failure(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    /// Maps a store error to a caller-facing failure. File paths and I/O
    /// details stay in the log.
    fn classify_store_error(operation_label: &'static str, err: &StoreError) -> ServiceFailure {
        match err {
            StoreError::Validation(inner) => {
                Self::failure(StatusCode::BAD_REQUEST, "validation_error", inner.to_string())
            }
            StoreError::Write { .. } => {
                error!(operation = operation_label, error = %err, "attempt table write failed");
                Self::failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "write_failed",
                    "failed to write to the attempt table",
                )
            }
            StoreError::Read { .. } | StoreError::Header { .. } => {
                error!(operation = operation_label, error = %err, "attempt table read failed");
                Self::failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "read_failed",
                    "failed to read the attempt table",
                )
            }
        }
    }

    async fn run_blocking<T, F>(&self, operation_label: &'static str, op: F) -> Result<T, ServiceFailure>
    where
        T: Send + 'static,
        F: FnOnce(&CsvAttemptStore) -> Result<T, StoreError> + Send + 'static,
    {
        self.telemetry.requests_total.fetch_add(1, Ordering::Relaxed);
        let store = Arc::clone(&self.store);
        let op_result = tokio::task::spawn_blocking(move || op(&store)).await.map_err(|err| {
            error!(operation = operation_label, error = %err, "blocking store task failed");
            self.telemetry.record_failure("internal_error");
            Self::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                format!("{operation_label} did not complete"),
            )
        })?;

        match op_result {
            Ok(value) => {
                self.telemetry.requests_success_total.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            Err(err) => {
                let failure = Self::classify_store_error(operation_label, &err);
                self.telemetry.record_failure(failure.code);
                Err(failure)
            }
        }
    }
}

impl ServiceTelemetry {
    fn record_failure(&self, code: &str) {
        self.requests_failure_total.fetch_add(1, Ordering::Relaxed);
        let counter = match code {
            "invalid_json" => &self.invalid_json_total,
            "validation_error" => &self.validation_error_total,
            "write_failed" => &self.write_failed_total,
            "read_failed" => &self.read_failed_total,
            _ => &self.internal_error_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ServiceTelemetrySnapshot {
        ServiceTelemetrySnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success_total: self.requests_success_total.load(Ordering::Relaxed),
            requests_failure_total: self.requests_failure_total.load(Ordering::Relaxed),
            invalid_json_total: self.invalid_json_total.load(Ordering::Relaxed),
            validation_error_total: self.validation_error_total.load(Ordering::Relaxed),
            write_failed_total: self.write_failed_total.load(Ordering::Relaxed),
            read_failed_total: self.read_failed_total.load(Ordering::Relaxed),
            internal_error_total: self.internal_error_total.load(Ordering::Relaxed),
        }
    }
}

fn app(state: ServiceState, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/entry", post(add_entry))
        .route("/api/all-entries", get(all_entries))
        .route("/api/download-csv", get(download_csv))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,escape_lab_service=info,escape_lab_store_csv=info")
        }))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let store = CsvAttemptStore::new(args.table.clone());
    store
        .ensure_initialized()
        .with_context(|| format!("failed to initialize attempt table {}", args.table.display()))?;

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    let _pid_file =
        if args.no_pid_file { None } else { Some(PidFile::create(args.pid_file.clone())?) };

    info!(
        table = %args.table.display(),
        static_dir = %args.static_dir.display(),
        pid = std::process::id(),
        bind = %args.bind,
        "escape room server starting"
    );

    axum::serve(listener, app(ServiceState::new(store), &args.static_dir))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("escape room server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}

/// Storage failures on listing routes degrade to an empty list.
fn or_empty(
    result: Result<Vec<AttemptRecord>, ServiceFailure>,
) -> Result<Json<Vec<AttemptRecord>>, ServiceFailure> {
    match result {
        Ok(records) => Ok(Json(records)),
        Err(failure) if failure.is_storage() => {
            warn!(code = failure.code, "serving empty listing after storage failure");
            Ok(Json(Vec::new()))
        }
        Err(failure) => Err(failure),
    }
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    let table = state
        .store
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Json(HealthResponse { status: "ok", table, telemetry: state.telemetry.snapshot() })
}

async fn leaderboard(
    State(state): State<ServiceState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Vec<AttemptRecord>>, ServiceFailure> {
    let Query(query) =
        query.map_err(|rejection| state.validation_with_telemetry(rejection.body_text()))?;
    let sort = match query.sort_by.as_deref() {
        None => LeaderboardSort::default(),
        Some(raw) => LeaderboardSort::parse(raw).ok_or_else(|| {
            state.validation_with_telemetry(format!(
                "unknown sortBy value `{raw}`; expected {}, {} or {}",
                LeaderboardSort::TimeSpent,
                LeaderboardSort::MoneyLost,
                LeaderboardSort::Grade
            ))
        })?,
    };

    or_empty(state.run_blocking("leaderboard", move |store| store.leaderboard(sort)).await)
}

async fn add_entry(
    State(state): State<ServiceState>,
    payload: Result<Json<AddEntryRequest>, JsonRejection>,
) -> Result<Json<EntryCreated>, ServiceFailure> {
    let Json(request) =
        payload.map_err(|rejection| state.invalid_json_with_telemetry(&rejection))?;
    let entry = state
        .run_blocking("add_entry", move |store| store.append_record(NewAttempt::from(request)))
        .await?;
    Ok(Json(EntryCreated { success: true, entry }))
}

async fn all_entries(
    State(state): State<ServiceState>,
) -> Result<Json<Vec<AttemptRecord>>, ServiceFailure> {
    or_empty(state.run_blocking("all_entries", CsvAttemptStore::all_entries).await)
}

async fn download_csv(State(state): State<ServiceState>) -> Result<Response, ServiceFailure> {
    let bytes = state.run_blocking("download_csv", CsvAttemptStore::export_bytes).await?;
    let file_name = state
        .store
        .path()
        .file_name()
        .map_or_else(|| EXPORT_FILE_NAME.to_string(), |name| name.to_string_lossy().into_owned());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const HEADER_LINE: &str =
        "ID,Name,Time Spent (sec),Time Remaining (sec),Money Lost,Hints Used,Grade,Status,Completed At\r\n";

    fn unique_temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("escape-lab-service-{}", ulid::Ulid::new()));
        if let Err(err) = fs::create_dir_all(&dir) {
            panic!("failed to create temp dir: {err}");
        }
        dir
    }

    struct Fixture {
        dir: PathBuf,
        state: ServiceState,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = unique_temp_dir();
            let state = ServiceState::new(CsvAttemptStore::new(dir.join("data/leaderboard.csv")));
            Self { dir, state }
        }

        fn with_store_path(path: PathBuf) -> Self {
            Self { dir: unique_temp_dir(), state: ServiceState::new(CsvAttemptStore::new(path)) }
        }

        async fn send(&self, request: Request<Body>) -> Response {
            match app(self.state.clone(), &self.dir).oneshot(request).await {
                Ok(response) => response,
                Err(err) => panic!("router request failed: {err}"),
            }
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(build(Request::builder().uri(uri).method("GET").body(Body::empty())))
                .await
        }

        async fn post_entry(&self, payload: &Value) -> Response {
            self.send(build(
                Request::builder()
                    .uri("/api/entry")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string())),
            ))
            .await
        }
    }

    fn build(result: http::Result<Request<Body>>) -> Request<Body> {
        result.unwrap_or_else(|err| panic!("failed to build request: {err}"))
    }

    async fn response_text(response: Response) -> String {
        let bytes = match to_bytes(response.into_body(), 1024 * 1024).await {
            Ok(bytes) => bytes,
            Err(err) => panic!("failed to read response body: {err}"),
        };
        match String::from_utf8(bytes.to_vec()) {
            Ok(body) => body,
            Err(err) => panic!("response body is not UTF-8: {err}"),
        }
    }

    async fn response_json(response: Response) -> Value {
        let body = response_text(response).await;
        match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => panic!("response body is not JSON: {err}; body={body}"),
        }
    }

    fn entry_payload(name: &str, time_spent: u64, status: &str) -> Value {
        json!({
            "fullName": name,
            "timeSpent": time_spent,
            "timeRemaining": 0,
            "moneyLost": 0,
            "hintsUsed": 2,
            "grade": "A",
            "status": status,
            "completedAt": "2024-01-01T10:00:00Z"
        })
    }

    fn names(value: &Value) -> Vec<String> {
        match value.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str).map(str::to_string))
                .collect(),
            None => panic!("expected JSON array, got {value}"),
        }
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let fixture = Fixture::new();

        let response = fixture.get("/api/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value.get("status").and_then(Value::as_str), Some("ok"));
        assert_eq!(value.get("table").and_then(Value::as_str), Some("leaderboard.csv"));
    }

    #[tokio::test]
    async fn posted_entry_is_echoed_with_assigned_id() {
        let fixture = Fixture::new();

        let response = fixture.post_entry(&entry_payload("Ana", 300, "completed")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["entry"]["name"], json!("Ana"));
        assert_eq!(value["entry"]["timeSpent"], json!(300));
        assert_eq!(value["entry"]["hintsUsed"], json!(2));
        assert_eq!(value["entry"]["completedAt"], json!("2024-01-01T10:00:00Z"));
        assert!(value["entry"]["id"].as_i64().is_some_and(|id| id > 0));

        let all = response_json(fixture.get("/api/all-entries").await).await;
        assert_eq!(all, json!([value["entry"].clone()]));
    }

    #[tokio::test]
    async fn leaderboard_ranks_fastest_completion_first() {
        let fixture = Fixture::new();
        fixture.post_entry(&entry_payload("Ana", 300, "completed")).await;
        fixture.post_entry(&entry_payload("Ben", 200, "completed")).await;

        let response = fixture.get("/api/leaderboard").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(names(&response_json(response).await), vec!["Ben", "Ana"]);
    }

    #[tokio::test]
    async fn failed_attempt_is_only_in_all_entries() {
        let fixture = Fixture::new();
        fixture.post_entry(&entry_payload("Ana", 300, "completed")).await;
        fixture.post_entry(&entry_payload("Cleo", 100, "failed")).await;

        let leaderboard = response_json(fixture.get("/api/leaderboard").await).await;
        assert_eq!(names(&leaderboard), vec!["Ana"]);

        let all = response_json(fixture.get("/api/all-entries").await).await;
        assert_eq!(names(&all), vec!["Ana", "Cleo"]);
    }

    #[tokio::test]
    async fn leaderboard_supports_money_sort_and_rejects_unknown_keys() {
        let fixture = Fixture::new();
        let mut costly = entry_payload("Ana", 100, "completed");
        costly["moneyLost"] = json!(9000.5);
        fixture.post_entry(&costly).await;
        fixture.post_entry(&entry_payload("Ben", 400, "completed")).await;

        let by_money = response_json(fixture.get("/api/leaderboard?sortBy=moneyLost").await).await;
        assert_eq!(names(&by_money), vec!["Ben", "Ana"]);

        let response = fixture.get("/api/leaderboard?sortBy=fastest").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value = response_json(response).await;
        assert_eq!(value["success"], json!(false));
        assert!(value["error"]
            .as_str()
            .is_some_and(|error| error.contains("timeSpent, moneyLost or grade")));
    }

    #[tokio::test]
    async fn malformed_query_string_uses_failure_envelope() {
        let fixture = Fixture::new();

        let response = fixture.get("/api/leaderboard?sortBy=grade&sortBy=moneyLost").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let value = response_json(response).await;
        assert_eq!(value["success"], json!(false));
        assert!(value["error"].as_str().is_some_and(|error| !error.is_empty()));

        let health = response_json(fixture.get("/api/health").await).await;
        assert_eq!(health["telemetry"]["validation_error_total"], json!(1));
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let fixture = Fixture::new();
        let mut payload = entry_payload("Ana", 300, "completed");
        if let Some(object) = payload.as_object_mut() {
            object.remove("grade");
        }

        let response = fixture.post_entry(&payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let value = response_json(response).await;
        assert_eq!(value["success"], json!(false));
        assert!(value["error"].as_str().is_some_and(|error| error.contains("grade")));

        let all = response_json(fixture.get("/api/all-entries").await).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn blank_name_is_a_validation_error() {
        let fixture = Fixture::new();

        let response = fixture.post_entry(&entry_payload("   ", 300, "completed")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let health = response_json(fixture.get("/api/health").await).await;
        assert_eq!(health["telemetry"]["validation_error_total"], json!(1));
    }

    #[tokio::test]
    async fn write_failure_hides_internal_paths() {
        let table_dir = unique_temp_dir();
        let fixture = Fixture::with_store_path(table_dir.clone());

        let response = fixture.post_entry(&entry_payload("Ana", 300, "completed")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let value = response_json(response).await;
        assert_eq!(value["success"], json!(false));
        let error = value["error"].as_str().unwrap_or_default();
        assert!(!error.is_empty());
        assert!(!error.contains(&table_dir.display().to_string()));
    }

    #[tokio::test]
    async fn unreadable_table_serves_empty_listings() {
        let fixture = Fixture::new();
        let table = fixture.state.store.path().to_path_buf();
        if let Some(parent) = table.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                panic!("failed to create table dir: {err}");
            }
        }
        if let Err(err) = fs::write(&table, "not,a,leaderboard\r\n1,2,3\r\n") {
            panic!("failed to seed table: {err}");
        }

        let leaderboard = fixture.get("/api/leaderboard").await;
        assert_eq!(leaderboard.status(), StatusCode::OK);
        assert_eq!(response_json(leaderboard).await, json!([]));

        let all = fixture.get("/api/all-entries").await;
        assert_eq!(all.status(), StatusCode::OK);
        assert_eq!(response_json(all).await, json!([]));
    }

    #[tokio::test]
    async fn download_returns_table_as_attachment() {
        let fixture = Fixture::new();
        fixture.post_entry(&entry_payload("Ana", 300, "completed")).await;

        let response = fixture.get("/api/download-csv").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).and_then(|v| v.to_str().ok()),
            Some("attachment; filename=\"leaderboard.csv\"")
        );

        let body = response_text(response).await;
        assert!(body.starts_with(HEADER_LINE));
        assert!(body.contains(",Ana,300,0,0,2,A,completed,2024-01-01T10:00:00Z\r\n"));
    }

    #[tokio::test]
    async fn static_assets_are_served_from_root() {
        let fixture = Fixture::new();
        if let Err(err) = fs::write(fixture.dir.join("index.html"), "<h1>Escape Lab</h1>") {
            panic!("failed to write index.html: {err}");
        }

        let response = fixture.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response_text(response).await.contains("Escape Lab"));
    }

    #[tokio::test]
    async fn cross_origin_requests_are_allowed() {
        let fixture = Fixture::new();

        let response = fixture
            .send(build(
                Request::builder()
                    .uri("/api/leaderboard")
                    .method("GET")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty()),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[test]
    fn pid_file_is_removed_on_drop() {
        let path = unique_temp_dir().join("server.pid");
        let pid_file = match PidFile::create(path.clone()) {
            Ok(pid_file) => pid_file,
            Err(err) => panic!("failed to create pid file: {err}"),
        };

        let contents = fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(contents, std::process::id().to_string());

        drop(pid_file);
        assert!(!path.exists());
    }
}
