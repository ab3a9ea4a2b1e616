//! HTTP server exposing the import pipeline.
//!
//! # API Endpoints
//!
//! | Method | Path                          | Description                         |
//! |--------|-------------------------------|-------------------------------------|
//! | GET    | `/health`                     | Health check, branding and theme    |
//! | GET    | `/api/templates/{kind}`       | Download import template            |
//! | POST   | `/api/import/{kind}/preview`  | Decode + validate an uploaded file  |
//! | POST   | `/api/import/{kind}`          | Decode + validate + submit rows     |
//! | GET    | `/api/logs`                   | SSE stream of import progress       |

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{RunLog, LOG_BROADCASTER};
use super::types::{blocked_response, error_response, ImportResponse, PreviewResponse};
use crate::client::ApiClient;
use crate::config::AppConfig;
use crate::error::{ImportError, ServerError};
use crate::import::Importer;
use crate::models::{ExternalRefs, RowMapping};
use crate::parser::{decode, FileKind};
use crate::records::RecordKind;
use crate::template::{emit_template, file_name, TemplateFormat};
use crate::validation::validate;

type HandlerError = (StatusCode, Json<Value>);

/// Shared state: immutable config, collaborator client, and the single
/// importer that serialises runs.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: ApiClient,
    pub importer: Arc<Importer>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let client = ApiClient::new(&config.api)?;
        Ok(Self {
            config: Arc::new(config),
            client,
            importer: Arc::new(Importer::new()),
        })
    }
}

/// Build the router; split from [`start_server`] so tests can bind it.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/templates/{kind}", get(download_template))
        .route("/api/import/{kind}/preview", post(preview_import))
        .route("/api/import/{kind}", post(run_import))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server and serve until the process stops.
pub async fn start_server(config: AppConfig) -> Result<(), ServerError> {
    let port = config.server.port;
    let upstream = config.api.base_url.clone();
    let app = router(AppState::new(config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, %upstream, "vista import server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "vista",
        "version": env!("CARGO_PKG_VERSION"),
        "importState": state.importer.state(),
        "branding": state.config.branding,
        "theme": state.config.theme,
        "endpoints": {
            "template": "GET /api/templates/{kind}",
            "preview": "POST /api/import/{kind}/preview",
            "import": "POST /api/import/{kind}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for import progress
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers just skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[derive(Debug, Deserialize)]
struct TemplateQuery {
    format: Option<String>,
}

async fn download_template(
    Path(kind): Path<String>,
    Query(query): Query<TemplateQuery>,
) -> Result<Response, HandlerError> {
    let kind = parse_kind(&kind)?;
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<TemplateFormat>().map_err(bad_request)?,
        None => TemplateFormat::default(),
    };

    let bytes = emit_template(kind, format).map_err(|e| {
        tracing::error!(error = %e, "template generation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&e.to_string())))
    })?;

    let disposition = format!("attachment; filename=\"{}\"", file_name(kind, format));
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn preview_import(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, HandlerError> {
    let kind = parse_kind(&kind)?;
    let (rows, refs) = load_upload(&state, kind, multipart).await?;

    let errors = validate(&rows, kind, &refs);
    let response = PreviewResponse::new(Uuid::new_v4().to_string(), kind, &rows, errors);

    tracing::info!(
        %kind,
        rows = response.row_count,
        errors = response.errors.len(),
        "preview"
    );
    Ok(Json(response))
}

async fn run_import(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Json<ImportResponse>, HandlerError> {
    let kind = parse_kind(&kind)?;
    let (rows, refs) = load_upload(&state, kind, multipart).await?;

    let job_id = Uuid::new_v4().to_string();
    let log = RunLog::new(job_id.clone());

    let result = state
        .importer
        .run_logged(&rows, kind, &refs, &state.client, &log)
        .await
        .map_err(import_failure)?;

    Ok(Json(ImportResponse::new(job_id, kind, result)))
}

/// Read the `file` field, gate its type, decode it and snapshot categories.
async fn load_upload(
    state: &AppState,
    kind: RecordKind,
    mut multipart: Multipart,
) -> Result<(Vec<RowMapping>, ExternalRefs), HandlerError> {
    let mut upload: Option<(FileKind, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        bad_request(format!("Multipart error: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_kind = match (field.content_type(), field.file_name()) {
            (Some(mime), _) if mime != "application/octet-stream" => FileKind::from_mime(mime),
            (_, Some(name)) => FileKind::from_path(std::path::Path::new(name)),
            (mime, None) => FileKind::from_mime(mime.unwrap_or("")),
        }
        .map_err(|e| import_failure(e.into()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("Read error: {}", e)))?;
        upload = Some((file_kind, bytes.to_vec()));
    }

    let (file_kind, bytes) = upload.ok_or_else(|| bad_request("No file provided"))?;
    tracing::info!(%kind, ?file_kind, bytes = bytes.len(), "upload received");

    let rows = decode(&bytes, file_kind).map_err(|e| import_failure(e.into()))?;

    let refs = if kind.needs_categories() {
        state
            .client
            .category_refs()
            .await
            .map_err(|e| import_failure(e.into()))?
    } else {
        ExternalRefs::default()
    };

    Ok((rows, refs))
}

fn parse_kind(raw: &str) -> Result<RecordKind, HandlerError> {
    raw.parse::<RecordKind>()
        .map_err(|e| (StatusCode::NOT_FOUND, Json(error_response(&e))))
}

fn bad_request(message: impl AsRef<str>) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(error_response(message.as_ref())))
}

fn import_failure(err: ImportError) -> HandlerError {
    match err {
        ImportError::Blocked(errors) => (StatusCode::UNPROCESSABLE_ENTITY, Json(blocked_response(&errors))),
        ImportError::AlreadyRunning => (StatusCode::CONFLICT, Json(error_response(&err.to_string()))),
        ImportError::Unsupported(e) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(error_response(&e.to_string()))),
        ImportError::Decode(e) => {
            let message = format!("Failed to parse file. Please check the format. ({})", e);
            (StatusCode::UNPROCESSABLE_ENTITY, Json(error_response(&message)))
        }
        ImportError::Api(e) => {
            tracing::error!(error = %e, "category lookup failed");
            (StatusCode::BAD_GATEWAY, Json(error_response(&format!("Cannot reach the backend: {}", e))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::models::Category;
    use reqwest::multipart::{Form, Part};
    use std::sync::Mutex;

    /// Fake collaborator: two categories, accepts every POI except "Broken".
    async fn spawn_upstream(created: Arc<Mutex<usize>>) -> String {
        async fn categories() -> Json<Vec<Category>> {
            Json(vec![Category { id: 1, name: "Library".into() }])
        }

        async fn create(State(created): State<Arc<Mutex<usize>>>, mut multipart: Multipart) -> StatusCode {
            let mut name = String::new();
            while let Ok(Some(field)) = multipart.next_field().await {
                if field.name() == Some("name") {
                    name = field.text().await.unwrap_or_default();
                }
            }
            *created.lock().unwrap() += 1;
            if name == "Broken" {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::CREATED
            }
        }

        let app = Router::new()
            .route("/categories", get(categories))
            .route("/pois", post(create))
            .with_state(created);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    async fn spawn_app(upstream: String) -> String {
        let mut config = AppConfig::default();
        config.api = ApiConfig {
            base_url: upstream,
            timeout: Duration::from_secs(5),
        };
        let app = router(AppState::new(config).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    fn csv_form(body: &str, mime: &str) -> Form {
        named_form(body, "pois.csv", mime)
    }

    fn named_form(body: &str, file_name: &str, mime: &str) -> Form {
        let part = Part::bytes(body.as_bytes().to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime)
            .unwrap();
        Form::new().part("file", part)
    }

    const HEADER: &str = "Name*,Description*,Category*,Latitude*,Longitude*,Image URLs (comma separated)\n";

    #[tokio::test]
    async fn test_preview_reports_errors() {
        let created = Arc::new(Mutex::new(0));
        let app = spawn_app(spawn_upstream(created.clone()).await).await;
        let body = format!("{}Ok,Fine,library,1,1,\n,Missing name,Park,95,1,\n", HEADER);

        let response: Value = reqwest::Client::new()
            .post(format!("{}/api/import/poi/preview", app))
            .multipart(csv_form(&body, "text/csv"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(response["status"], "invalid");
        assert_eq!(response["rowCount"], 2);
        assert_eq!(
            response["errorMessages"],
            json!([
                "Row 3: Name* is required",
                "Row 3: Category \"Park\" not found. Available: Library",
                "Row 3: Invalid latitude. Must be between -90 and 90"
            ])
        );
        assert_eq!(*created.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_counts_partial_failures() {
        let created = Arc::new(Mutex::new(0));
        let app = spawn_app(spawn_upstream(created.clone()).await).await;
        let body = format!("{}A,x,Library,1,1,\nBroken,x,Library,1,1,\nC,x,Library,1,1,\n", HEADER);

        let response = reqwest::Client::new()
            .post(format!("{}/api/import/poi", app))
            .multipart(csv_form(&body, "text/csv"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "completed_with_errors");
        assert_eq!(body["result"]["succeeded"], 2);
        assert_eq!(body["result"]["failed"], 1);
        assert_eq!(body["result"]["failureMessages"], json!(["Row 2: Broken - Import failed"]));
        assert_eq!(*created.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_import_blocked_by_validation() {
        let created = Arc::new(Mutex::new(0));
        let app = spawn_app(spawn_upstream(created.clone()).await).await;
        let body = format!("{}A,x,Library,1,1,\nB,x,Library,1,200,\n", HEADER);

        let response = reqwest::Client::new()
            .post(format!("{}/api/import/poi", app))
            .multipart(csv_form(&body, "text/csv"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 422);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "blocked");
        assert_eq!(*created.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_unsupported_mime() {
        let app = spawn_app("http://127.0.0.1:9".into()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/import/event/preview", app))
            .multipart(csv_form("Title*\nx\n", "application/pdf"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 415);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Please select a valid Excel (.xlsx, .xls) or CSV file");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_bad_request() {
        let app = spawn_app("http://127.0.0.1:9".into()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/import/event/preview", app))
            .multipart(Form::new().text("note", "no attachment"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_octet_stream_falls_back_to_extension() {
        let app = spawn_app("http://127.0.0.1:9".into()).await;
        let body = "Title*,Description*,Location*,Start Date*,End Date*\n\
                    Gala,Evening,Main Hall,2024-01-15 10:00:00,2024-01-15 12:00:00\n";
        let client = reqwest::Client::new();

        let accepted: Value = client
            .post(format!("{}/api/import/event/preview", app))
            .multipart(named_form(body, "events.csv", "application/octet-stream"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(accepted["status"], "ready");
        assert_eq!(accepted["rowCount"], 1);

        let rejected = client
            .post(format!("{}/api/import/event/preview", app))
            .multipart(named_form(body, "events.pdf", "application/octet-stream"))
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status(), 415);
    }

    #[tokio::test]
    async fn test_template_download() {
        let app = spawn_app("http://127.0.0.1:9".into()).await;

        let response = reqwest::get(format!("{}/api/templates/event?format=csv", app))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"event_import_template.csv\""
        );

        let text = response.text().await.unwrap();
        assert!(text.starts_with("Title*,Description*"));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_found() {
        let app = spawn_app("http://127.0.0.1:9".into()).await;
        let response = reqwest::get(format!("{}/api/templates/venues", app)).await.unwrap();
        assert_eq!(response.status(), 404);
    }
}
