use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Request, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Counts every request the server receives.
#[derive(Debug, Default)]
pub struct Recorder {
    hits: AtomicUsize,
}

impl Recorder {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// What `/echo/...` saw of the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Echo {
    /// Every value received for `name`, in arrival order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// What `/upload/...` decoded from a multipart body.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UploadReport {
    pub path: String,
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

/// Deterministic payload served by `/files/{path}`.
pub fn file_contents(path: &str) -> Vec<u8> {
    (0..64 * 1024).map(|i| ((i + path.len()) % 251) as u8).collect()
}

pub fn app() -> Router {
    app_with_recorder(Arc::new(Recorder::default()))
}

pub fn app_with_recorder(recorder: Arc<Recorder>) -> Router {
    Router::new()
        .route("/echo/", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/status/{code}", any(status))
        .route("/slow/{millis}", get(slow))
        .route("/files/{*path}", get(file))
        .route("/upload/", post(upload))
        .route("/upload/{*rest}", post(upload))
        .layer(middleware::from_fn_with_state(recorder, count_hits))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_recorder(
    listener: TcpListener,
    recorder: Arc<Recorder>,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_recorder(recorder)).await
}

async fn count_hits(State(recorder): State<Arc<Recorder>>, request: Request, next: Next) -> Response {
    recorder.hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "invalid status").into_response(),
    }
}

async fn slow(Path(millis): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "done"
}

async fn file(Path(path): Path<String>) -> Vec<u8> {
    file_contents(&path)
}

async fn upload(uri: Uri, mut multipart: Multipart) -> Result<Json<UploadReport>, (StatusCode, String)> {
    let mut report = UploadReport {
        path: uri.path().to_string(),
        ..UploadReport::default()
    };
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        match file_name {
            Some(file_name) => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let content = field.bytes().await.map_err(bad_request)?;
                report.files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    content: content.to_vec(),
                });
            }
            None => {
                let value = field.text().await.map_err(bad_request)?;
                report.fields.push((name, value));
            }
        }
    }
    Ok(Json(report))
}

fn bad_request(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}
