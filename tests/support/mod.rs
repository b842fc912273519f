//! In-process fake of the analysis backend
//!
//! Serves the four endpoints the client talks to on an ephemeral port, with
//! HTTP basic authentication and an in-memory user and upload table.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chemviz::{ApiClient, ClientConfig};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Number of entries the history endpoint returns
const HISTORY_LIMIT: usize = 5;

struct Upload {
    id: u64,
    owner: String,
    filename: String,
    date: String,
}

#[derive(Default)]
struct Backend {
    users: HashMap<String, String>,
    uploads: Vec<Upload>,
    next_id: u64,
    history_requests: usize,
}

type Shared = Arc<Mutex<Backend>>;

pub struct FakeBackend {
    base_url: String,
    state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend {
            next_id: 1,
            ..Backend::default()
        }));

        let app = Router::new()
            .route("/api/register/", post(register))
            .route("/api/history/", get(history))
            .route("/api/upload/", post(upload))
            .route("/api/pdf/:id/", get(report))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::from_config(ClientConfig::new(&self.base_url).unwrap()).unwrap()
    }

    pub fn add_user(&self, username: &str, password: &str) {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(username.to_string(), password.to_string());
    }

    /// Delete an account, so its next request gets a 401
    pub fn revoke(&self, username: &str) {
        self.state.lock().unwrap().users.remove(username);
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.state.lock().unwrap().users.contains_key(username)
    }

    pub fn history_requests(&self) -> usize {
        self.state.lock().unwrap().history_requests
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }
}

fn authenticate(headers: &HeaderMap, backend: &Backend) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    match backend.users.get(username) {
        Some(stored) if stored == password => Some(username.to_string()),
        _ => None,
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Invalid username/password."})),
    )
        .into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    username: Option<String>,
    password: Option<String>,
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"username": ["required"]}))).into_response();
    };
    let mut backend = state.lock().unwrap();
    if backend.users.contains_key(&username) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["A user with that username already exists."]})),
        )
            .into_response();
    }
    backend.users.insert(username, password);
    (
        StatusCode::CREATED,
        Json(json!({"message": "User created successfully"})),
    )
        .into_response()
}

async fn history(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = state.lock().unwrap();
    backend.history_requests += 1;
    let Some(user) = authenticate(&headers, &backend) else {
        return unauthorized();
    };

    let entries: Vec<Value> = backend
        .uploads
        .iter()
        .rev()
        .filter(|u| u.owner == user)
        .take(HISTORY_LIMIT)
        .map(|u| json!({"id": u.id, "filename": u.filename, "date": u.date}))
        .collect();
    Json(entries).into_response()
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let user = {
        let backend = state.lock().unwrap();
        authenticate(&headers, &backend)
    };
    let Some(user) = user else {
        return unauthorized();
    };

    let mut file = None;
    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("upload.csv").to_string();
            let Ok(bytes) = field.bytes().await else {
                break;
            };
            file = Some((name, bytes));
        }
    }
    let Some((filename, bytes)) = file else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "No file provided"}))).into_response();
    };

    let Some(mut analysis) = analyse(&bytes) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid CSV file"}))).into_response();
    };

    let mut backend = state.lock().unwrap();
    let id = backend.next_id;
    backend.next_id += 1;
    backend.uploads.push(Upload {
        id,
        owner: user,
        filename,
        date: chrono::Local::now().format("%Y-%m-%d %I:%M %p").to_string(),
    });
    analysis.insert("id".to_string(), json!(id));
    Json(Value::Object(analysis)).into_response()
}

/// Summary of an equipment CSV: averages of the numeric columns and a count
/// per `Type`
fn analyse(bytes: &[u8]) -> Option<Map<String, Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let header: Vec<String> = reader.headers().ok()?.iter().map(str::to_string).collect();
    let type_column = header.iter().position(|h| h == "Type")?;

    let mut sums = vec![0.0_f64; header.len()];
    let mut numeric = vec![true; header.len()];
    let mut distribution = Map::new();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.ok()?;
        let mut row = Map::new();
        for (i, cell) in record.iter().enumerate() {
            match cell.parse::<f64>() {
                Ok(v) => {
                    sums[i] += v;
                    row.insert(header[i].clone(), json!(v));
                }
                Err(_) => {
                    numeric[i] = false;
                    row.insert(header[i].clone(), json!(cell));
                }
            }
        }
        let bucket = distribution
            .entry(record.get(type_column)?.to_string())
            .or_insert(json!(0));
        *bucket = json!(bucket.as_u64().unwrap_or(0) + 1);
        rows.push(Value::Object(row));
    }

    let count = rows.len();
    let mut stats = Map::new();
    stats.insert("total_count".to_string(), json!(count));
    if count > 0 {
        for (i, name) in header.iter().enumerate() {
            if numeric[i] {
                stats.insert(
                    format!("avg_{}", name.to_lowercase()),
                    json!(sums[i] / count as f64),
                );
            }
        }
    }

    let mut analysis = Map::new();
    analysis.insert("stats".to_string(), Value::Object(stats));
    analysis.insert("distribution".to_string(), Value::Object(distribution));
    analysis.insert("data".to_string(), Value::Array(rows));
    Some(analysis)
}

async fn report(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    let backend = state.lock().unwrap();
    let Some(user) = authenticate(&headers, &backend) else {
        return unauthorized();
    };
    let Some(upload) = backend.uploads.iter().find(|u| u.id == id && u.owner == user) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"}))).into_response();
    };

    let pdf = format!("%PDF-1.4\n% Report for {}\n%%EOF\n", upload.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"report_{}.pdf\"", id),
            ),
        ],
        pdf,
    )
        .into_response()
}
