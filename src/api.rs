//! Backend endpoints and the transport seam
//!
//! [`ApiClient`] knows the endpoint table and how to classify responses;
//! [`Transport`] only moves bytes. Production code uses [`ReqwestTransport`],
//! tests plug in scripted transports.

use crate::config::ClientConfig;
use crate::credentials::BasicAuth;
use crate::error::{ClientError, Result};
use crate::models::{AnalysisResult, HistoryEntry, RegisterRequest, SelectedFile, UploadId};
use async_trait::async_trait;
use log::debug;
use secrecy::ExposeSecret;
use std::fmt;
use std::sync::Arc;

pub const HISTORY_PATH: &str = "/api/history/";
pub const REGISTER_PATH: &str = "/api/register/";
pub const UPLOAD_PATH: &str = "/api/upload/";

/// Multipart field the upload endpoint reads the file from
pub const UPLOAD_FIELD: &str = "file";

pub fn report_path(id: UploadId) -> String {
    format!("/api/pdf/{}/", id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart {
        field: &'static str,
        file: SelectedFile,
    },
}

/// A request relative to the configured base URL
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub auth: Option<BasicAuth>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Moves one request to the backend and returns whatever came back
///
/// Implementations report only failures to get a response at all; status
/// codes are interpreted by [`ApiClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.config.endpoint_url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if let Some(auth) = &request.auth {
            builder = builder.basic_auth(&auth.username, Some(auth.password.expose_secret()));
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { field, file } => {
                let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
                builder.multipart(reqwest::multipart::Form::new().part(field, part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// One backend operation, as requested by a workflow
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    LoginProbe,
    Register,
    FetchHistory,
    Upload(SelectedFile),
    FetchReport(UploadId),
}

impl ApiCall {
    pub fn kind(&self) -> CallKind {
        match self {
            ApiCall::LoginProbe => CallKind::LoginProbe,
            ApiCall::Register => CallKind::Register,
            ApiCall::FetchHistory => CallKind::FetchHistory,
            ApiCall::Upload(_) => CallKind::Upload,
            ApiCall::FetchReport(id) => CallKind::FetchReport(*id),
        }
    }
}

/// An [`ApiCall`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    LoginProbe,
    Register,
    FetchHistory,
    Upload,
    FetchReport(UploadId),
}

impl CallKind {
    /// The outcome of a call of this kind that failed with `err`
    pub fn failed(self, err: ClientError) -> ApiOutcome {
        match self {
            CallKind::LoginProbe => ApiOutcome::LoginProbe(Err(err)),
            CallKind::Register => ApiOutcome::Register(Err(err)),
            CallKind::FetchHistory => ApiOutcome::History(Err(err)),
            CallKind::Upload => ApiOutcome::Upload(Err(err)),
            CallKind::FetchReport(id) => ApiOutcome::Report { id, result: Err(err) },
        }
    }
}

/// Result of an [`ApiCall`], fed back into the reducer
#[derive(Debug)]
pub enum ApiOutcome {
    LoginProbe(Result<()>),
    Register(Result<()>),
    History(Result<Vec<HistoryEntry>>),
    Upload(Result<AnalysisResult>),
    Report { id: UploadId, result: Result<Vec<u8>> },
}

/// Typed access to the backend endpoints
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client over a fresh [`ReqwestTransport`]
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Run a workflow call with the credentials captured for it
    pub async fn call(&self, call: ApiCall, auth: Option<BasicAuth>) -> ApiOutcome {
        match call {
            ApiCall::LoginProbe => ApiOutcome::LoginProbe(self.probe_login(auth).await),
            ApiCall::Register => ApiOutcome::Register(match auth {
                Some(auth) => self.register(&auth).await,
                None => Err(ClientError::Status {
                    status: 400,
                    body: "missing username or password".to_string(),
                }),
            }),
            ApiCall::FetchHistory => ApiOutcome::History(self.fetch_history(auth).await),
            ApiCall::Upload(file) => ApiOutcome::Upload(self.upload(auth, file).await),
            ApiCall::FetchReport(id) => ApiOutcome::Report {
                id,
                result: self.fetch_report(auth, id).await,
            },
        }
    }

    /// Check credentials against a protected endpoint
    ///
    /// The history listing is used as the probe; its body is discarded.
    pub async fn probe_login(&self, auth: Option<BasicAuth>) -> Result<()> {
        self.execute(Method::Get, HISTORY_PATH.to_string(), auth, RequestBody::Empty)
            .await
            .map(|_| ())
    }

    pub async fn register(&self, auth: &BasicAuth) -> Result<()> {
        let body = serde_json::to_value(RegisterRequest {
            username: &auth.username,
            password: auth.password.expose_secret(),
        })?;
        self.execute(Method::Post, REGISTER_PATH.to_string(), None, RequestBody::Json(body))
            .await
            .map(|_| ())
    }

    pub async fn fetch_history(&self, auth: Option<BasicAuth>) -> Result<Vec<HistoryEntry>> {
        let body = self
            .execute(Method::Get, HISTORY_PATH.to_string(), auth, RequestBody::Empty)
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn upload(&self, auth: Option<BasicAuth>, file: SelectedFile) -> Result<AnalysisResult> {
        let body = self
            .execute(
                Method::Post,
                UPLOAD_PATH.to_string(),
                auth,
                RequestBody::Multipart {
                    field: UPLOAD_FIELD,
                    file,
                },
            )
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Raw PDF bytes of the report for `id`
    pub async fn fetch_report(&self, auth: Option<BasicAuth>, id: UploadId) -> Result<Vec<u8>> {
        self.execute(Method::Get, report_path(id), auth, RequestBody::Empty)
            .await
    }

    async fn execute(
        &self,
        method: Method,
        path: String,
        auth: Option<BasicAuth>,
        body: RequestBody,
    ) -> Result<Vec<u8>> {
        debug!("{} {} (auth: {})", method, path, auth.is_some());
        let response = self
            .transport
            .send(HttpRequest {
                method,
                path: path.clone(),
                auth,
                body,
            })
            .await?;
        debug!("{} {} -> {}", method, path, response.status);
        check_status(response)
    }
}

fn check_status(response: HttpResponse) -> Result<Vec<u8>> {
    match response.status {
        200..=299 => Ok(response.body),
        401 => Err(ClientError::Unauthorized),
        status => Err(ClientError::Status {
            status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }),
    }
}
