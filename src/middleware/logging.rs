//! Request/response logger.
//!
//! Wraps every request that is not excluded by path: logs method, path and
//! (for mutating methods) the body on the way in, then status, duration,
//! caller and (for non-GET requests) the response body on the way out.
//! Decoding problems are logged and never change the request outcome.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures::FutureExt;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, LoggingConfig};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

pub const LOG_TARGET: &str = "todo_api::request";

const ANONYMOUS: &str = "Anonymous";

/// A body that could not be parsed as its declared content type.
#[derive(Debug, Error)]
#[error("Could not decode {kind} {phase}: {message}")]
pub struct BodyDecodeError {
    pub kind: &'static str,
    pub phase: Phase,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Response,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Request => f.write_str("request body"),
            Phase::Response => f.write_str("response content"),
        }
    }
}

/// What gets written for a body.
#[derive(Debug)]
pub enum BodyLog {
    Json(Value),
    Form(Vec<(String, String)>),
    Raw(String),
    Undecodable { error: BodyDecodeError, raw: String },
    SkippedHtml,
    Empty,
}

impl BodyLog {
    fn emit(&self, phase: Phase) {
        let label = match phase {
            Phase::Request => "Body",
            Phase::Response => "Response content",
        };
        match self {
            BodyLog::Json(value) => info!(target: LOG_TARGET, "{}: {}", label, value),
            BodyLog::Form(fields) => {
                let rendered: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                info!(target: LOG_TARGET, "Multipart body: {{{}}}", rendered.join(", "))
            }
            BodyLog::Raw(raw) => info!(target: LOG_TARGET, "Raw {}: {}", phase, raw),
            BodyLog::Undecodable { error, raw } => {
                error!(target: LOG_TARGET, "{}", error);
                info!(target: LOG_TARGET, "Raw {}: {}", phase, raw);
            }
            BodyLog::SkippedHtml | BodyLog::Empty => {}
        }
    }
}

/// Compiled logger settings, shared by every request.
#[derive(Debug)]
pub struct RequestLogger {
    exclusions: Vec<Regex>,
    max_body_bytes: usize,
    preview_chars: usize,
}

impl RequestLogger {
    pub fn new(config: &LoggingConfig, max_body_bytes: usize) -> Result<Self, ConfigError> {
        let exclusions = config
            .excluded_paths
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidExcludedPath {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclusions,
            max_body_bytes,
            preview_chars: config.response_preview_chars,
        })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.iter().any(|re| re.is_match(path))
    }

    async fn log_request_body(&self, request: Request) -> Result<Request, Response> {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(target: LOG_TARGET, "Could not read request body: {}", e);
                return Err(ApiError::payload_too_large(format!(
                    "Request body exceeds {} bytes",
                    self.max_body_bytes
                ))
                .into_response());
            }
        };

        describe_request_body(content_type(&parts.headers), &bytes)
            .await
            .emit(Phase::Request);

        Ok(Request::from_parts(parts, Body::from(bytes)))
    }

    async fn log_response_body(&self, response: Response) -> Response {
        let (parts, body) = response.into_parts();
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(target: LOG_TARGET, "Could not read response content: {}", e);
                return ApiError::internal_server_error("Failed to read response body")
                    .into_response();
            }
        };

        describe_response_body(content_type(&parts.headers), &bytes, self.preview_chars)
            .emit(Phase::Response);

        Response::from_parts(parts, Body::from(bytes))
    }
}

/// Logging middleware, installed with `from_fn_with_state`.
pub async fn request_logging_middleware(
    State(logger): State<Arc<RequestLogger>>,
    request: Request,
    next: Next,
) -> Response {
    if logger.is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    let started_at = Utc::now();
    let timer = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    info!(target: LOG_TARGET, "{} - Request: {} {}", started_at, method, path);

    let request = if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
        match logger.log_request_body(request).await {
            Ok(request) => request,
            Err(response) => return response,
        }
    } else {
        request
    };

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!(target: LOG_TARGET, "Exception: {}", panic_message(panic.as_ref()));
            std::panic::resume_unwind(panic);
        }
    };

    let duration = timer.elapsed();
    let status = response.status();
    let user = response
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.to_string())
        .unwrap_or_else(|| ANONYMOUS.to_string());

    info!(
        target: LOG_TARGET,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        user = %user,
        "Response: {} {} - Duration: {:?} - User: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        duration,
        user
    );

    if method == Method::GET {
        return response;
    }

    logger.log_response_body(response).await
}

/// Classify a request body by its declared content type.
pub async fn describe_request_body(content_type: Option<&str>, body: &Bytes) -> BodyLog {
    match content_type {
        Some(ct) if ct.contains("application/json") => decode_json(body, Phase::Request),
        Some(ct) if ct.contains("multipart/form-data") => describe_multipart(ct, body.clone()).await,
        _ if body.is_empty() => BodyLog::Empty,
        _ => BodyLog::Raw(String::from_utf8_lossy(body).into_owned()),
    }
}

/// Classify a response body; non-JSON text is cut to `preview_chars`.
pub fn describe_response_body(content_type: Option<&str>, body: &[u8], preview_chars: usize) -> BodyLog {
    if body.is_empty() {
        return BodyLog::Empty;
    }
    if content_type.is_some_and(|ct| ct.starts_with("application/json")) {
        return decode_json(body, Phase::Response);
    }

    let content = String::from_utf8_lossy(body);
    if looks_like_html(&content) {
        return BodyLog::SkippedHtml;
    }
    BodyLog::Raw(content.chars().take(preview_chars).collect())
}

fn decode_json(body: &[u8], phase: Phase) -> BodyLog {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => BodyLog::Json(value),
        Err(e) => BodyLog::Undecodable {
            error: BodyDecodeError {
                kind: "JSON",
                phase,
                message: e.to_string(),
            },
            raw: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

async fn describe_multipart(content_type: &str, body: Bytes) -> BodyLog {
    let undecodable = |message: String, body: &Bytes| BodyLog::Undecodable {
        error: BodyDecodeError {
            kind: "multipart",
            phase: Phase::Request,
            message,
        },
        raw: String::from_utf8_lossy(body).into_owned(),
    };

    let request = match Request::builder()
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body.clone()))
    {
        Ok(request) => request,
        Err(e) => return undecodable(e.to_string(), &body),
    };
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(e) => return undecodable(e.body_text(), &body),
    };

    let mut fields = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                if let Some(file_name) = field.file_name() {
                    fields.push((name, format!("<file {}>", file_name)));
                    continue;
                }
                match field.text().await {
                    Ok(text) => fields.push((name, text)),
                    Err(e) => return undecodable(e.body_text(), &body),
                }
            }
            Ok(None) => break,
            Err(e) => return undecodable(e.body_text(), &body),
        }
    }
    BodyLog::Form(fields)
}

fn looks_like_html(content: &str) -> bool {
    let head: String = content.trim_start().chars().take(14).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
