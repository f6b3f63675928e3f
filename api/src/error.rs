use std::collections::HashMap;

use axum::{Json, http::StatusCode, response::IntoResponse};
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Serialize;
use serde_json::Value;

use crate::store::StoreError;

/// Errors caused by the request itself. The message is shown to the caller.
pub trait ApiRequestError: std::error::Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("storage error: {0}")]
    Store(StoreError),

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] eyre::Report),
}

impl Serialize for ServerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("message", &self.to_string())?;
        map.end()
    }
}

#[derive(Debug)]
pub enum AppError {
    ServerError {
        error: ServerError,

        #[cfg(debug_assertions)]
        backtrace: Option<backtrace::Backtrace>,
    },
    Request {
        message: String,
        status: StatusCode,
    },
    Unhandled(String),
}

impl AppError {
    fn server(error: ServerError) -> Self {
        AppError::ServerError {
            error,

            #[cfg(debug_assertions)]
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }

    pub fn not_found(what: &str) -> Self {
        AppError::Request {
            message: format!("{what} not found"),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ServerError { .. } | AppError::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Request { status, .. } => *status,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,

    #[cfg(debug_assertions)]
    #[serde(skip_serializing_if = "Option::is_none")]
    debug_info: Option<HashMap<&'static str, Value>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();

        let error_response = match self {
            AppError::ServerError {
                error,
                #[cfg(debug_assertions)]
                backtrace,
            } => {
                tracing::error!(%error, "Request failed with a server error");

                ErrorResponse {
                    code: "SERVER_ERR".into(),
                    msg: Some("Internal server error".into()),
                    #[cfg(debug_assertions)]
                    debug_info: Some(debug_info(&error, backtrace.as_ref())),
                }
            }
            AppError::Request { message, status } => ErrorResponse {
                code: match status {
                    StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
                    StatusCode::FORBIDDEN => "FORBIDDEN",
                    StatusCode::NOT_FOUND => "NOT_FOUND",
                    StatusCode::CONFLICT => "CONFLICT",
                    _ => "BAD_REQUEST",
                }
                .into(),
                msg: Some(message),
                #[cfg(debug_assertions)]
                debug_info: None,
            },
            AppError::Unhandled(e) => {
                tracing::error!(error = %e, "Request failed with an unhandled error");
                ErrorResponse {
                    code: "ERR".into(),
                    msg: Some(e),
                    #[cfg(debug_assertions)]
                    debug_info: None,
                }
            }
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl<E: ApiRequestError> From<E> for AppError {
    fn from(e: E) -> Self {
        AppError::Request {
            status: e.status_code(),
            message: e.to_string(),
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError::from(e).into()
    }
}

impl From<PoolError> for AppError {
    fn from(e: PoolError) -> Self {
        AppError::server(ServerError::Pool(e))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::not_found("Record"),
            StoreError::Conflict => AppError::Request {
                message: "Record already exists".into(),
                status: StatusCode::CONFLICT,
            },
            e => AppError::server(ServerError::Store(e)),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::server(ServerError::Http(e))
    }
}

impl From<eyre::Report> for AppError {
    fn from(e: eyre::Report) -> Self {
        AppError::server(ServerError::Other(e))
    }
}

impl From<&'static str> for AppError {
    fn from(e: &'static str) -> Self {
        AppError::Unhandled(e.into())
    }
}

impl From<String> for AppError {
    fn from(e: String) -> Self {
        AppError::Unhandled(e)
    }
}

impl From<(&'static str, StatusCode)> for AppError {
    fn from((message, status): (&'static str, StatusCode)) -> Self {
        AppError::Request {
            message: message.into(),
            status,
        }
    }
}

impl From<(String, StatusCode)> for AppError {
    fn from((message, status): (String, StatusCode)) -> Self {
        AppError::Request { message, status }
    }
}

#[cfg(debug_assertions)]
fn debug_info(
    error: &ServerError,
    backtrace: Option<&backtrace::Backtrace>,
) -> HashMap<&'static str, Value> {
    let frames_info = backtrace.map(filter_backtrace).unwrap_or_default();
    HashMap::from([
        (
            "backtrace",
            serde_json::to_value(&frames_info).unwrap_or_default(),
        ),
        ("error", serde_json::to_value(error).unwrap_or_default()),
    ])
}

#[cfg(debug_assertions)]
#[derive(Serialize, Debug)]
struct FrameInfo {
    name: String,
    loc: String,
}

#[cfg(debug_assertions)]
fn filter_backtrace(backtrace: &backtrace::Backtrace) -> Vec<FrameInfo> {
    const MODULE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");
    let mut frames_info: Vec<FrameInfo> = Vec::new();

    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            if let (Some(name), Some(filename), Some(lineno)) = (
                symbol.name().map(|n| n.to_string()),
                symbol.filename().map(|f| f.to_owned()),
                symbol.lineno(),
            ) {
                if name.contains(MODULE_PREFIX) {
                    frames_info.push(FrameInfo {
                        name,
                        loc: format!("{}:{}", filename.display(), lineno),
                    });
                }
            }
        }
    }

    frames_info
}
