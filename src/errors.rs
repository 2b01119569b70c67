use axum::http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    RateLimited,
    AuthFailure,
    NetworkTimeout,
    NoData,
    Unknown,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RateLimited => "rate_limited",
            Self::AuthFailure => "auth_failure",
            Self::NetworkTimeout => "network_timeout",
            Self::NoData => "no_data",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind} upstream failure (retryable: {retryable}): {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub retryable: bool,
    /// Raw upstream detail. Safe to log, never shown to end users.
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, retryable: bool, detail: impl Into<String>) -> Self {
        Self {
            kind,
            retryable,
            detail: detail.into(),
        }
    }

    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, true, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NetworkTimeout, true, detail)
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::AuthFailure, false, detail)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = format!("HTTP {status}: {}", truncate(body, 200));
        match status.as_u16() {
            429 => Self::rate_limited(detail),
            401 | 403 => Self::auth(detail),
            404 => Self::new(FetchErrorKind::NoData, false, detail),
            408 => Self::timeout(detail),
            500..=599 => Self::new(FetchErrorKind::Unknown, true, detail),
            _ => Self::new(FetchErrorKind::Unknown, false, detail),
        }
    }

    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::new(FetchErrorKind::Unknown, true, err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status, "")
        } else {
            Self::new(FetchErrorKind::Unknown, false, err.to_string())
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::RateLimited => "Please try again in a few moments.",
            FetchErrorKind::AuthFailure => "The trend service rejected our credentials.",
            FetchErrorKind::NetworkTimeout => "The trend service took too long to respond.",
            FetchErrorKind::NoData => "No activity was found for this keyword.",
            FetchErrorKind::Unknown => "Something went wrong, please try again later.",
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Please enter a valid keyword.")]
    BlankKeyword,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set; it is required for the {1} source")]
    MissingCredential(&'static str, &'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::BlankKeyword => Self::bad_request(err.to_string()),
            AnalysisError::Fetch(fetch) => {
                let status = match fetch.kind {
                    FetchErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                    FetchErrorKind::NetworkTimeout => StatusCode::GATEWAY_TIMEOUT,
                    FetchErrorKind::NoData => StatusCode::NOT_FOUND,
                    FetchErrorKind::AuthFailure | FetchErrorKind::Unknown => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                Self {
                    status,
                    message: fetch.user_message().to_string(),
                }
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
