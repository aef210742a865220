//! Error types for the REST client.
//!
//! # Design
//! One enum covers the three failure families: transport (including the
//! `Connection` classification for connect failures and timeouts), HTTP
//! status, and local preconditions checked before any request is sent.
//! Verb methods never produce `HttpStatus` on their own; only the download
//! path and `HttpResponse::error_for_status` do.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `RestClient`.
#[derive(Debug, Error)]
pub enum RestError {
    /// The server answered with a status of 300 or above.
    #[error("{status} {reason}{}", with_detail("", .message.as_deref().unwrap_or_default()))]
    HttpStatus {
        status: u16,
        reason: String,
        message: Option<String>,
        code: Option<String>,
    },

    /// The server could not be reached or did not answer in time.
    #[error("{}", with_detail(.message, .detail))]
    Connection {
        message: String,
        code: i32,
        detail: String,
    },

    /// Any other failure reported by the HTTP transport.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// An upload source path does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An upload source exists but could not be opened.
    #[error("could not open file {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download destination could not be created.
    #[error("could not create file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a body stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-supplied value cannot be used as a header value.
    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    /// An environment configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RestError {
    /// `Connection` code for failures to establish a connection.
    pub const CONNECT_FAILED: i32 = 1;
    /// `Connection` code for requests that exceeded the configured timeout.
    pub const TIMED_OUT: i32 = 2;

    pub fn http_status(
        status: u16,
        reason: impl Into<String>,
        message: Option<String>,
        code: Option<String>,
    ) -> Self {
        RestError::HttpStatus {
            status,
            reason: reason.into(),
            message,
            code,
        }
    }

    pub fn connection(message: impl Into<String>, code: i32, detail: impl Into<String>) -> Self {
        RestError::Connection {
            message: message.into(),
            code,
            detail: detail.into(),
        }
    }

    /// Classify a transport error. Connect failures and timeouts become
    /// `Connection`; everything else is passed through as `Transport`.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::connection("request timed out", Self::TIMED_OUT, err.to_string())
        } else if err.is_connect() {
            RestError::connection("connection failed", Self::CONNECT_FAILED, err.to_string())
        } else {
            RestError::Transport(err)
        }
    }

    /// The HTTP status carried by an `HttpStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The numeric code carried by a `Connection` error.
    pub fn connection_code(&self) -> Option<i32> {
        match self {
            RestError::Connection { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn with_detail(head: &str, detail: &str) -> String {
    if detail.is_empty() {
        head.to_string()
    } else {
        format!("{head}: {detail}")
    }
}

/// A `Result` alias where the `Err` case is [`RestError`].
pub type Result<T> = std::result::Result<T, RestError>;
