//! Error types shared by the API client and the application shell.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::AppConfigError;

/// Failure of a single REST call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, reset).
    #[error("unable to reach the API: {0}")]
    Connectivity(#[from] reqwest::Error),
    /// Non-2xx status or `success: false` in the envelope.
    #[error("{message} (HTTP {status})")]
    Application { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Short message suitable for a status banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Application { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors that stop the binary before the window opens.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] AppConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("window error: {0}")]
    Ui(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_errors_surface_server_message() {
        let err = ApiError::Application {
            status: 404,
            message: "Document not found".into(),
        };
        assert_eq!(err.user_message(), "Document not found");
        assert_eq!(err.to_string(), "Document not found (HTTP 404)");
    }
}
