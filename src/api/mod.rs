//! Typed REST client for the document API, the processing proxy and the
//! admin proxy.
//!
//! Every call goes through [`ApiClient::read_envelope`], which checks both the
//! HTTP status and the `success` flag of the `{ success, error?, ...payload }`
//! envelope before the payload is decoded.

mod admin;
mod processing;
mod s3;
pub mod types;

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::multipart::Form;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::ApiError;

pub use admin::RESET_CONFIRMATION;
pub use s3::LocalFile;
pub use types::*;

/// How strictly a response envelope is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Envelope {
    /// HTTP status and `success` flag must both be good.
    Strict,
    /// Only the HTTP status is checked; the payload carries its own per-item
    /// outcome (folder uploads report partial failure as `success: false`).
    StatusOnly,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// `prefix` joined with the slash-separated `tail`, each segment escaped.
    /// Used for object keys and folder paths embedded in the route.
    fn url_with_tail(&self, prefix: &str, tail: &str) -> Result<Url, ApiError> {
        let mut url = self.url(prefix)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(tail.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let response = self.http.get(url).query(query).send().await?;
        Self::read_envelope(response, Envelope::Strict).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        Self::read_envelope(response, Envelope::Strict).await
    }

    async fn delete_at<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(%url, "DELETE");
        let response = self.http.delete(url).send().await?;
        Self::read_envelope(response, Envelope::Strict).await
    }

    async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        envelope: Envelope,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!(%url, "POST multipart");
        let response = self.http.post(url).multipart(form).send().await?;
        Self::read_envelope(response, envelope).await
    }

    /// Raw bytes from an absolute URL (presigned object links).
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = Url::parse(url)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Application {
                status: status.as_u16(),
                message: format!("object fetch failed with status {status}"),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: Response,
        envelope: Envelope,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.bytes().await?;
        let value: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(err) if status.is_success() => return Err(ApiError::Decode(err)),
            Err(_) => {
                return Err(ApiError::Application {
                    status: status.as_u16(),
                    message: fallback_message(status, &body),
                })
            }
        };

        let flagged_failure =
            envelope == Envelope::Strict && value.get("success") == Some(&Value::Bool(false));
        if !status.is_success() || flagged_failure {
            let message = error_message(&value).unwrap_or_else(|| fallback_message(status, &[]));
            return Err(ApiError::Application {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// `error` is either a plain string or `{ code, message }`.
fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

fn fallback_message(status: StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() && text.len() <= 200 {
        return text.to_string();
    }
    match status.canonical_reason() {
        Some(reason) if !status.is_success() => reason.to_string(),
        _ => "request reported failure".to_string(),
    }
}

/// Millisecond timestamp used to defeat intermediary caches.
fn cache_buster() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ApiClient::new("http://localhost:3500/prefix").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3500/prefix/");
        let url = client.url("/api/s3/folders").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3500/prefix/api/s3/folders");
    }

    #[test]
    fn tail_segments_are_escaped() {
        let client = ApiClient::new("http://localhost:3500").unwrap();
        let url = client
            .url_with_tail("api/s3/documents", "docs/My Report #1.pdf")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3500/api/s3/documents/docs/My%20Report%20%231.pdf"
        );
    }

    #[test]
    fn error_message_reads_nested_objects() {
        assert_eq!(
            error_message(&json!({ "error": "boom" })).as_deref(),
            Some("boom")
        );
        assert_eq!(
            error_message(&json!({ "error": { "code": "NoSuchKey", "message": "gone" } }))
                .as_deref(),
            Some("gone")
        );
        assert_eq!(error_message(&json!({ "success": false })), None);
    }
}
