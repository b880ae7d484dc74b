//! HTTP request execution
//!
//! Builds and sends one fully rendered request and captures the raw
//! response. Judging the status against the step's expectation is the
//! executor's job, not this module's.

use reqwest::{multipart, Client, Method};
use serde_json::Value;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::scenario::MultipartSpec;

use super::report::Payload;

/// A fully rendered request, ready to send
#[derive(Debug)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub part: Option<PreparedPart>,
    pub bearer: Option<String>,
}

/// Multipart file content resolved to bytes
#[derive(Debug)]
pub struct PreparedPart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PreparedPart {
    /// Resolve a multipart spec, reading file content where needed
    pub fn resolve(spec: &MultipartSpec) -> Result<Self> {
        let bytes = match (&spec.text, &spec.path) {
            (Some(text), _) => text.clone().into_bytes(),
            (None, Some(path)) => {
                std::fs::read(path).map_err(|e| Error::file_read(path, &e))?
            }
            (None, None) => Vec::new(),
        };
        Ok(Self {
            field: spec.field.clone(),
            file_name: spec.file_name.clone(),
            content_type: spec.content_type.clone(),
            bytes,
        })
    }
}

/// Raw response capture
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub payload: Payload,
}

/// Build the shared HTTP client with a per-request timeout
pub fn build_client(request_timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(request_timeout)
        .build()
        .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))
}

/// Send one prepared request and capture the response
///
/// Any transport-level failure (refused connection, DNS, timeout) comes back
/// as a fatal [`Error::Network`]; non-2xx statuses are not errors here.
pub async fn send(client: &Client, request: PreparedRequest) -> Result<RawResponse> {
    let mut builder = client.request(request.method.clone(), &request.url);
    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    if let Some(token) = &request.bearer {
        builder = builder.bearer_auth(token);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }
    if let Some(part) = request.part {
        let mut file = multipart::Part::bytes(part.bytes).file_name(part.file_name);
        if let Some(content_type) = &part.content_type {
            file = file.mime_str(content_type).map_err(|e| {
                Error::ScenarioParse(format!("invalid content_type '{content_type}': {e}"))
            })?;
        }
        builder = builder.multipart(multipart::Form::new().part(part.field, file));
    }

    let response = builder
        .send()
        .await
        .map_err(|e| Error::network(&request.url, e))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| Error::network(&request.url, e))?;

    let payload = if text.is_empty() {
        Payload::Empty
    } else {
        serde_json::from_str::<Value>(&text)
            .map(Payload::Json)
            .unwrap_or(Payload::Text(text))
    };

    Ok(RawResponse { status, payload })
}

/// Join the base URL and a rendered path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(
            join_url("http://localhost:8080/api", "/auth/login"),
            "http://localhost:8080/api/auth/login"
        );
        assert_eq!(
            join_url("http://localhost:8080/api/", "auth/login"),
            "http://localhost:8080/api/auth/login"
        );
    }

    #[test]
    fn test_resolve_inline_part() {
        let spec = MultipartSpec {
            field: "file".to_string(),
            file_name: "avatar.png".to_string(),
            content_type: Some("image/png".to_string()),
            text: Some("pixels".to_string()),
            path: None,
        };
        let part = PreparedPart::resolve(&spec).unwrap();
        assert_eq!(part.bytes, b"pixels");
        assert_eq!(part.field, "file");
    }

    #[test]
    fn test_resolve_part_from_missing_file_errors() {
        let spec = MultipartSpec {
            field: "file".to_string(),
            file_name: "avatar.png".to_string(),
            content_type: None,
            text: None,
            path: Some("/nonexistent/avatar.png".into()),
        };
        assert!(matches!(
            PreparedPart::resolve(&spec),
            Err(Error::FileRead { .. })
        ));
    }
}
