//! HTTP transport speaking the resumable-upload protocol
//!
//! Sessions are opened with a `POST` against the upload endpoint (or a
//! pre-signed URL); the backend answers with the session URI in the
//! `Location` header, which doubles as the session token. Chunks are sent
//! with `PUT` and a `Content-Range` header; the backend acknowledges a
//! non-final chunk with HTTP 308 and the final one with 2xx.

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::{RequestBuilder, Response};

use super::{StorageError, StorageTransport, UploadTarget};

/// Object names travel in a query string; keep only the unreserved set.
const OBJECT_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Blocking HTTP implementation of [`StorageTransport`].
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpTransport {
    /// Create a transport against `endpoint` (scheme + host, no trailing
    /// slash needed), optionally presenting `auth_token` as a bearer token.
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: Option<String>,
    ) -> Result<Self, StorageError> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()),
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl StorageTransport for HttpTransport {
    #[tracing::instrument(name = "storage.open", skip(self, target), err)]
    fn open(&self, target: &UploadTarget) -> Result<String, StorageError> {
        let response = match target {
            UploadTarget::Blob {
                bucket,
                name,
                content_type,
            } => {
                let url = session_request_url(&self.endpoint, bucket, name);
                let mut body = serde_json::Map::new();
                if let Some(content_type) = content_type {
                    body.insert("contentType".into(), content_type.clone().into());
                }
                tracing::debug!(bucket = %bucket, name = %name, "opening upload session");
                self.authorize(self.http.post(url))
                    .json(&body)
                    .send()
                    .map_err(request_error)?
            }
            UploadTarget::SignedUrl { url } => {
                tracing::debug!("opening upload session via signed URL");
                self.http
                    .post(url)
                    .header("x-goog-resumable", "start")
                    .header("content-length", "0")
                    .send()
                    .map_err(request_error)?
            }
        };

        session_uri(response)
    }

    #[tracing::instrument(
        name = "storage.upload_chunk",
        skip(self, session, chunk),
        fields(position = position, len = chunk.len(), is_final = is_final),
        err
    )]
    fn upload_chunk(
        &self,
        session: &str,
        chunk: Bytes,
        position: u64,
        is_final: bool,
    ) -> Result<(), StorageError> {
        let range = content_range(position, chunk.len(), is_final);
        let response = self
            .http
            .put(session)
            .header("content-range", range)
            .body(chunk)
            .send()
            .map_err(request_error)?;

        let status = response.status();
        // 308 is the backend acknowledging an incomplete upload
        if status.is_success() || status.as_u16() == 308 {
            return Ok(());
        }
        Err(status_error(response))
    }
}

/// URL that opens a resumable session for a bucket + object name.
fn session_request_url(endpoint: &str, bucket: &str, name: &str) -> String {
    format!(
        "{endpoint}/upload/storage/v1/b/{bucket}/o?uploadType=resumable&name={}",
        utf8_percent_encode(name, OBJECT_NAME)
    )
}

/// `Content-Range` value for a chunk of `len` bytes at `position`.
///
/// A non-final chunk leaves the total open (`*`); the final chunk pins it,
/// and an empty final chunk carries no byte range at all.
fn content_range(position: u64, len: usize, is_final: bool) -> String {
    let len = len as u64;
    match (len, is_final) {
        (0, true) => format!("bytes */{position}"),
        (0, false) => "bytes */*".to_string(),
        (_, true) => format!(
            "bytes {}-{}/{}",
            position,
            position + len - 1,
            position + len
        ),
        (_, false) => format!("bytes {}-{}/*", position, position + len - 1),
    }
}

fn session_uri(response: Response) -> Result<String, StorageError> {
    if !response.status().is_success() {
        return Err(status_error(response));
    }
    response
        .headers()
        .get("location")
        .ok_or_else(|| StorageError::Protocol("missing Location header in session open".into()))?
        .to_str()
        .map(str::to_string)
        .map_err(|e| StorageError::Protocol(e.to_string()))
}

fn request_error(err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Timeout(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}

fn status_error(response: Response) -> StorageError {
    let status = response.status().as_u16();
    let message = response.text().unwrap_or_default();
    StorageError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_request_url() {
        assert_eq!(
            session_request_url("https://storage.example.com", "my-bucket", "my-object"),
            "https://storage.example.com/upload/storage/v1/b/my-bucket/o?uploadType=resumable&name=my-object"
        );
    }

    #[test]
    fn test_object_name_encoding() {
        let url = session_request_url("https://s", "b", "logs/2024/day 1.txt");
        assert!(url.ends_with("name=logs%2F2024%2Fday%201.txt"));

        // unreserved characters pass through untouched
        let url = session_request_url("https://s", "b", "a-b.c_d~e");
        assert!(url.ends_with("name=a-b.c_d~e"));
    }

    #[test]
    fn test_content_range_non_final() {
        assert_eq!(content_range(0, 1_048_576, false), "bytes 0-1048575/*");
        assert_eq!(
            content_range(15_728_640, 262_144, false),
            "bytes 15728640-15990783/*"
        );
    }

    #[test]
    fn test_content_range_final() {
        assert_eq!(
            content_range(15_728_640, 262_144, true),
            "bytes 15728640-15990783/15990784"
        );
        assert_eq!(content_range(0, 0, true), "bytes */0");
        assert_eq!(content_range(4096, 0, true), "bytes */4096");
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let transport = HttpTransport::new("https://storage.example.com/", None).unwrap();
        assert_eq!(transport.endpoint, "https://storage.example.com");
    }
}
