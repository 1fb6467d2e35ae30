//! HTTP transport.
//!
//! GET fetches a resource, HEAD probes it. `404 Not Found` and `410 Gone`
//! mean the resource does not exist; any other non-success status is a
//! transport error.

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use super::{ExternalResourceAccessor, RemoteResource};
use crate::cache::ExternalResourceMetaData;
use crate::error::{CacheError, Result};

/// Provider label recorded in metadata produced by this transport.
pub const PROVIDER: &str = "http";

/// Fetches resources over HTTP/HTTPS.
pub struct HttpAccessor {
    client: Client,
}

impl HttpAccessor {
    /// Create an accessor with the default 30-second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create an accessor with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("rescache/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Other(anyhow::Error::new(e).context("building HTTP client")))?;
        Ok(Self { client })
    }

    fn send(&self, location: &str, head: bool) -> Result<Option<Response>> {
        let request = if head {
            self.client.head(location)
        } else {
            self.client.get(location)
        };
        let response = request
            .send()
            .map_err(|e| CacheError::transport(location, e))?;

        let status = response.status();
        debug!("{} {} -> {}", if head { "HEAD" } else { "GET" }, location, status);
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CacheError::transport(location, format!("HTTP {}", status)));
        }
        Ok(Some(response))
    }
}

impl ExternalResourceAccessor for HttpAccessor {
    fn fetch(&self, location: &str) -> Result<Option<RemoteResource>> {
        let Some(response) = self.send(location, false)? else {
            return Ok(None);
        };
        let metadata = metadata_from_headers(location, response.headers());
        Ok(Some(RemoteResource {
            metadata,
            body: Box::new(response),
        }))
    }

    fn probe(&self, location: &str) -> Result<Option<ExternalResourceMetaData>> {
        Ok(self
            .send(location, true)?
            .map(|response| metadata_from_headers(location, response.headers())))
    }
}

/// Build resource metadata from response headers.
///
/// Headers that are absent or cannot be parsed are left unset.
pub fn metadata_from_headers(location: &str, headers: &HeaderMap) -> ExternalResourceMetaData {
    let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());

    ExternalResourceMetaData {
        location: Some(location.to_string()),
        last_modified: header(LAST_MODIFIED).and_then(parse_http_date),
        content_length: header(CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
        content_type: header(CONTENT_TYPE).map(String::from),
        etag: header(ETAG).map(String::from),
        provider: Some(PROVIDER.to_string()),
    }
}

/// Parse an HTTP date (`Sat, 01 Jan 2000 00:00:00 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    #[test]
    fn builds_with_custom_timeout() {
        assert!(HttpAccessor::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn parses_http_dates() {
        assert_eq!(
            parse_http_date("Sat, 01 Jan 2000 00:00:00 GMT"),
            Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn metadata_from_full_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(LAST_MODIFIED, HeaderValue::from_static("Sat, 01 Jan 2000 00:00:00 GMT"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/java-archive"));
        headers.insert(ETAG, HeaderValue::from_static("\"abc123\""));

        let meta = metadata_from_headers("https://repo/a.jar", &headers);

        assert_eq!(meta.location.as_deref(), Some("https://repo/a.jar"));
        assert_eq!(
            meta.last_modified,
            Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(meta.content_length, Some(42));
        assert_eq!(meta.content_type.as_deref(), Some("application/java-archive"));
        assert_eq!(meta.etag.as_deref(), Some("\"abc123\""));
        assert_eq!(meta.provider.as_deref(), Some(PROVIDER));
    }

    #[test]
    fn unparseable_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(LAST_MODIFIED, HeaderValue::from_static("not a date"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));

        let meta = metadata_from_headers("https://repo/a.jar", &headers);

        assert_eq!(meta.last_modified, None);
        assert_eq!(meta.content_length, None);
    }
}
