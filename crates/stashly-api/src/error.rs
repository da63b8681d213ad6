use thiserror::Error;

/// HTTP verb used for a data-service call.
///
/// Carried by every request failure so callers can report which
/// operation against which URL went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Top-level error type for the `stashly-api` crate.
///
/// Covers every failure mode of the REST transport: client construction,
/// connection-level failures, non-success HTTP statuses and malformed bodies.
/// `stashly-core` folds these into data-service errors on completion
/// operations; they are never raised past the synchronization pipeline.
#[derive(Debug, Error)]
pub enum Error {
    // ── Construction ────────────────────────────────────────────────
    /// Building the underlying HTTP client failed.
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing or joining failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A key that cannot be addressed as a single path segment.
    #[error("Invalid entity key for a URL path: '{0}'")]
    InvalidKey(String),

    /// TLS configuration error (unreadable or invalid CA certificate).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Request ─────────────────────────────────────────────────────
    /// The request never produced a response (connection refused, DNS,
    /// timeout enforced by the transport).
    #[error("{method} {url} failed: {source}")]
    Request {
        method: HttpMethod,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}: {message}")]
    Http {
        method: HttpMethod,
        url: String,
        status: u16,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("{method} {url} returned an unreadable body: {message}")]
    Deserialization {
        method: HttpMethod,
        url: String,
        message: String,
        body: String,
    },
}

impl Error {
    /// HTTP status of the failed call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Request { source, .. } | Self::Transport(source) => {
                source.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }

    /// HTTP method of the failed call, if the failure is request-scoped.
    pub fn method(&self) -> Option<HttpMethod> {
        match self {
            Self::Request { method, .. }
            | Self::Http { method, .. }
            | Self::Deserialization { method, .. } => Some(*method),
            _ => None,
        }
    }

    /// URL of the failed call, if the failure is request-scoped.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Request { url, .. } | Self::Http { url, .. } | Self::Deserialization { url, .. } => {
                Some(url)
            }
            _ => None,
        }
    }

    /// Human-readable message without the method/URL prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Http { message, .. } | Self::Deserialization { message, .. } => message.clone(),
            Self::Request { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Http { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> Error {
        Error::Http {
            method: HttpMethod::Get,
            url: "http://localhost/api/heroes/".into(),
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn http_error_exposes_status_method_and_url() {
        let err = http(404);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.method(), Some(HttpMethod::Get));
        assert_eq!(err.url(), Some("http://localhost/api/heroes/"));
        assert_eq!(err.message(), "boom");
        assert!(err.is_not_found());
    }

    #[test]
    fn service_unavailable_is_transient() {
        assert!(http(503).is_transient());
        assert!(!http(400).is_transient());
    }

    #[test]
    fn method_display_is_uppercase() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!("PUT".parse::<HttpMethod>().ok(), Some(HttpMethod::Put));
    }

    #[test]
    fn construction_errors_have_no_request_context() {
        let err = Error::Tls("bad cert".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.method(), None);
        assert_eq!(err.url(), None);
    }
}
