//! Error taxonomy shared by every upstream client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`UpstreamError`] failures.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Error code the console network uses for an expired access token.
pub const EXPIRED_TOKEN_CODE: &str = "2241164";

/// Failures talking to an achievement or auth upstream.
///
/// Messages are kept as strings so a single result can be shared between
/// concurrent waiters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// 404; expected for legacy titles.
    #[error("upstream resource not found: `{url}`")]
    NotFound { url: String },
    /// Access token expired or was rejected.
    #[error("upstream authorization expired: {detail}")]
    AuthExpired { detail: String },
    /// 429; the caller should back off and retry the same unit of work.
    #[error("upstream rate limited request to `{url}`")]
    RateLimited { url: String },
    /// Any other non-success status.
    #[error("unexpected upstream status {status} for `{url}`")]
    Status { url: String, status: u16, body: String },
    /// Request could not be sent or the response body could not be read.
    #[error("failed to reach `{url}`: {message}")]
    Transport { url: String, message: String },
    /// Response payload did not have the expected shape.
    #[error("failed to decode upstream payload from `{url}`: {message}")]
    Decode { url: String, message: String },
    /// Every legacy service candidate failed.
    #[error("all {attempts} service candidates failed for `{url}`")]
    FallbackExhausted {
        url: String,
        attempts: usize,
        last: Box<UpstreamError>,
    },
    /// Upstream answered but refused the credentials being exchanged.
    #[error("upstream rejected credentials: {reason}")]
    Rejected { reason: String },
}

impl UpstreamError {
    /// Whether the failure must bubble up to trigger a token refresh.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            UpstreamError::AuthExpired { .. } => true,
            UpstreamError::FallbackExhausted { last, .. } => last.is_auth_expired(),
            _ => false,
        }
    }

    /// Whether the failure is a plain "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::NotFound { .. })
    }

    /// Classify a non-success response.
    ///
    /// The console network reports expiry either as 401 or as an error body
    /// carrying the expiry code or an "Expired"/"Access denied" message, so
    /// the body is inspected before the status.
    pub fn from_status(url: &str, status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || looks_expired(body) {
            return UpstreamError::AuthExpired {
                detail: format!("{status} from `{url}`"),
            };
        }
        match status {
            StatusCode::NOT_FOUND => UpstreamError::NotFound {
                url: url.to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited {
                url: url.to_string(),
            },
            other => UpstreamError::Status {
                url: url.to_string(),
                status: other.as_u16(),
                body: body.chars().take(512).collect(),
            },
        }
    }
}

fn looks_expired(body: &str) -> bool {
    body.contains(EXPIRED_TOKEN_CODE) || body.contains("Expired") || body.contains("Access denied")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        let url = "https://example.test/x";
        assert!(UpstreamError::from_status(url, StatusCode::UNAUTHORIZED, "").is_auth_expired());
        assert!(
            UpstreamError::from_status(
                url,
                StatusCode::FORBIDDEN,
                r#"{"error":{"code":2241164,"message":"Access token required"}}"#
            )
            .is_auth_expired()
        );
        assert!(UpstreamError::from_status(url, StatusCode::NOT_FOUND, "{}").is_not_found());
        assert!(matches!(
            UpstreamError::from_status(url, StatusCode::TOO_MANY_REQUESTS, ""),
            UpstreamError::RateLimited { .. }
        ));
        assert!(matches!(
            UpstreamError::from_status(url, StatusCode::BAD_GATEWAY, "oops"),
            UpstreamError::Status { status: 502, .. }
        ));
    }

    #[test]
    fn exhausted_fallback_remembers_auth_failure() {
        let err = UpstreamError::FallbackExhausted {
            url: "u".into(),
            attempts: 3,
            last: Box::new(UpstreamError::AuthExpired {
                detail: "401".into(),
            }),
        };
        assert!(err.is_auth_expired());
    }
}
