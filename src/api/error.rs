use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("unexpected response from {context}: {reason}")]
    Malformed { context: String, reason: String },
}

/// Maximum length of response excerpts quoted in error messages.
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl ApiError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        ApiError::Transport {
            url: url.into(),
            source,
        }
    }

    pub fn malformed(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ApiError::Malformed {
            context: context.into(),
            reason: truncate(&reason.to_string()),
        }
    }

    /// Whether the failure was a request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport { source, .. } if source.is_timeout())
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... ({} total bytes)", &body[..end], body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_truncates_long_bodies() {
        let long = "x".repeat(500);
        let err = ApiError::malformed("login", long);
        let msg = err.to_string();
        assert!(msg.len() < 300);
        assert!(msg.contains("500 total bytes"));
    }

    #[test]
    fn test_malformed_keeps_short_bodies() {
        let err = ApiError::malformed("login", "missing field `authenticated`");
        assert!(err.to_string().contains("missing field `authenticated`"));
    }
}
