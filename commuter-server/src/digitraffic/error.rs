//! Digitraffic client error types.

/// Errors that can occur when querying the Digitraffic rail feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the API (HTTP 429)
    #[error("rate limited by Digitraffic")]
    RateLimited,

    /// API returned a non-success status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// GraphQL errors embedded in a 200 response
    #[error("GraphQL error: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Response had no `data` field
    #[error("response contained no data")]
    MissingData,
}

impl FeedError {
    /// Whether the upstream asked us to back off.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FeedError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::RateLimited;
        assert_eq!(err.to_string(), "rate limited by Digitraffic");
        assert!(err.is_rate_limited());

        let err = FeedError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "API error 503: Service Unavailable");
        assert!(!err.is_rate_limited());

        let err = FeedError::GraphQl {
            messages: vec!["bad field".into(), "bad arg".into()],
        };
        assert_eq!(err.to_string(), "GraphQL error: bad field; bad arg");

        let err = FeedError::Json {
            message: "expected value".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("expected value"));

        assert_eq!(FeedError::MissingData.to_string(), "response contained no data");
    }
}
