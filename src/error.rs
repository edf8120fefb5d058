use thiserror::Error;

/// Failures raised while fetching or picking apart a source page.
///
/// These never cross the `Source` boundary: operations log them and
/// degrade to an empty result instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// DNS, connect, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Markup drift: an element the parser relies on is gone.
    #[error("missing element: {0}")]
    MissingElement(&'static str),

    #[error("missing script variable: {0}")]
    MissingScript(&'static str),

    /// A value was present but matched nothing we know how to read.
    #[error("unrecognized value: {0}")]
    Unrecognized(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ScrapeError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => ScrapeError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        ScrapeError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for ScrapeError {
    fn from(err: base64::DecodeError) -> Self {
        ScrapeError::Decode(err.to_string())
    }
}
