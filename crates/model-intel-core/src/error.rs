#[derive(Debug, thiserror::Error)]
pub enum ModelIntelError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("bad config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "network")]
impl From<reqwest::Error> for ModelIntelError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModelIntelError>;
