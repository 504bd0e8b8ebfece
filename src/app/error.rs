use thiserror::Error;

#[derive(Error, Debug)]
pub enum HnError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Item {id} has no parent and is not a story or poll")]
    BrokenChain { id: i64 },

    #[error("Ancestor chain starting at {start} did not reach a root within {hops} hops")]
    ChainTooDeep { start: i64, hops: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background fetch failed: {0}")]
    Task(String),

    #[error(transparent)]
    Shared(#[from] std::sync::Arc<HnError>),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HnError>;
