use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Event source error: {0}")]
    EventSource(#[from] reqwest_eventsource::Error),

    #[error("Failed to open event source: {0}")]
    CannotCloneRequest(#[from] reqwest_eventsource::CannotCloneRequestError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(serde_json::Value),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

pub type Result<A> = std::result::Result<A, Error>;
