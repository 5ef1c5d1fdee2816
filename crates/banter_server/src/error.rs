use std::fmt::{Debug, Formatter};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use banter_domain::{ConversationId, Errata};
use derive_more::derive::{Display, From};

#[derive(Display, From)]
pub enum Error {
    #[display("Authentication failed")]
    Unauthenticated,

    #[display("Invalid request: {_0}")]
    #[from(ignore)]
    InvalidRequest(String),

    #[display("Too many requests, try again later")]
    RateLimited,

    #[display("Conversation not found: {_0}")]
    #[from(ignore)]
    ConversationNotFound(ConversationId),

    #[display("Generation timed out")]
    ProviderTimeout,

    Provider(banter_provider::Error),
    Database(diesel::result::Error),
    Connection(diesel::ConnectionError),
    Pool(r2d2::Error),
    Migration(Box<dyn std::error::Error + Send + Sync>),
    Id(uuid::Error),
    Serde(serde_json::Error),
    IO(std::io::Error),
    Var(std::env::VarError),
}

pub type Result<A> = std::result::Result<A, Error>;

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<&Error> for Errata {
    fn from(error: &Error) -> Self {
        Errata::new(error.to_string())
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let errata = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            Errata::new("Failed to process chat request")
        } else {
            Errata::from(&self)
        };

        (status, Json(errata)).into_response()
    }
}
