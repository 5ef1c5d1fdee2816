use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Json, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use banter_domain::{
    ChatChunk, ChatRequest, ChatResponse, Conversation, ConversationId, Errata, DONE_MARKER,
};
use serde::Serialize;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::service::{ApiService, RateLimitService, Service};
use crate::{Error, Result};

pub struct API {
    api: Arc<dyn ApiService>,
    limiter: Arc<dyn RateLimitService>,
    config: Config,
}

#[derive(Clone)]
struct AppState {
    api: Arc<dyn ApiService>,
    limiter: Arc<dyn RateLimitService>,
}

impl API {
    pub fn init() -> Result<Self> {
        let config = Config::from_env();

        let api: Arc<dyn ApiService> = Arc::new(Service::api_service(&config)?);
        let limiter: Arc<dyn RateLimitService> = Arc::new(Service::rate_limit_service(
            config.rate_limit,
            Duration::from_secs(config.rate_window_secs),
        ));

        Ok(Self {
            api,
            limiter,
            config,
        })
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub async fn launch(self) -> Result<()> {
        let state = AppState {
            api: self.api,
            limiter: self.limiter,
        };

        let app = Router::new()
            .route("/api/chat", post(chat_handler))
            .route("/api/chats", get(chats_handler))
            .route("/api/chats/new", post(new_chat_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
            .route("/health", get(health_handler))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([
                        axum::http::Method::GET,
                        axum::http::Method::POST,
                        axum::http::Method::OPTIONS,
                    ])
                    .allow_headers([
                        axum::http::header::CONTENT_TYPE,
                        axum::http::header::AUTHORIZATION,
                    ]),
            )
            .with_state(state);

        let port = self.config.port;
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        info!("Server running on http://0.0.0.0:{port}");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }
}

/// Checked before authentication: exceeding the window fails the request
/// before any store or provider interaction.
async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !state.limiter.admit(&addr.ip().to_string()) {
        return Error::RateLimited.into_response();
    }
    next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(Error::Unauthenticated)
}

#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, std::convert::Infallible>>>> {
    let credential = bearer(&headers)?;
    let stream = state.api.chat(credential, request).await?;

    Ok(Sse::new(stream.map(|message| {
        let event = match message {
            Ok(ChatResponse::Text(text)) => Event::default().data(
                serde_json::to_string(&ChatChunk::new(text)).expect("Failed to serialize chunk"),
            ),
            Ok(ChatResponse::Done) => Event::default().data(DONE_MARKER),
            Err(error) => Event::default().data(
                serde_json::to_string(&Errata::from(&error)).expect("Failed to serialize error"),
            ),
        };
        Ok(event)
    })))
}

#[axum::debug_handler]
async fn chats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Conversation>>> {
    let credential = bearer(&headers)?;
    Ok(Json(state.api.conversations(credential).await?))
}

#[derive(Serialize)]
struct NewChatResponse {
    id: ConversationId,
}

#[axum::debug_handler]
async fn new_chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NewChatResponse>> {
    let credential = bearer(&headers)?;
    let conversation = state.api.new_conversation(credential).await?;
    Ok(Json(NewChatResponse {
        id: conversation.id,
    }))
}

async fn health_handler() -> Response {
    axum::response::Response::builder()
        .status(200)
        .body(axum::body::Body::empty())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_extracts_the_credential() {
        let headers = headers_with("Bearer token-123");
        assert_eq!(bearer(&headers).unwrap(), "token-123");
    }

    #[test]
    fn test_missing_authorization_is_unauthenticated() {
        let headers = HeaderMap::new();
        assert!(matches!(bearer(&headers), Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_malformed_authorization_is_unauthenticated() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert!(matches!(bearer(&headers), Err(Error::Unauthenticated)));
    }
}
