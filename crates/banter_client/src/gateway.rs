use banter_domain::{
    ChatChunk, ChatRequest, Conversation, ConversationId, ResultStream, DONE_MARKER,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::{Error, Result};

/// HTTP face of the chat gateway as seen from the client.
#[async_trait::async_trait]
pub trait GatewayService: Send + Sync {
    async fn chats(&self) -> Result<Vec<Conversation>>;
    async fn new_chat(&self) -> Result<ConversationId>;
    async fn send(&self, chat: ChatRequest) -> ResultStream<String, Error>;
}

pub struct Service;

impl Service {
    pub fn gateway(base_url: impl Into<String>, token: impl Into<String>) -> impl GatewayService {
        Live::new(base_url.into(), token.into())
    }
}

#[derive(Debug, Clone)]
struct Config {
    base_url: String,
    token: String,
}

impl Config {
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token)).unwrap(),
        );
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Clone)]
struct Live {
    client: Client,
    config: Config,
}

impl Live {
    fn new(base_url: String, token: String) -> Self {
        Self {
            client: Client::new(),
            config: Config { base_url, token },
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewChatResponse {
    id: ConversationId,
}

#[async_trait::async_trait]
impl GatewayService for Live {
    async fn chats(&self) -> Result<Vec<Conversation>> {
        Ok(self
            .client
            .get(self.config.url("/api/chats"))
            .headers(self.config.headers())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn new_chat(&self) -> Result<ConversationId> {
        let response: NewChatResponse = self
            .client
            .post(self.config.url("/api/chats/new"))
            .headers(self.config.headers())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.id)
    }

    async fn send(&self, chat: ChatRequest) -> ResultStream<String, Error> {
        let body = serde_json::to_string(&chat)?;

        let rb = self
            .client
            .post(self.config.url("/api/chat"))
            .headers(self.config.headers())
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        let mut es = EventSource::new(rb)?;
        let (tx, rx) = tokio::sync::mpsc::channel(16);

        tokio::spawn(async move {
            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        if message.data == DONE_MARKER {
                            break;
                        }

                        let item = serde_json::from_str::<ChatChunk>(&message.data)
                            .map(|chunk| chunk.text)
                            .map_err(Error::Serde);

                        let failed = item.is_err();
                        if tx.send(item).await.is_err() || failed {
                            break;
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(error) => {
                        let _ = tx.send(Err(error.into())).await;
                        break;
                    }
                }
            }
            es.close();
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
