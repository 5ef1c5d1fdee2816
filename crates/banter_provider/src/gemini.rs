use banter_domain::ResultStream;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::model::{GenerateRequest, GenerateResponse};
use crate::provider::{ProviderService, Service};
use crate::Error;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-pro";

#[derive(Debug, Clone)]
struct Config {
    api_key: String,
    base_url: Option<String>,
    model: String,
}

impl Config {
    fn api_base(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key).unwrap(),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base(),
            self.model
        )
    }
}

#[derive(Clone)]
struct Gemini {
    client: Client,
    config: Config,
}

impl Gemini {
    fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let config = Config {
            api_key,
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let client = Client::builder().build().unwrap();

        Self { client, config }
    }
}

#[async_trait::async_trait]
impl ProviderService for Gemini {
    async fn stream(&self, prompt: &str) -> ResultStream<String, Error> {
        let body = serde_json::to_string(&GenerateRequest::prompt(prompt))?;

        tracing::debug!("Request body: {}", body);

        let rb = self
            .client
            .post(self.config.url())
            .headers(self.config.headers())
            .body(body);

        let mut es = EventSource::new(rb)?;
        let (tx, rx) = tokio::sync::mpsc::channel(16);

        // The relay task owns the event source; dropping the receiver stops
        // upstream consumption at the next fragment.
        tokio::spawn(async move {
            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        if message.data == banter_domain::DONE_MARKER {
                            break;
                        }

                        let item = match serde_json::from_str::<GenerateResponse>(&message.data) {
                            Ok(response) => match response.text() {
                                Some(text) => Ok(text),
                                None => continue,
                            },
                            Err(_) => match serde_json::from_str::<serde_json::Value>(&message.data)
                            {
                                Ok(value) => Err(Error::Upstream(value)),
                                Err(error) => Err(Error::Serde(error)),
                            },
                        };

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

impl Service {
    pub fn gemini(
        api_key: impl Into<String>,
        model: Option<String>,
        base_url: Option<String>,
    ) -> impl ProviderService {
        Gemini::new(api_key.into(), model, base_url)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config(base_url: Option<&str>) -> Config {
        Config {
            api_key: "test-key".to_string(),
            base_url: base_url.map(str::to_string),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    #[test]
    fn test_url_targets_streaming_endpoint() {
        let actual = config(None).url();
        let expected =
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:streamGenerateContent?alt=sse";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_url_respects_base_override() {
        let actual = config(Some("http://localhost:9090/v1")).url();
        assert_eq!(
            actual,
            "http://localhost:9090/v1/models/gemini-pro:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_headers_carry_api_key() {
        let headers = config(None).headers();
        assert_eq!(headers.get("x-goog-api-key").unwrap(), "test-key");
    }
}
