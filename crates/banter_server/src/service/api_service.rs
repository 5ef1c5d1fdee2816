use std::sync::Arc;
use std::time::Duration;

use banter_domain::{ChatRequest, ChatResponse, Conversation, ResultStream};
use banter_provider::ProviderService;

use super::auth_service::AuthService;
use super::chat_service::ChatService;
use super::conversation_service::ConversationService;
use super::Service;
use crate::config::Config;
use crate::{Error, Result};

/// The authenticated API surface. Every operation resolves the caller's
/// credential before touching the store or the provider.
#[async_trait::async_trait]
pub trait ApiService: Send + Sync {
    async fn chat(&self, credential: &str, chat: ChatRequest)
        -> ResultStream<ChatResponse, Error>;
    async fn conversations(&self, credential: &str) -> Result<Vec<Conversation>>;
    async fn new_conversation(&self, credential: &str) -> Result<Conversation>;
}

impl Service {
    pub fn api_service(config: &Config) -> Result<impl ApiService> {
        Live::new(config)
    }
}

struct Live {
    auth: Arc<dyn AuthService>,
    chat_service: Arc<dyn ChatService>,
    storage: Arc<dyn ConversationService>,
}

impl Live {
    fn new(config: &Config) -> Result<Self> {
        let provider: Arc<dyn ProviderService> = Arc::new(banter_provider::Service::gemini(
            config.gemini_api_key.clone(),
            None,
            None,
        ));
        let auth: Arc<dyn AuthService> =
            Arc::new(Service::auth_service(config.tokeninfo_url.clone()));
        let storage: Arc<dyn ConversationService> =
            Arc::new(Service::storage_service(&config.database_path)?);
        let chat_service: Arc<dyn ChatService> = Arc::new(Service::chat_service(
            provider,
            storage.clone(),
            Duration::from_secs(config.provider_timeout_secs),
        ));

        Ok(Self {
            auth,
            chat_service,
            storage,
        })
    }
}

#[async_trait::async_trait]
impl ApiService for Live {
    async fn chat(
        &self,
        credential: &str,
        chat: ChatRequest,
    ) -> ResultStream<ChatResponse, Error> {
        let user = self.auth.verify(credential).await?;
        self.chat_service.chat(user, chat).await
    }

    async fn conversations(&self, credential: &str) -> Result<Vec<Conversation>> {
        let user = self.auth.verify(credential).await?;
        self.storage.list(&user).await
    }

    async fn new_conversation(&self, credential: &str) -> Result<Conversation> {
        let user = self.auth.verify(credential).await?;
        self.storage.create(&user).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::conversation_service::tests::TestStorage;
    use super::super::tests::{TestAuth, TestProvider};
    use super::*;

    fn fixture() -> Live {
        let provider: Arc<dyn ProviderService> =
            Arc::new(TestProvider::new(vec![Ok("reply".to_string())]));
        let storage: Arc<dyn ConversationService> = Arc::new(TestStorage::in_memory().unwrap());
        let chat_service: Arc<dyn ChatService> = Arc::new(Service::chat_service(
            provider,
            storage.clone(),
            Duration::from_secs(5),
        ));

        Live {
            auth: Arc::new(TestAuth::new("user-001")),
            chat_service,
            storage,
        }
    }

    #[tokio::test]
    async fn test_invalid_credential_is_rejected() {
        let api = fixture();

        let result = api.conversations("forged-token").await;

        assert!(matches!(result, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_new_conversation_is_scoped_to_the_caller() {
        let api = fixture();

        let conversation = api.new_conversation("valid-token").await.unwrap();
        let listed = api.conversations("valid-token").await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, conversation.id);
    }

    #[tokio::test]
    async fn test_chat_requires_a_valid_credential() {
        let api = fixture();

        let result = api.chat("forged-token", ChatRequest::new("hello")).await;

        assert!(matches!(result, Err(Error::Unauthenticated)));
    }
}
