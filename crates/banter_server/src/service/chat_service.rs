use std::sync::Arc;
use std::time::Duration;

use banter_domain::{ChatRequest, ChatResponse, Conversation, Message, ResultStream, UserId};
use banter_provider::ProviderService;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use super::conversation_service::ConversationService;
use super::Service;
use crate::{Error, Result};

/// Bridges one chat turn to the provider and the store, relaying the reply
/// to the caller chunk by chunk as it arrives.
#[async_trait::async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, user: UserId, chat: ChatRequest) -> ResultStream<ChatResponse, Error>;
}

impl Service {
    pub fn chat_service(
        provider: Arc<dyn ProviderService>,
        storage: Arc<dyn ConversationService>,
        provider_timeout: Duration,
    ) -> impl ChatService {
        Live {
            provider,
            storage,
            provider_timeout,
        }
    }
}

#[derive(Clone)]
struct Live {
    provider: Arc<dyn ProviderService>,
    storage: Arc<dyn ConversationService>,
    provider_timeout: Duration,
}

impl Live {
    /// Relays provider fragments to the caller while accumulating the full
    /// reply; the assistant message is persisted only once the stream is
    /// exhausted. A failure mid-stream persists nothing.
    async fn chat_turn(
        &self,
        user: UserId,
        conversation: Conversation,
        prompt: String,
        tx: tokio::sync::mpsc::Sender<Result<ChatResponse>>,
    ) -> Result<()> {
        let mut fragments = tokio::time::timeout(self.provider_timeout, self.provider.stream(&prompt))
            .await
            .map_err(|_| Error::ProviderTimeout)??;

        let mut reply = String::new();

        loop {
            let fragment = tokio::time::timeout(self.provider_timeout, fragments.next())
                .await
                .map_err(|_| Error::ProviderTimeout)?;

            let Some(fragment) = fragment else { break };
            let fragment = fragment?;

            if fragment.is_empty() {
                continue;
            }

            reply.push_str(&fragment);
            if tx.send(Ok(ChatResponse::Text(fragment))).await.is_err() {
                // Caller disconnected; abandon the turn without persisting
                // the unfinished reply.
                return Ok(());
            }
        }

        self.storage
            .append(&user, Some(conversation.id), Message::assistant(reply))
            .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatService for Live {
    async fn chat(&self, user: UserId, chat: ChatRequest) -> ResultStream<ChatResponse, Error> {
        if chat.prompt.trim().is_empty() {
            return Err(Error::InvalidRequest("Prompt is required".to_string()));
        }

        // The user message is persisted before any streaming starts; an
        // absent id creates the conversation here.
        let conversation = self
            .storage
            .append(&user, chat.chat_id, Message::user(chat.prompt.clone()))
            .await?;

        let (tx, rx) = tokio::sync::mpsc::channel(1);

        let that = self.clone();
        tokio::spawn(async move {
            match that
                .chat_turn(user, conversation, chat.prompt, tx.clone())
                .await
            {
                Ok(_) => {
                    let _ = tx.send(Ok(ChatResponse::Done)).await;
                }
                Err(error) => {
                    let _ = tx.send(Err(error)).await;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;

    use super::super::conversation_service::tests::TestStorage;
    use super::super::tests::TestProvider;
    use super::*;
    use banter_domain::Role;

    struct Fixture {
        chat: Live,
        provider: Arc<TestProvider>,
        storage: Arc<dyn ConversationService>,
    }

    impl Fixture {
        fn new(fragments: Vec<std::result::Result<String, banter_provider::Error>>) -> Self {
            let provider = Arc::new(TestProvider::new(fragments));
            let storage: Arc<dyn ConversationService> =
                Arc::new(TestStorage::in_memory().unwrap());
            let chat = Live {
                provider: provider.clone(),
                storage: storage.clone(),
                provider_timeout: Duration::from_secs(5),
            };

            Self {
                chat,
                provider,
                storage,
            }
        }

        fn fragments(texts: Vec<&str>) -> Vec<std::result::Result<String, banter_provider::Error>> {
            texts.into_iter().map(|text| Ok(text.to_string())).collect()
        }

        async fn run(&self, request: ChatRequest) -> Vec<Result<ChatResponse>> {
            self.chat
                .chat(UserId::new("user-001"), request)
                .await
                .unwrap()
                .collect()
                .await
        }
    }

    fn user() -> UserId {
        UserId::new("user-001")
    }

    #[tokio::test]
    async fn test_fragments_stream_in_arrival_order() {
        let fixture = Fixture::new(Fixture::fragments(vec!["Hel", "lo"]));

        let actual: Vec<ChatResponse> = fixture
            .run(ChatRequest::new("Say hello"))
            .await
            .into_iter()
            .map(|message| message.unwrap())
            .collect();

        let expected = vec![
            ChatResponse::Text("Hel".to_string()),
            ChatResponse::Text("lo".to_string()),
            ChatResponse::Done,
        ];
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_turn_persists_user_then_full_assistant_message() {
        let fixture = Fixture::new(Fixture::fragments(vec!["Hel", "lo"]));

        fixture.run(ChatRequest::new("Say hello")).await;

        let conversations = fixture.storage.list(&user()).await.unwrap();
        assert_eq!(conversations.len(), 1);

        let roles_and_contents: Vec<(Role, &str)> = conversations[0]
            .messages
            .iter()
            .map(|message| (message.role, message.content.as_str()))
            .collect();

        assert_eq!(
            roles_and_contents,
            vec![(Role::User, "Say hello"), (Role::Assistant, "Hello")]
        );
    }

    #[tokio::test]
    async fn test_turn_appends_to_an_existing_conversation() {
        let fixture = Fixture::new(Fixture::fragments(vec!["answer"]));
        let conversation = fixture.storage.create(&user()).await.unwrap();

        fixture
            .run(ChatRequest::new("question").chat_id(conversation.id))
            .await;

        let stored = fixture.storage.get(&user(), conversation.id).await.unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[0].content, "question");
        assert_eq!(stored.messages[1].content, "answer");
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_before_any_side_effect() {
        let fixture = Fixture::new(Fixture::fragments(vec!["unreachable"]));

        let result = fixture.chat.chat(user(), ChatRequest::new("   ")).await;

        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(fixture.provider.call_count(), 0);
        assert!(fixture.storage.list(&user()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_user_message_only() {
        let fixture = Fixture::new(vec![
            Ok("par".to_string()),
            Err(banter_provider::Error::EmptyResponse),
        ]);

        let responses = fixture.run(ChatRequest::new("doomed prompt")).await;

        assert_eq!(
            responses[0].as_ref().unwrap(),
            &ChatResponse::Text("par".to_string())
        );
        assert!(responses[1].is_err());

        let conversations = fixture.storage.list(&user()).await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].messages.len(), 1);
        assert_eq!(conversations[0].messages[0].role, Role::User);
    }
}
