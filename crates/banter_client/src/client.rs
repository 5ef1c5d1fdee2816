use banter_domain::{ChatRequest, Conversation, ConversationId};
use tokio_stream::StreamExt;
use tracing::error;

use crate::gateway::GatewayService;
use crate::state::ChatState;
use crate::Result;

/// Drives the gateway and keeps `ChatState` current while a reply streams.
pub struct ChatClient<G> {
    gateway: G,
    state: ChatState,
}

impl<G: GatewayService> ChatClient<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: ChatState::new(),
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn select(&mut self, id: ConversationId) -> bool {
        self.state.select(id)
    }

    pub async fn load_conversations(&mut self) -> Result<()> {
        let chats = self.gateway.chats().await?;
        self.state.set_chats(chats);
        Ok(())
    }

    pub async fn create_conversation(&mut self) -> Result<ConversationId> {
        let id = self.gateway.new_chat().await?;
        self.state.insert_new(Conversation::new().id(id));
        Ok(id)
    }

    /// Streams one chat turn, handing each fragment to `on_fragment` as it
    /// arrives. A no-op when nothing is selected or a send is in flight.
    /// A mid-stream failure is logged and leaves whatever partial text had
    /// already arrived.
    pub async fn send_message(
        &mut self,
        text: &str,
        mut on_fragment: impl FnMut(&str),
    ) -> Result<()> {
        let Some(chat_id) = self.state.current else {
            return Ok(());
        };
        if self.state.sending {
            return Ok(());
        }

        self.state.sending = true;
        self.state.push_user(text);

        let request = ChatRequest::new(text).chat_id(chat_id);
        let result = self.stream_reply(request, &mut on_fragment).await;
        self.state.sending = false;

        if let Err(error) = result {
            error!("Chat stream failed: {}", error);
            return Ok(());
        }

        // Re-fetch to pick up server-assigned timestamps.
        self.load_conversations().await
    }

    async fn stream_reply(
        &mut self,
        request: ChatRequest,
        on_fragment: &mut impl FnMut(&str),
    ) -> Result<()> {
        let mut fragments = self.gateway.send(request).await?;

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            self.state.apply_fragment(&fragment);
            on_fragment(&fragment);
        }

        Ok(())
    }
}
