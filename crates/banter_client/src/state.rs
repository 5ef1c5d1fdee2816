use banter_domain::{Conversation, ConversationId, Message, Role};

/// Client-side cache of conversations plus the live state of an in-flight
/// assistant reply.
#[derive(Default, Clone)]
pub struct ChatState {
    pub chats: Vec<Conversation>,
    pub current: Option<ConversationId>,
    pub sending: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached list; the gateway returns it most-recent first.
    /// On first load with nothing selected, the most recent is selected.
    pub fn set_chats(&mut self, chats: Vec<Conversation>) {
        if self.current.is_none() {
            self.current = chats.first().map(|chat| chat.id);
        }
        self.chats = chats;
    }

    pub fn insert_new(&mut self, conversation: Conversation) {
        self.current = Some(conversation.id);
        self.chats.insert(0, conversation);
    }

    /// Selects a stored conversation; unknown ids leave the selection alone.
    pub fn select(&mut self, id: ConversationId) -> bool {
        let known = self.chats.iter().any(|chat| chat.id == id);
        if known {
            self.current = Some(id);
        }
        known
    }

    pub fn current_chat(&self) -> Option<&Conversation> {
        let id = self.current?;
        self.chats.iter().find(|chat| chat.id == id)
    }

    fn current_chat_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.current?;
        self.chats.iter_mut().find(|chat| chat.id == id)
    }

    /// Local echo of the prompt, rendered before the reply starts arriving.
    pub fn push_user(&mut self, text: impl Into<String>) {
        if let Some(chat) = self.current_chat_mut() {
            chat.messages.push(Message::user(text));
        }
    }

    /// The first fragment of a reply starts a new assistant message; later
    /// fragments grow it in place rather than appearing as new messages.
    pub fn apply_fragment(&mut self, fragment: &str) {
        let Some(chat) = self.current_chat_mut() else {
            return;
        };

        match chat.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => last.content.push_str(fragment),
            _ => chat.messages.push(Message::assistant(fragment)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn conversation() -> Conversation {
        Conversation::new()
    }

    #[test]
    fn test_first_load_selects_the_most_recent() {
        let mut state = ChatState::new();
        let recent = conversation();
        let older = conversation();

        state.set_chats(vec![recent.clone(), older]);

        assert_eq!(state.current, Some(recent.id));
    }

    #[test]
    fn test_reload_preserves_the_selection() {
        let mut state = ChatState::new();
        let first = conversation();
        let second = conversation();

        state.set_chats(vec![first.clone(), second.clone()]);
        state.select(second.id);
        state.set_chats(vec![second.clone(), first]);

        assert_eq!(state.current, Some(second.id));
    }

    #[test]
    fn test_insert_new_prepends_and_selects() {
        let mut state = ChatState::new();
        state.set_chats(vec![conversation()]);

        let fresh = conversation();
        state.insert_new(fresh.clone());

        assert_eq!(state.chats[0].id, fresh.id);
        assert_eq!(state.current, Some(fresh.id));
    }

    #[test]
    fn test_select_ignores_unknown_ids() {
        let mut state = ChatState::new();
        let known = conversation();
        state.set_chats(vec![known.clone()]);

        let selected = state.select(ConversationId::generate());

        assert!(!selected);
        assert_eq!(state.current, Some(known.id));
    }

    #[test]
    fn test_first_fragment_starts_an_assistant_message() {
        let mut state = ChatState::new();
        state.insert_new(conversation());
        state.push_user("question");

        state.apply_fragment("Hel");

        let messages = &state.current_chat().unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hel");
    }

    #[test]
    fn test_later_fragments_grow_the_reply_in_place() {
        let mut state = ChatState::new();
        state.insert_new(conversation());
        state.push_user("question");

        state.apply_fragment("Hel");
        state.apply_fragment("lo");

        let messages = &state.current_chat().unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hello");
    }

    #[test]
    fn test_fragments_without_a_selection_are_dropped() {
        let mut state = ChatState::new();

        state.apply_fragment("orphan");

        assert!(state.chats.is_empty());
    }
}
