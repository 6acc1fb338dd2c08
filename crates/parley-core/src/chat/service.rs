//! Chat service orchestrating conversation lifecycle and message exchange.
//!
//! `ChatService` composes the conversation repository and the inference
//! bridge into the user-visible operations. The one with real sequencing in
//! it is [`send_message`](ChatService::send_message): append the user
//! message, invoke the bridge, append the reply, and derive the title after
//! the first exchange.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parley_types::chat::{
    Conversation, ConversationSummary, DEFAULT_TITLE, Message, MessagePair, MessageRole,
};
use parley_types::error::ChatError;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::repository::ConversationRepository;
use crate::chat::title::{derive_title, FIRST_EXCHANGE_MESSAGE_COUNT};
use crate::infer::InferenceBridge;

/// Orchestrates conversation CRUD and the send-and-reply exchange.
///
/// Generic over `ConversationRepository` and `InferenceBridge` to maintain
/// clean architecture (parley-core never depends on parley-infra).
///
/// Sends are serialized per conversation: a `DashMap` of per-conversation
/// async mutexes guarantees that two concurrent exchanges on the same
/// conversation never interleave their message pairs, while exchanges on
/// different conversations run fully concurrently.
pub struct ChatService<R: ConversationRepository, B: InferenceBridge> {
    repo: R,
    bridge: B,
    send_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<R: ConversationRepository, B: InferenceBridge> ChatService<R, B> {
    /// Create a new chat service with the given repository and bridge.
    pub fn new(repo: R, bridge: B) -> Self {
        Self {
            repo,
            bridge,
            send_locks: DashMap::new(),
        }
    }

    /// List the caller's conversations, most recently active first.
    pub async fn list_conversations(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        Ok(self.repo.list_conversations(owner_id).await?)
    }

    /// Create a new, empty conversation.
    ///
    /// The title defaults to the `"New Chat"` placeholder; the first
    /// exchange replaces it with a preview of the user's message.
    pub async fn create_conversation(
        &self,
        owner_id: &str,
        title: Option<String>,
    ) -> Result<Conversation, ChatError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            owner_id: owner_id.to_string(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.repo.create_conversation(&conversation).await?;
        info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    /// Get a conversation with its messages ordered by creation time.
    ///
    /// Fails with `ChatError::NotFound` when the conversation is absent or
    /// belongs to another owner; the two cases are indistinguishable.
    pub async fn get_conversation(
        &self,
        owner_id: &str,
        conversation_id: &Uuid,
    ) -> Result<(Conversation, Vec<Message>), ChatError> {
        let conversation = self.repo.get_owned(owner_id, conversation_id).await?;
        let messages = self.repo.get_messages(conversation_id).await?;
        Ok((conversation, messages))
    }

    /// Delete a conversation and all of its messages.
    ///
    /// Same ownership/existence check as [`get_conversation`](Self::get_conversation).
    pub async fn delete_conversation(
        &self,
        owner_id: &str,
        conversation_id: &Uuid,
    ) -> Result<(), ChatError> {
        self.repo.get_owned(owner_id, conversation_id).await?;
        self.repo.delete_conversation(conversation_id).await?;
        self.send_locks.remove(conversation_id);
        info!(conversation_id = %conversation_id, "Conversation deleted");
        Ok(())
    }

    /// Send a user message and return the persisted (user, assistant) pair.
    ///
    /// The exchange holds the conversation's send lock from the ownership
    /// check through the title update, so concurrent sends on one
    /// conversation cannot interleave their pairs.
    ///
    /// If the bridge fails, the already-appended user message is kept: user
    /// input is never silently lost because the assistant failed. The
    /// caller sees the failure as `ChatError::Inference` carrying the kind.
    #[tracing::instrument(name = "send_message", skip(self, content), fields(conversation_id = %conversation_id))]
    pub async fn send_message(
        &self,
        owner_id: &str,
        conversation_id: &Uuid,
        content: &str,
    ) -> Result<MessagePair, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::InvalidInput(
                "message content must not be empty".to_string(),
            ));
        }

        let lock = self
            .send_locks
            .entry(*conversation_id)
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        self.repo.get_owned(owner_id, conversation_id).await?;

        let user_message = Message {
            id: Uuid::now_v7(),
            conversation_id: *conversation_id,
            role: MessageRole::User,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.repo.append_message(&user_message).await?;

        let reply = match self.bridge.generate(content).await {
            Ok(reply) => reply,
            Err(e) => {
                // The user message stays; only the reply is missing.
                warn!(conversation_id = %conversation_id, error = %e, "Inference failed");
                return Err(ChatError::Inference(e));
            }
        };

        let assistant_message = Message {
            id: Uuid::now_v7(),
            conversation_id: *conversation_id,
            role: MessageRole::Assistant,
            content: reply,
            created_at: Utc::now(),
        };
        self.repo.append_message(&assistant_message).await?;

        let count = self.repo.count_messages(conversation_id).await?;
        if count <= FIRST_EXCHANGE_MESSAGE_COUNT {
            let title = derive_title(content);
            self.repo.update_title(conversation_id, &title).await?;
            info!(conversation_id = %conversation_id, title = %title, "Conversation title derived");
        }

        Ok(MessagePair {
            user_message,
            assistant_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::error::{InferenceError, RepositoryError};
    use std::time::Duration;

    /// In-memory repository double preserving insertion order.
    #[derive(Default)]
    struct MemoryRepository {
        inner: std::sync::Mutex<MemoryState>,
    }

    #[derive(Default)]
    struct MemoryState {
        conversations: Vec<Conversation>,
        messages: Vec<Message>,
    }

    impl ConversationRepository for MemoryRepository {
        async fn list_conversations(
            &self,
            owner_id: &str,
        ) -> Result<Vec<ConversationSummary>, RepositoryError> {
            let state = self.inner.lock().unwrap();
            let mut summaries: Vec<ConversationSummary> = state
                .conversations
                .iter()
                .filter(|c| c.owner_id == owner_id)
                .cloned()
                .map(Into::into)
                .collect();
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        }

        async fn create_conversation(
            &self,
            conversation: &Conversation,
        ) -> Result<(), RepositoryError> {
            let mut state = self.inner.lock().unwrap();
            state.conversations.push(conversation.clone());
            Ok(())
        }

        async fn get_owned(
            &self,
            owner_id: &str,
            conversation_id: &Uuid,
        ) -> Result<Conversation, RepositoryError> {
            let state = self.inner.lock().unwrap();
            state
                .conversations
                .iter()
                .find(|c| c.id == *conversation_id && c.owner_id == owner_id)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        }

        async fn get_messages(
            &self,
            conversation_id: &Uuid,
        ) -> Result<Vec<Message>, RepositoryError> {
            let state = self.inner.lock().unwrap();
            Ok(state
                .messages
                .iter()
                .filter(|m| m.conversation_id == *conversation_id)
                .cloned()
                .collect())
        }

        async fn delete_conversation(
            &self,
            conversation_id: &Uuid,
        ) -> Result<(), RepositoryError> {
            let mut state = self.inner.lock().unwrap();
            state.messages.retain(|m| m.conversation_id != *conversation_id);
            let before = state.conversations.len();
            state.conversations.retain(|c| c.id != *conversation_id);
            if state.conversations.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        }

        async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
            let mut state = self.inner.lock().unwrap();
            let conversation = state
                .conversations
                .iter_mut()
                .find(|c| c.id == message.conversation_id)
                .ok_or(RepositoryError::NotFound)?;
            conversation.updated_at = message.created_at;
            state.messages.push(message.clone());
            Ok(())
        }

        async fn count_messages(&self, conversation_id: &Uuid) -> Result<u32, RepositoryError> {
            let state = self.inner.lock().unwrap();
            Ok(state
                .messages
                .iter()
                .filter(|m| m.conversation_id == *conversation_id)
                .count() as u32)
        }

        async fn update_title(
            &self,
            conversation_id: &Uuid,
            title: &str,
        ) -> Result<(), RepositoryError> {
            let mut state = self.inner.lock().unwrap();
            let conversation = state
                .conversations
                .iter_mut()
                .find(|c| c.id == *conversation_id)
                .ok_or(RepositoryError::NotFound)?;
            conversation.title = title.to_string();
            conversation.updated_at = Utc::now();
            Ok(())
        }
    }

    /// Bridge double: echoes, fails, or echoes after a delay.
    enum StubBridge {
        Echo,
        ModelError,
        SlowEcho(Duration),
    }

    impl InferenceBridge for StubBridge {
        async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
            match self {
                StubBridge::Echo => Ok(format!("reply: {prompt}")),
                StubBridge::ModelError => Err(InferenceError::Model("bad prompt".to_string())),
                StubBridge::SlowEcho(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(format!("reply: {prompt}"))
                }
            }
        }
    }

    fn service(bridge: StubBridge) -> ChatService<MemoryRepository, StubBridge> {
        ChatService::new(MemoryRepository::default(), bridge)
    }

    #[tokio::test]
    async fn test_send_message_rejects_blank_content() {
        let svc = service(StubBridge::Echo);
        let conversation = svc.create_conversation("alice", None).await.unwrap();

        for content in ["", "   ", "\t\n"] {
            let err = svc
                .send_message("alice", &conversation.id, content)
                .await
                .unwrap_err();
            assert!(matches!(err, ChatError::InvalidInput(_)), "content {content:?}");
        }

        // Nothing was persisted.
        let (_, messages) = svc.get_conversation("alice", &conversation.id).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_unknown_and_foreign_conversation_look_alike() {
        let svc = service(StubBridge::Echo);
        let conversation = svc.create_conversation("alice", None).await.unwrap();

        let missing = svc
            .send_message("alice", &Uuid::now_v7(), "hi")
            .await
            .unwrap_err();
        let foreign = svc
            .send_message("mallory", &conversation.id, "hi")
            .await
            .unwrap_err();

        assert!(matches!(missing, ChatError::NotFound));
        assert!(matches!(foreign, ChatError::NotFound));
    }

    #[tokio::test]
    async fn test_send_message_appends_ordered_pair() {
        let svc = service(StubBridge::Echo);
        let conversation = svc.create_conversation("alice", None).await.unwrap();

        let pair = svc
            .send_message("alice", &conversation.id, "Hello there")
            .await
            .unwrap();
        assert_eq!(pair.user_message.role, MessageRole::User);
        assert_eq!(pair.user_message.content, "Hello there");
        assert_eq!(pair.assistant_message.role, MessageRole::Assistant);
        assert_eq!(pair.assistant_message.content, "reply: Hello there");

        let (_, messages) = svc.get_conversation("alice", &conversation.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, pair.user_message.id);
        assert_eq!(messages[1].id, pair.assistant_message.id);
    }

    #[tokio::test]
    async fn test_n_exchanges_yield_alternating_log() {
        let svc = service(StubBridge::Echo);
        let conversation = svc.create_conversation("alice", None).await.unwrap();

        for i in 0..4 {
            svc.send_message("alice", &conversation.id, &format!("message {i}"))
                .await
                .unwrap();
        }

        let (_, messages) = svc.get_conversation("alice", &conversation.id).await.unwrap();
        assert_eq!(messages.len(), 8);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[1].role, MessageRole::Assistant);
            assert_eq!(pair[1].content, format!("reply: {}", pair[0].content));
        }
    }

    #[tokio::test]
    async fn test_title_derived_on_first_exchange_only() {
        let svc = service(StubBridge::Echo);
        let conversation = svc.create_conversation("alice", None).await.unwrap();
        assert_eq!(conversation.title, "New Chat");

        svc.send_message(
            "alice",
            &conversation.id,
            "The quick brown fox jumps over the lazy dog",
        )
        .await
        .unwrap();

        let (loaded, _) = svc.get_conversation("alice", &conversation.id).await.unwrap();
        assert_eq!(loaded.title, "The quick brown fox jumps...");

        svc.send_message("alice", &conversation.id, "Completely different topic now")
            .await
            .unwrap();

        let (loaded, _) = svc.get_conversation("alice", &conversation.id).await.unwrap();
        assert_eq!(loaded.title, "The quick brown fox jumps...");
    }

    #[tokio::test]
    async fn test_inference_failure_keeps_user_message() {
        let svc = service(StubBridge::ModelError);
        let conversation = svc.create_conversation("alice", None).await.unwrap();

        let err = svc
            .send_message("alice", &conversation.id, "will fail")
            .await
            .unwrap_err();
        match err {
            ChatError::Inference(InferenceError::Model(msg)) => assert_eq!(msg, "bad prompt"),
            other => panic!("unexpected: {other:?}"),
        }

        let (loaded, messages) = svc.get_conversation("alice", &conversation.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "will fail");
        // No exchange completed, so the placeholder title stays.
        assert_eq!(loaded.title, "New Chat");
    }

    #[tokio::test]
    async fn test_list_conversations_is_owner_scoped() {
        let svc = service(StubBridge::Echo);
        svc.create_conversation("alice", Some("A".to_string())).await.unwrap();
        svc.create_conversation("bob", Some("B".to_string())).await.unwrap();

        let alice = svc.list_conversations("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].title, "A");

        let nobody = svc.list_conversations("carol").await.unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn test_delete_conversation_checks_ownership() {
        let svc = service(StubBridge::Echo);
        let conversation = svc.create_conversation("alice", None).await.unwrap();

        let err = svc
            .delete_conversation("mallory", &conversation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound));

        svc.delete_conversation("alice", &conversation.id).await.unwrap();
        let err = svc
            .get_conversation("alice", &conversation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound));
    }

    #[tokio::test]
    async fn test_concurrent_sends_never_interleave_pairs() {
        let svc = Arc::new(service(StubBridge::SlowEcho(Duration::from_millis(20))));
        let conversation = svc.create_conversation("alice", None).await.unwrap();

        let a = {
            let svc = svc.clone();
            let id = conversation.id;
            tokio::spawn(async move { svc.send_message("alice", &id, "from A").await })
        };
        let b = {
            let svc = svc.clone();
            let id = conversation.id;
            tokio::spawn(async move { svc.send_message("alice", &id, "from B").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let (_, messages) = svc.get_conversation("alice", &conversation.id).await.unwrap();
        assert_eq!(messages.len(), 4);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[1].role, MessageRole::Assistant);
            // The reply directly following a user message must answer it.
            assert_eq!(pair[1].content, format!("reply: {}", pair[0].content));
        }
    }

    #[tokio::test]
    async fn test_concurrent_sends_on_different_conversations_proceed() {
        let svc = Arc::new(service(StubBridge::SlowEcho(Duration::from_millis(20))));
        let c1 = svc.create_conversation("alice", None).await.unwrap();
        let c2 = svc.create_conversation("alice", None).await.unwrap();

        let (r1, r2) = tokio::join!(
            svc.send_message("alice", &c1.id, "one"),
            svc.send_message("alice", &c2.id, "two"),
        );
        r1.unwrap();
        r2.unwrap();

        let (_, m1) = svc.get_conversation("alice", &c1.id).await.unwrap();
        let (_, m2) = svc.get_conversation("alice", &c2.id).await.unwrap();
        assert_eq!(m1.len(), 2);
        assert_eq!(m2.len(), 2);
    }
}
