//! ConversationRepository trait definition.
//!
//! Provides CRUD operations for conversations and messages with ownership
//! enforcement and ordering guarantees.

use parley_types::chat::{Conversation, ConversationSummary, Message};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteConversationRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Ownership enforcement is centralized in [`get_owned`](Self::get_owned):
/// it returns the same `NotFound` whether the conversation is absent or
/// owned by someone else, and every owner-facing operation goes through it.
/// The message-level operations deliberately take only a conversation id --
/// the service checks ownership once per logical operation, not per append.
pub trait ConversationRepository: Send + Sync {
    /// List conversations owned by `owner_id`, ordered by `updated_at` DESC.
    fn list_conversations(
        &self,
        owner_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, RepositoryError>> + Send;

    /// Persist a new, empty conversation.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the conversation with `conversation_id` if it is owned by
    /// `owner_id`.
    ///
    /// Fails with `RepositoryError::NotFound` both when the conversation
    /// does not exist and when it belongs to another owner; the two cases
    /// are indistinguishable to the caller.
    fn get_owned(
        &self,
        owner_id: &str,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get all messages of a conversation, ordered by `created_at` ASC.
    fn get_messages(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Delete a conversation and all of its messages.
    ///
    /// Messages are deleted first, then the conversation, atomically -- a
    /// concurrent reader never observes orphaned messages.
    fn delete_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a message and bump the conversation's `updated_at`.
    ///
    /// Fails with `RepositoryError::NotFound` if the conversation row does
    /// not exist. Performs no ownership check.
    fn append_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Total number of messages in a conversation.
    fn count_messages(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;

    /// Overwrite the conversation title and bump `updated_at`.
    fn update_title(
        &self,
        conversation_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
