//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/chats               - List the caller's conversations
//! - POST   /api/v1/chats               - Create a conversation
//! - GET    /api/v1/chats/{id}          - Get a conversation with messages
//! - DELETE /api/v1/chats/{id}          - Delete a conversation and messages
//! - POST   /api/v1/chats/{id}/messages - Send a message, get the reply pair
//!
//! Every handler resolves the caller via the `Authenticated` extractor and
//! passes the user id into the service; ownership is enforced there, not
//! here.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_types::chat::{Conversation, ConversationSummary, Message, MessagePair};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for conversation creation.
#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    /// Optional explicit title; defaults to the placeholder.
    pub title: Option<String>,
}

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// A conversation together with its ordered message log.
#[derive(Debug, Serialize)]
pub struct ChatWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// GET /api/v1/chats - List the caller's conversations.
pub async fn list_chats(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let chats = state.chat_service.list_conversations(&auth.user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(chats, request_id, elapsed)))
}

/// POST /api/v1/chats - Create a new conversation.
pub async fn create_chat(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreateChatRequest>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let chat = state
        .chat_service
        .create_conversation(&auth.user_id, body.title)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(chat, request_id, elapsed)))
}

/// GET /api/v1/chats/{id} - Get a conversation with its ordered messages.
pub async fn get_chat(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(chat_id): Path<String>,
) -> Result<Json<ApiResponse<ChatWithMessages>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&chat_id)?;
    let (conversation, messages) = state
        .chat_service
        .get_conversation(&auth.user_id, &id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        ChatWithMessages {
            conversation,
            messages,
        },
        request_id,
        elapsed,
    )))
}

/// DELETE /api/v1/chats/{id} - Delete a conversation and all its messages.
pub async fn delete_chat(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(chat_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&chat_id)?;
    state
        .chat_service
        .delete_conversation(&auth.user_id, &id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
        request_id,
        elapsed,
    )))
}

/// POST /api/v1/chats/{id}/messages - Send a message and return the pair.
pub async fn send_message(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(chat_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<MessagePair>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&chat_id)?;
    let pair = state
        .chat_service
        .send_message(&auth.user_id, &id, &body.content)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(pair, request_id, elapsed)))
}
