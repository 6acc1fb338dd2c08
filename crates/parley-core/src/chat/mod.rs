//! Conversation persistence abstractions and the message-exchange service.
//!
//! This module defines the `ConversationRepository` trait that the
//! infrastructure layer implements, the title derivation policy, and the
//! `ChatService` orchestrator built on top of both ports.

pub mod repository;
pub mod service;
pub mod title;
