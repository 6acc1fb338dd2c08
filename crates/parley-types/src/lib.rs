//! Shared domain types for Parley.
//!
//! This crate contains the conversation and message types used across the
//! Parley service, plus the error taxonomies for storage, inference, and
//! the chat operation surface.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod error;
