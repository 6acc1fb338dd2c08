//! Business logic and repository trait definitions for Parley.
//!
//! This crate defines the "ports" (the conversation repository trait and the
//! inference bridge trait) that the infrastructure layer implements. It
//! depends only on `parley-types` -- never on `parley-infra` or any
//! database/process crate.

pub mod chat;
pub mod infer;
