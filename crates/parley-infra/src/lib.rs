//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: SQLite
//! storage for conversations and messages, and the subprocess inference
//! bridge that delegates prompt generation to an external program.

pub mod config;
pub mod infer;
pub mod sqlite;
