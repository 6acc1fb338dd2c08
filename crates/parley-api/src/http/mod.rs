//! REST API surface: router, handlers, error mapping, auth extractor.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
