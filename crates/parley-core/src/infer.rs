//! Inference bridge port.
//!
//! `InferenceBridge` is the capability the orchestrator holds for turning a
//! prompt into a reply. The production implementation lives in
//! `parley-infra` and spawns one external process per call; swapping in a
//! persistent-worker or RPC backend only requires another implementation of
//! this trait.

use parley_types::error::InferenceError;

/// Turns one text prompt into one text reply.
///
/// Calls are independent: no state is shared between invocations, and no
/// retry is performed at this layer. Uses native async fn in traits
/// (RPITIT, Rust 2024 edition).
pub trait InferenceBridge: Send + Sync {
    /// Generate a reply for `prompt`.
    ///
    /// The prompt is guaranteed non-blank by the caller. On failure the
    /// error carries one of the classified failure kinds; the returned text
    /// on success is the generator's output verbatim.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, InferenceError>> + Send;
}
