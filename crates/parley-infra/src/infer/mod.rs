//! Inference bridge implementations.
//!
//! One implementation today: [`subprocess::SubprocessBridge`], which runs
//! the external generation program as a child process per call.

pub mod subprocess;

pub use subprocess::SubprocessBridge;
