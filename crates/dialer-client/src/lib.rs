//! HTTP client for the remote routing/chat/export API.
//!
//! The backend is an external collaborator: this crate only knows the
//! three endpoints the call flow consumes and the degraded local
//! continuation for each. Routing failures yield a fixed generic agent
//! so the user always reaches a call; export failures fall back to
//! rendering the transcript locally in the same three formats.

mod client;
mod error;
pub mod export;

pub use client::{fallback_agent, ApiClient};
pub use error::ClientError;
