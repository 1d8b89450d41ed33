//! TextGenerator trait definition
//!
//! Abstract interface for the generative-text capability. Follows the
//! same pattern as `RecordStore`: async trait + `Send + Sync` for
//! `Arc<dyn TextGenerator>` usage.
//!
//! Every consumer treats the capability as optional and unreliable: a
//! generator may be absent entirely, and a configured one may fail at
//! any time. Callers catch failures, log them, and continue with their
//! deterministic output.

use anyhow::Result;
use async_trait::async_trait;

/// Abstract interface for prompt-in, text-out generation.
///
/// # Implementations
///
/// - [`HttpTextGenerator`](super::HttpTextGenerator): HTTP client for any
///   OpenAI-compatible `/v1/chat/completions` endpoint
/// - [`MockTextGenerator`](super::MockTextGenerator): scripted responses
///   for tests
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt` using `model`.
    ///
    /// # Errors
    ///
    /// Returns an error when the capability is unreachable, unauthorized,
    /// or returns an unusable response. Callers must treat any error as
    /// "no suggestion available", never as a hard failure of their own
    /// operation.
    async fn generate(&self, prompt: &str, model: &str) -> Result<String>;
}
