//! Mock text generator for tests
//!
//! Replays scripted responses in order and records every prompt it was
//! asked, so tests can assert both what the engine sent and how it
//! handled what came back (including failures).

use super::traits::TextGenerator;
use crate::error::PortalError;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted mock implementation of `TextGenerator`.
///
/// # Example
///
/// ```rust
/// use committee_portal::ai::{MockTextGenerator, TextGenerator};
///
/// # tokio_test::block_on(async {
/// let generator = MockTextGenerator::always("office supplies");
/// let text = generator.generate("categorize this", "any-model").await.unwrap();
/// assert_eq!(text, "office supplies");
/// # });
/// ```
pub struct MockTextGenerator {
    responses: Mutex<VecDeque<String>>,
    repeat_last: bool,
    /// Every `(prompt, model)` pair seen, in call order.
    pub prompts: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MockTextGenerator {
    /// A generator that answers with `responses` in order, then errors
    /// once the script is exhausted.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat_last: false,
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A generator that always answers `response`.
    pub fn always(response: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([response.to_string()])),
            repeat_last: true,
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A generator that fails every call (unreachable service).
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat_last: false,
            prompts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Number of generate calls made so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), model.to_string()));

        if self.fail {
            return Err(PortalError::ExternalServiceUnavailable(
                "mock generator configured to fail".to_string(),
            )
            .into());
        }

        let mut responses = self.responses.lock().unwrap();
        if self.repeat_last {
            return Ok(responses[0].clone());
        }
        responses.pop_front().ok_or_else(|| {
            PortalError::ExternalServiceUnavailable(
                "mock generator script exhausted".to_string(),
            )
            .into()
        })
    }
}
