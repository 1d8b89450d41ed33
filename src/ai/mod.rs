//! Generative-text capability
//!
//! The portal treats text generation as an opaque, optional, unreliable
//! collaborator. Architecture follows the project pattern
//! (trait + impl + mock):
//! - `TextGenerator` trait: async prompt-in, text-out interface
//! - `HttpTextGenerator`: real implementation for any OpenAI-compatible
//!   `/v1/chat/completions` endpoint
//! - `MockTextGenerator`: scripted mock for tests

pub mod mock;
pub mod provider;
pub mod traits;

pub use mock::MockTextGenerator;
pub use provider::HttpTextGenerator;
pub use traits::TextGenerator;
