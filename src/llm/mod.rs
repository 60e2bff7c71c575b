//! LLM provider abstractions and implementations
//!
//! A single non-streaming chat completion interface shared by the answering
//! service and the title generator, with OpenAI-compatible and Ollama
//! backends.

pub mod provider;
pub mod types;
pub mod openai;
pub mod ollama;
pub mod errors;

pub use provider::*;
pub use types::*;
pub use errors::*;
