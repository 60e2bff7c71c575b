//! Session management and conversation handling
//!
//! This module provides the in-memory session registry, the conversation
//! records it holds, title generation, and the controller that runs user
//! turns against them.

mod conversation;
mod controller;
mod errors;
mod registry;
mod title;

pub use conversation::*;
pub use controller::*;
pub use errors::*;
pub use registry::*;
pub use title::*;
