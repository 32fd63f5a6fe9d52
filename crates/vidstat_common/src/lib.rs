//! Vidstat Common - Shared types for the vidstat analytics bot.
//!
//! Holds the query-intent schema and its validator, the Ollama wire
//! protocol types, and the fixed instruction prompt. Both the daemon's
//! parse paths and its query compiler consume these.

pub mod intent;
pub mod ollama;
pub mod prompts;

pub use intent::*;
pub use ollama::*;
