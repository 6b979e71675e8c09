//! # Fieldhand Core
//!
//! Domain types, capability traits, and error definitions for the Fieldhand
//! farm assistant. This crate has **no framework dependencies**: it defines
//! the domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (LLM, database, chart renderer, weather
//! service) is a trait here. Implementations live in their own crates, which
//! keeps the agent loop testable with plain stubs.

pub mod capability;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use capability::{ChartPoint, ChartRenderer, QueryOutcome, SqlExecutor, SqlValue, WeatherReport, WeatherService};
pub use error::{DatabaseError, Error, LoopError, ProviderError, Result, ToolError};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{CompletionRequest, CompletionResponse, Provider, Usage};
pub use tool::{Tool, ToolRegistry};
