//! LLM completion providers for Fieldhand.
//!
//! All providers implement the `fieldhand_core::Provider` trait.
//! [`router::build_from_config`] selects one from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, resolve_model};
