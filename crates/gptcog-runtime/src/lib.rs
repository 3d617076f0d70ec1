//! # gptcog-runtime
//!
//! Completion-backed scenario validation for gptcog.
//!
//! ## Important
//!
//! This crate is OPTIONAL. Validation in `gptcog-core` is fully
//! deterministic and never calls a model.
//!
//! Use this crate to check that a model, asked to write a scenario for a
//! request, produces YAML that passes validation. The model backend is any
//! [`LlmProvider`]; none ships here.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gptcog_runtime::{CompletionValidationStep, RuntimeConfig};
//!
//! let step = CompletionValidationStep::new(Arc::new(my_provider), RuntimeConfig::default());
//! let outcome = step.run("gpt-4o", "Check that a support bot asks for an order number").await;
//! println!("{}", outcome.message());
//! ```

pub mod completion;
pub mod config;
pub mod prompts;
pub mod providers;

pub use completion::{
    strip_code_fence, CompletionRecord, CompletionValidation, CompletionValidationStep,
};
pub use config::RuntimeConfig;
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};

use thiserror::Error;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Completion failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid runtime configuration: {0}")]
    Config(String),
}
