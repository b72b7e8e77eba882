//! Inference backends for studylog.

pub mod claude_inference_service;
pub mod prompts;

pub use claude_inference_service::ClaudeInferenceService;
pub use prompts::{PromptRenderer, RenderedPrompt};
