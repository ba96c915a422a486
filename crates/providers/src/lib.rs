//! LLM Provider implementations for expertkit.
//!
//! All providers implement the `expertkit_core::Provider` trait. Wire formats
//! stay inside each provider; the rest of the workspace only sees
//! `expertkit_core::Message`.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
