//! Inference and counting collaborators for strata.
//!
//! - [`OpenAiCompatClient`] — chat completions + embeddings against any
//!   OpenAI-compatible endpoint (Ollama, vLLM, hosted APIs)
//! - [`HfTokenCounter`] — precise token counting from a HuggingFace
//!   `tokenizer.json`

pub mod openai_compat;
pub mod tokenizer;

pub use openai_compat::OpenAiCompatClient;
pub use tokenizer::HfTokenCounter;
