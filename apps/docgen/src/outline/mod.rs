// Outline pipeline: LLM text -> section/slide tree -> budget-trimmed outline.
// All completion calls go through llm_client::CompletionBackend.

pub mod budget;
pub mod fallback;
pub mod generator;
pub mod heuristics;
pub mod model;
pub mod prompts;
pub mod repair;
pub mod user_content;

// Re-export the public API consumed by the pipeline and the CLI.
pub use generator::{generate_outline, OutlineRequest};
pub use model::{DocumentFormat, Outline};
pub use user_content::UserContent;
