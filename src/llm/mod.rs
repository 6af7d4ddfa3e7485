pub mod client;
pub mod prompts;

pub use client::GeminiClient;
pub use prompts::{build_analysis_prompt, SAMPLE_ROW_LIMIT};
