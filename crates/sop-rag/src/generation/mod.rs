//! Answer generation: prompt construction and the inference call

pub mod answerer;
pub mod prompt;

pub use answerer::Answerer;
pub use prompt::PromptBuilder;
