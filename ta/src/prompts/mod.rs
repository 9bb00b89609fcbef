//! Handlebars templates for LLM prompts and markdown reports

mod embedded;
mod loader;

pub use loader::PromptLoader;
