// Optimization core: scoring, content generation, merge rules, and the
// cycle controller. All LLM calls go through llm_client — no direct
// Anthropic SDK calls here.

pub mod content;
pub mod controller;
pub mod gap_bullets;
pub mod handlers;
pub mod history;
pub mod merge;
pub mod options;
pub mod prompts;
pub mod reducer;
pub mod scoring;
