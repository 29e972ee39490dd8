//! Prompt System - Template loading and rendering
//!
//! Built-in Handlebars templates for the planner, the dependency resolver and
//! the synthesis call, optionally replaced by files in a prompts directory.

mod loader;
mod render;
mod templates;

pub use loader::PromptLoader;
pub use render::PromptRenderer;
pub use templates::{
    PLAN_SYSTEM, PLAN_USER, PromptSet, RESOLVE_SYSTEM, RESOLVE_USER, SYNTHESIS_SYSTEM,
};
