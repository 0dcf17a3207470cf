//! Prompt System - fix prompt rendering
//!
//! Renders the text handed to the fix collaborator using Handlebars.

mod render;

pub use render::{BUILD_TEMPLATE, DEBUG_TEMPLATE, PromptContext, PromptRenderer};
