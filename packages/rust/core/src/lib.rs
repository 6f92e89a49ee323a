//! Core domain logic for gardenlink.
//!
//! This crate ties the garden store, the content proxy and the completion
//! service together into the agent tool set. The centerpiece is
//! [`GraphTraversalAssembler`], which walks wikilinks breadth-first from a
//! seed text and filters what it gathered for relevance to a goal.

pub mod completion;
pub mod explore;
pub mod progress;
pub mod tools;

#[cfg(test)]
mod testing;

pub use completion::{OpenRouterCompletion, TextCompletion};
pub use explore::{GraphTraversalAssembler, MAX_DEPTH, relevance_prompt};
pub use progress::{ProgressSink, SilentProgress};
pub use tools::{Tool, ToolContext, ToolRegistry};
