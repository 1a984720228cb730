//! Batch mode: many posts, one shared context, one reply each.

pub mod orchestrator;
pub mod parser;

pub use orchestrator::{
    BatchEvent, BatchOrchestrator, BatchRun, GenerationResult, Outcome, SharedContext,
};
pub use parser::{BatchWorkItem, parse_batch};
