//! Trellis Config
//!
//! This crate contains the serializable pipeline definition types for Trellis.
//! These types represent a pipeline as written by its author, before the
//! definition is validated and locked for execution.
//!
//! Definitions can be loaded from:
//! - JSON files (via CLI with `trellis run pipeline.json`)
//! - Any other source that yields a JSON document
//!
//! The graph layer takes these definition types, validates the `needs`
//! relation and every input expression, and locks them into executable
//! structures.

mod context;
mod error;
mod job;
mod pipeline;
mod trigger;

pub use context::{Event, TriggerContext};
pub use error::DefinitionError;
pub use job::{InputValue, JobDef};
pub use pipeline::PipelineDef;
pub use trigger::{PushFilter, ScheduleDef, TriggerDef};
