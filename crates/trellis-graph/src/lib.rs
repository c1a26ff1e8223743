//! Trellis Graph
//!
//! This crate provides the "locked" pipeline representation for Trellis.
//! A locked pipeline is a validated, resolved form of a pipeline definition
//! that is ready for execution.
//!
//! Key differences from `trellis-config`:
//! - The `needs` relation is validated: every id exists, the graph is a DAG
//! - Every input expression is parsed; references are checked against the
//!   referencing job's own `needs` list
//! - Run conditions are parsed and run-always eligibility is precomputed
//! - A topological batch schedule can be derived deterministically

mod error;
mod graph;
mod job;
mod pipeline;
mod schedule;
mod uses;
mod validate;

pub use error::ConfigError;
pub use graph::Graph;
pub use job::Job;
pub use pipeline::Pipeline;
pub use uses::UsesRef;
