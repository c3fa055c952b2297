//! Shared data model for the hostmon agent.
//!
//! Every crate in the workspace speaks in terms of [`types::MetricReading`]:
//! collectors produce them, the alert evaluator consumes them, and the
//! digest renderer groups them back into a human-readable report.

pub mod keys;
pub mod types;
