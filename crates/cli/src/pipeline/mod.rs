//! Event pipeline: input lines -> broker queue -> EventBridge -> EventManager.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
