pub mod aggregator;
pub mod orchestrator;
pub mod pipeline;

// Re-export commonly used types
pub use aggregator::{Aggregator, AggregatorConfig, AggregatorHandle, AggregatorMsg};
pub use orchestrator::{RunSummary, StreamOrchestrator};
pub use pipeline::{PipelineEnd, ShardPipeline};
