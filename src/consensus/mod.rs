// Consensus module
// Turns panel votes into a trade decision and routes settlements to the learner

pub mod aggregator;
pub mod engine;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use engine::ConsensusEngine;
