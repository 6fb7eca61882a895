// Replay harness
// Synthetic markets and walk-forward replays that exercise the learning loop

pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use metrics::{ReplayMetrics, TradeRecord};
pub use runner::ReplayRunner;
pub use synthetic::{MarketScenario, SyntheticDataGenerator};
