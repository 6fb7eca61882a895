use crate::backtest::metrics::{ReplayMetrics, TradeRecord};
use crate::consensus::ConsensusEngine;
use crate::models::{Candle, CandleSeries, Signal, TradeDecision};
use crate::Result;

/// A trade waiting for its expiry candle
struct ActiveTrade {
    decision: TradeDecision,
    entry_index: usize,
    expiry_index: usize,
}

/// Walk-forward replay of the engine over historical candles.
///
/// Each candle is one cycle. While idle the engine analyses the trailing
/// window; a CALL or PUT opens a single trade that settles `duration` candles
/// later and is fed back through `settle`, so weights adapt during the run.
pub struct ReplayRunner {
    /// Trailing candles handed to each cycle; `None` means everything so far
    window: Option<usize>,
}

impl Default for ReplayRunner {
    fn default() -> Self {
        Self { window: Some(500) }
    }
}

impl ReplayRunner {
    pub fn new(window: Option<usize>) -> Self {
        Self { window }
    }

    /// Run a replay
    ///
    /// # Arguments
    /// * `engine` - Engine under test; its weight store is updated in place
    /// * `candles` - Historical candles, oldest first
    /// * `label` - Name for the report
    pub fn run(
        &self,
        engine: &ConsensusEngine,
        candles: &[Candle],
        label: &str,
    ) -> Result<ReplayMetrics> {
        // The first cycle needs at least one candle
        let min_history = engine.min_history().max(1);

        if candles.len() < min_history {
            return Err(format!(
                "Not enough candles for replay. Need {}, got {}",
                min_history,
                candles.len()
            )
            .into());
        }

        tracing::info!(
            "Starting replay '{}': {} candles, engine needs {}",
            label,
            candles.len(),
            min_history
        );

        let mut metrics = ReplayMetrics::new(label, candles.len());
        let mut active: Option<ActiveTrade> = None;

        for i in min_history - 1..candles.len() {
            if active.as_ref().is_some_and(|t| i >= t.expiry_index) {
                if let Some(trade) = active.take() {
                    metrics.trades.push(self.settle(engine, candles, trade)?);
                }
            }

            if active.is_some() {
                continue;
            }

            let start = self
                .window
                .map_or(0, |window| (i + 1).saturating_sub(window.max(min_history)));
            let series = CandleSeries::from_candles(&candles[start..=i])?;

            let decision = engine.analyze(&series);
            metrics.decisions += 1;

            if decision.signal.is_trade() {
                active = Some(ActiveTrade {
                    expiry_index: i + decision.duration as usize,
                    entry_index: i,
                    decision,
                });
            } else {
                metrics.record_wait(decision.reason.to_string());
            }
        }

        if let Some(trade) = active {
            tracing::debug!(
                "Replay ended with an open {} trade, not settled",
                trade.decision.signal
            );
        }

        metrics.final_weights = engine.weights()?;

        tracing::info!(
            "Replay '{}' complete: {} trades, {:.1}% win rate",
            label,
            metrics.total_trades(),
            metrics.win_rate()
        );

        Ok(metrics)
    }

    /// Resolve a trade at its expiry candle. An unchanged close is a loss.
    fn settle(
        &self,
        engine: &ConsensusEngine,
        candles: &[Candle],
        trade: ActiveTrade,
    ) -> Result<TradeRecord> {
        let entry = &candles[trade.entry_index];
        let exit = &candles[trade.expiry_index];

        let won = match trade.decision.signal {
            Signal::Call => exit.close > entry.close,
            Signal::Put => exit.close < entry.close,
            Signal::Wait => false,
        };

        engine.settle(&trade.decision.outcome(won))?;

        tracing::debug!(
            "{} {} @ {:.4} -> {:.4}",
            if won { "✅" } else { "❌" },
            trade.decision.signal,
            entry.close,
            exit.close
        );

        Ok(TradeRecord {
            entry_time: entry.timestamp,
            expiry_time: exit.timestamp,
            signal: trade.decision.signal,
            entry_price: entry.close,
            exit_price: exit.close,
            score: trade.decision.score,
            duration: trade.decision.duration,
            won,
        })
    }
}
