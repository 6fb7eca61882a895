use crate::models::{Signal, WeightTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One settled replay trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_time: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
    pub signal: Signal,
    pub entry_price: f64,
    pub exit_price: f64,
    pub score: f64,
    pub duration: u32,
    pub won: bool,
}

/// Replay outcome for one candle set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayMetrics {
    pub label: String,
    pub candles: usize,
    pub decisions: usize,
    pub trades: Vec<TradeRecord>,
    /// WAIT decisions tallied by reason
    pub waits: BTreeMap<String, usize>,
    pub final_weights: WeightTable,
}

impl ReplayMetrics {
    pub fn new(label: impl Into<String>, candles: usize) -> Self {
        Self {
            label: label.into(),
            candles,
            ..Self::default()
        }
    }

    pub fn record_wait(&mut self, reason: impl Into<String>) {
        *self.waits.entry(reason.into()).or_insert(0) += 1;
    }

    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }

    pub fn wins(&self) -> usize {
        self.trades.iter().filter(|t| t.won).count()
    }

    pub fn losses(&self) -> usize {
        self.total_trades() - self.wins()
    }

    /// Win rate in percent, 0 with no trades
    pub fn win_rate(&self) -> f64 {
        if self.trades.is_empty() {
            0.0
        } else {
            self.wins() as f64 / self.total_trades() as f64 * 100.0
        }
    }

    pub fn calls(&self) -> usize {
        self.trades.iter().filter(|t| t.signal == Signal::Call).count()
    }

    pub fn puts(&self) -> usize {
        self.trades.iter().filter(|t| t.signal == Signal::Put).count()
    }

    pub fn wait_count(&self) -> usize {
        self.waits.values().sum()
    }

    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              CONSENSUS REPLAY REPORT                  ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 RUN: {}", self.label);
        println!("  Candles:               {}", self.candles);
        println!("  Decisions:             {}", self.decisions);

        println!("\n📈 TRADE STATISTICS");
        println!("  Total Trades:          {}", self.total_trades());
        println!(
            "  Wins / Losses:         {} / {} ({:.1}%)",
            self.wins(),
            self.losses(),
            self.win_rate()
        );
        println!("  CALL / PUT:            {} / {}", self.calls(), self.puts());

        if !self.waits.is_empty() {
            println!("\n⏸️  WAIT REASONS ({})", self.wait_count());
            for (reason, count) in &self.waits {
                println!("  {:<22} {}", format!("{}:", reason), count);
            }
        }

        if !self.final_weights.is_empty() {
            println!("\n⚖️  FINAL WEIGHTS");
            let mut weights: Vec<(&str, f64)> = self.final_weights.iter().collect();
            weights.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (name, weight) in weights {
                println!("  {:<22} {:.3}", format!("{}:", name), weight);
            }
        }

        println!();
    }
}
