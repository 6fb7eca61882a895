use crate::models::Candle;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise
    Uptrend,
    /// Steady downtrend with noise
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
    /// Large swings in both directions (±3% per candle)
    Volatile,
    /// Volatility compression for most of the run, then a breakout
    Squeeze,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 5] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::Squeeze,
    ];
}

impl fmt::Display for MarketScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketScenario::Uptrend => "uptrend",
            MarketScenario::Downtrend => "downtrend",
            MarketScenario::Sideways => "sideways",
            MarketScenario::Volatile => "volatile",
            MarketScenario::Squeeze => "squeeze",
        };
        write!(f, "{}", name)
    }
}

/// Generates synthetic OHLCV candles for replays
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 150.0,
            base_volume: 1_000_000.0,
        }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Generate candles for a specific market scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_candles` - Number of candles (the engine needs 250 before it scores)
    /// * `interval_minutes` - Minutes between candles
    ///
    /// # Returns
    /// Candles oldest first; each opens at the previous close
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
    ) -> Vec<Candle> {
        let start_time = Utc::now() - Duration::minutes(num_candles as i64 * interval_minutes);
        let breakout_at = num_candles * 7 / 10;

        let mut candles = Vec::with_capacity(num_candles);
        let mut price = self.base_price;

        for i in 0..num_candles {
            let timestamp = start_time + Duration::minutes(i as i64 * interval_minutes);
            let open = price;

            price += match scenario {
                // +0.1% drift per candle with ±0.1% noise so the trend dominates
                MarketScenario::Uptrend => price * (0.001 + self.rng.gen_range(-0.001..0.001)),
                MarketScenario::Downtrend => price * (-0.001 + self.rng.gen_range(-0.001..0.001)),
                // 10% pull to mean plus ±1% noise
                MarketScenario::Sideways => {
                    (self.base_price - price) * 0.1 + price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => price * self.rng.gen_range(-0.03..0.03),
                MarketScenario::Squeeze if i < breakout_at => {
                    (self.base_price - price) * 0.2 + price * self.rng.gen_range(-0.0005..0.0005)
                }
                MarketScenario::Squeeze => price * (0.004 + self.rng.gen_range(-0.002..0.002)),
            };

            // Prevent price from going too low
            price = price.max(self.base_price * 0.2);

            let volume_boost = if scenario == MarketScenario::Squeeze && i >= breakout_at {
                2.5
            } else {
                1.0
            };

            candles.push(self.create_candle(open, price, timestamp, volume_boost));
        }

        candles
    }

    /// Build a candle with wicks around the open/close body
    fn create_candle(
        &mut self,
        open: f64,
        close: f64,
        timestamp: DateTime<Utc>,
        volume_boost: f64,
    ) -> Candle {
        let wick_pct = 0.002; // up to 0.2% beyond the body

        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..wick_pct));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..wick_pct));

        // Vary volume ±30%
        let volume = self.base_volume * volume_boost * self.rng.gen_range(0.7..1.3);

        Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Uptrend, 500, 5);

        assert_eq!(candles.len(), 500);

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;

        assert!(
            last_price > first_price,
            "Uptrend should end higher: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Downtrend, 500, 5);

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;

        assert!(
            last_price < first_price,
            "Downtrend should end lower: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Sideways, 500, 5);
        let base = gen.base_price();

        for candle in &candles {
            assert!(
                candle.close > base * 0.9 && candle.close < base * 1.1,
                "Sideways should stay near base: {} vs {}",
                candle.close,
                base
            );
        }
    }

    #[test]
    fn test_squeeze_compresses_then_breaks_out() {
        let mut gen = SyntheticDataGenerator::new(7);
        let candles = gen.generate(MarketScenario::Squeeze, 400, 5);
        let base = gen.base_price();

        let quiet = &candles[..280];
        assert!(quiet.iter().all(|c| (c.close - base).abs() < base * 0.01));

        let last = candles.last().unwrap().close;
        assert!(last > base * 1.2, "breakout should run away: {}", last);
    }

    #[test]
    fn test_candles_open_at_previous_close() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Volatile, 100, 5);

        for pair in candles.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
    }

    #[test]
    fn test_ohlc_consistency() {
        let mut gen = SyntheticDataGenerator::new(42);

        for scenario in MarketScenario::ALL {
            for candle in gen.generate(scenario, 100, 5) {
                assert!(candle.high >= candle.close, "High should be >= close");
                assert!(candle.high >= candle.open, "High should be >= open");
                assert!(candle.low <= candle.close, "Low should be <= close");
                assert!(candle.low <= candle.open, "Low should be <= open");
            }
        }
    }
}
