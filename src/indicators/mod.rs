// Technical indicators module
// Computes the shared indicator snapshot consumed by the analyst panel

pub mod adx;
pub mod atr;
pub mod bands;
pub mod moving_average;
pub mod oscillators;
pub mod psar;
pub mod rsi;
pub mod volume;

pub use adx::{adx_series, AdxSeries};
pub use atr::{atr_series, is_atr_spike, true_ranges};
pub use bands::{bollinger_bands, keltner_channels, Envelope};
pub use moving_average::{ema_series, rma_series, sma_series};
pub use oscillators::{
    cci_series, macd_series, roc_series, stochastic_series, williams_r_series, MacdSeries,
    StochasticSeries,
};
pub use psar::psar_series;
pub use rsi::rsi_series;
pub use volume::{obv_series, volume_ratio};

use crate::models::CandleSeries;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Every named series the standard provider can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Rsi,
    StochasticK,
    StochasticD,
    WilliamsR,
    Macd,
    MacdSignal,
    MacdHistogram,
    Roc,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    KeltnerUpper,
    KeltnerMiddle,
    KeltnerLower,
    Cci,
    Adx,
    PlusDi,
    MinusDi,
    EmaShort,
    EmaLong,
    Atr,
    Psar,
    Obv,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Indicator series computed once per analysis cycle.
///
/// Each series is trailing-aligned with the candle series it came from: its
/// last element belongs to the newest candle. Indicators that could not be
/// computed are absent rather than partially filled.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSnapshot {
    series: HashMap<Indicator, Vec<f64>>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, indicator: Indicator, values: Vec<f64>) {
        if !values.is_empty() {
            self.series.insert(indicator, values);
        }
    }

    pub fn series(&self, indicator: Indicator) -> Option<&[f64]> {
        self.series.get(&indicator).map(Vec::as_slice)
    }

    pub fn contains(&self, indicator: Indicator) -> bool {
        self.series.contains_key(&indicator)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Latest value of an indicator
    pub fn last(&self, indicator: Indicator) -> anyhow::Result<f64> {
        self.series(indicator)
            .and_then(|values| values.last().copied())
            .ok_or_else(|| anyhow::anyhow!("indicator {} unavailable", indicator))
    }

    /// The newest `n` values of an indicator
    pub fn recent(&self, indicator: Indicator, n: usize) -> anyhow::Result<&[f64]> {
        let values = self
            .series(indicator)
            .ok_or_else(|| anyhow::anyhow!("indicator {} unavailable", indicator))?;

        if values.len() < n {
            anyhow::bail!(
                "indicator {} has {} values, need {}",
                indicator,
                values.len(),
                n
            );
        }

        Ok(&values[values.len() - n..])
    }
}

/// Source of the per-cycle indicator snapshot
pub trait IndicatorProvider: Send + Sync {
    /// Compute every indicator the panel needs from the candle series
    fn compute(&self, candles: &CandleSeries) -> anyhow::Result<IndicatorSnapshot>;

    /// Minimum number of candles before the computed series are trustworthy
    fn min_history(&self) -> usize;
}

/// Indicator periods and multipliers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub stochastic_period: usize,
    pub stochastic_signal: usize,
    pub williams_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub roc_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub keltner_period: usize,
    pub keltner_atr_period: usize,
    pub keltner_multiplier: f64,
    pub cci_period: usize,
    pub adx_period: usize,
    pub ema_short: usize,
    pub ema_long: usize,
    pub atr_period: usize,
    pub psar_step: f64,
    pub psar_max: f64,
    /// Extra candles beyond the longest lookback so smoothed series settle
    pub warmup_buffer: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            stochastic_period: 14,
            stochastic_signal: 3,
            williams_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            roc_period: 14,
            bollinger_period: 20,
            bollinger_std_dev: 2.2,
            keltner_period: 20,
            keltner_atr_period: 10,
            keltner_multiplier: 1.5,
            cci_period: 20,
            adx_period: 14,
            ema_short: 20,
            ema_long: 200,
            atr_period: 14,
            psar_step: 0.02,
            psar_max: 0.2,
            warmup_buffer: 50,
        }
    }
}

impl IndicatorParams {
    /// Longest lookback any indicator needs
    pub fn longest_lookback(&self) -> usize {
        [
            self.rsi_period + 1,
            self.stochastic_period + self.stochastic_signal,
            self.williams_period,
            self.macd_slow + self.macd_signal,
            self.roc_period + 1,
            self.bollinger_period,
            self.keltner_period.max(self.keltner_atr_period + 1),
            self.cci_period,
            self.adx_period * 2,
            self.ema_short,
            self.ema_long,
            self.atr_period + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Candles required before the engine will score (200 + 50 by default)
    pub fn min_history(&self) -> usize {
        self.longest_lookback() + self.warmup_buffer
    }
}

/// Default provider computing the full indicator set
#[derive(Debug, Clone, Default)]
pub struct StandardIndicators {
    params: IndicatorParams,
}

impl StandardIndicators {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }
}

impl IndicatorProvider for StandardIndicators {
    fn compute(&self, candles: &CandleSeries) -> anyhow::Result<IndicatorSnapshot> {
        if candles.is_empty() {
            anyhow::bail!("cannot compute indicators on an empty candle series");
        }

        let p = &self.params;
        let close = candles.close();
        let mut snapshot = IndicatorSnapshot::new();

        if let Some(rsi) = rsi_series(close, p.rsi_period) {
            snapshot.insert(Indicator::Rsi, rsi);
        }

        if let Some(stoch) = stochastic_series(candles, p.stochastic_period, p.stochastic_signal) {
            snapshot.insert(Indicator::StochasticK, stoch.k);
            snapshot.insert(Indicator::StochasticD, stoch.d);
        }

        if let Some(wr) = williams_r_series(candles, p.williams_period) {
            snapshot.insert(Indicator::WilliamsR, wr);
        }

        if let Some(macd) = macd_series(close, p.macd_fast, p.macd_slow, p.macd_signal) {
            snapshot.insert(Indicator::Macd, macd.macd);
            snapshot.insert(Indicator::MacdSignal, macd.signal);
            snapshot.insert(Indicator::MacdHistogram, macd.histogram);
        }

        if let Some(roc) = roc_series(close, p.roc_period) {
            snapshot.insert(Indicator::Roc, roc);
        }

        if let Some(bands) = bollinger_bands(close, p.bollinger_period, p.bollinger_std_dev) {
            snapshot.insert(Indicator::BollingerUpper, bands.upper);
            snapshot.insert(Indicator::BollingerMiddle, bands.middle);
            snapshot.insert(Indicator::BollingerLower, bands.lower);
        }

        if let Some(channels) =
            keltner_channels(candles, p.keltner_period, p.keltner_atr_period, p.keltner_multiplier)
        {
            snapshot.insert(Indicator::KeltnerUpper, channels.upper);
            snapshot.insert(Indicator::KeltnerMiddle, channels.middle);
            snapshot.insert(Indicator::KeltnerLower, channels.lower);
        }

        if let Some(cci) = cci_series(candles, p.cci_period) {
            snapshot.insert(Indicator::Cci, cci);
        }

        if let Some(adx) = adx_series(candles, p.adx_period) {
            snapshot.insert(Indicator::Adx, adx.adx);
            snapshot.insert(Indicator::PlusDi, adx.plus_di);
            snapshot.insert(Indicator::MinusDi, adx.minus_di);
        }

        if let Some(ema) = ema_series(close, p.ema_short) {
            snapshot.insert(Indicator::EmaShort, ema);
        }

        if let Some(ema) = ema_series(close, p.ema_long) {
            snapshot.insert(Indicator::EmaLong, ema);
        }

        if let Some(atr) = atr_series(candles, p.atr_period) {
            snapshot.insert(Indicator::Atr, atr);
        }

        if let Some(sar) = psar_series(candles.high(), candles.low(), p.psar_step, p.psar_max) {
            snapshot.insert(Indicator::Psar, sar);
        }

        if let Some(obv) = candles.volume().and_then(|volume| obv_series(close, volume)) {
            snapshot.insert(Indicator::Obv, obv);
        }

        tracing::debug!(
            "Computed {} indicator series from {} candles",
            snapshot.len(),
            candles.len()
        );

        Ok(snapshot)
    }

    fn min_history(&self) -> usize {
        self.params.min_history()
    }
}
