/// Average True Range (ATR) indicator
///
/// Measures market volatility by calculating the average of true ranges over a period.
/// True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
///
/// Uses Wilder's smoothing (same as RSI and ADX) for the moving average.
use super::moving_average::rma_series;
use crate::models::CandleSeries;

/// True range of every candle after the first
pub fn true_ranges(candles: &CandleSeries) -> Vec<f64> {
    let (high, low, close) = (candles.high(), candles.low(), candles.close());

    (1..candles.len())
        .map(|i| {
            let prev_close = close[i - 1];
            (high[i] - low[i])
                .max((high[i] - prev_close).abs())
                .max((low[i] - prev_close).abs())
        })
        .collect()
}

/// Calculate the ATR series, trailing-aligned with the candles
pub fn atr_series(candles: &CandleSeries, period: usize) -> Option<Vec<f64>> {
    if candles.len() < period + 1 {
        return None;
    }

    rma_series(&true_ranges(candles), period)
}

/// Check if the latest ATR is elevated relative to its own trailing mean
///
/// Returns true if current ATR >= threshold * mean of the previous `lookback` ATR values
pub fn is_atr_spike(atr: &[f64], lookback: usize, threshold: f64) -> bool {
    if lookback == 0 || atr.len() < lookback + 1 {
        return false;
    }

    let current = atr[atr.len() - 1];
    let history = &atr[atr.len() - 1 - lookback..atr.len() - 1];
    let mean = history.iter().sum::<f64>() / lookback as f64;

    mean > 0.0 && current >= threshold * mean
}
