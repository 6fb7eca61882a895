//! Bounded and unbounded momentum oscillators: Stochastic, Williams %R,
//! MACD, Rate of Change and CCI.

use super::moving_average::{ema_series, highest_series, lowest_series, sma_series, tail};
use crate::models::CandleSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Position of the close inside the `period` high/low range, 0..=100
fn range_position(candles: &CandleSeries, period: usize) -> Option<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let highest = highest_series(candles.high(), period)?;
    let lowest = lowest_series(candles.low(), period)?;
    let close = tail(candles.close(), highest.len())?.to_vec();
    Some((highest, lowest, close))
}

/// Stochastic oscillator (%K and its `signal_period` SMA, %D)
pub fn stochastic_series(
    candles: &CandleSeries,
    period: usize,
    signal_period: usize,
) -> Option<StochasticSeries> {
    let (highest, lowest, close) = range_position(candles, period)?;

    let k: Vec<f64> = highest
        .iter()
        .zip(&lowest)
        .zip(&close)
        .map(|((hh, ll), c)| {
            let range = hh - ll;
            if range > 0.0 {
                (c - ll) / range * 100.0
            } else {
                50.0
            }
        })
        .collect();

    let d = sma_series(&k, signal_period)?;
    Some(StochasticSeries { k, d })
}

/// Williams %R, -100 (at the low) ..= 0 (at the high)
pub fn williams_r_series(candles: &CandleSeries, period: usize) -> Option<Vec<f64>> {
    let (highest, lowest, close) = range_position(candles, period)?;

    Some(
        highest
            .iter()
            .zip(&lowest)
            .zip(&close)
            .map(|((hh, ll), c)| {
                let range = hh - ll;
                if range > 0.0 {
                    (hh - c) / range * -100.0
                } else {
                    -50.0
                }
            })
            .collect(),
    )
}

/// MACD line, signal line and histogram
pub fn macd_series(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Option<MacdSeries> {
    if fast >= slow {
        return None;
    }

    let slow_ema = ema_series(prices, slow)?;
    let fast_ema = tail(&ema_series(prices, fast)?, slow_ema.len())?.to_vec();

    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal = ema_series(&macd, signal_period)?;
    let macd_tail = tail(&macd, signal.len())?;
    let histogram = macd_tail.iter().zip(&signal).map(|(m, s)| m - s).collect();

    Some(MacdSeries {
        macd,
        signal,
        histogram,
    })
}

/// Rate of change in percent over `period` candles
pub fn roc_series(prices: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || prices.len() <= period {
        return None;
    }

    Some(
        (period..prices.len())
            .map(|i| {
                let past = prices[i - period];
                if past != 0.0 {
                    (prices[i] - past) / past * 100.0
                } else {
                    0.0
                }
            })
            .collect(),
    )
}

/// Commodity Channel Index over typical price
pub fn cci_series(candles: &CandleSeries, period: usize) -> Option<Vec<f64>> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let typical: Vec<f64> = (0..candles.len())
        .map(|i| (candles.high()[i] + candles.low()[i] + candles.close()[i]) / 3.0)
        .collect();

    Some(
        typical
            .windows(period)
            .map(|window| {
                let mean = window.iter().sum::<f64>() / period as f64;
                let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
                let current = window[period - 1];
                if mean_dev > 0.0 {
                    (current - mean) / (0.015 * mean_dev)
                } else {
                    0.0
                }
            })
            .collect(),
    )
}
