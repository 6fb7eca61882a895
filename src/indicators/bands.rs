//! Volatility envelopes: Bollinger Bands and Keltner Channels.

use super::atr::atr_series;
use super::moving_average::{ema_series, sma_series, stdev_series, tail};
use crate::models::CandleSeries;

/// Upper/middle/lower band series of equal length, trailing-aligned
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bollinger Bands: SMA ± `std_devs` standard deviations
pub fn bollinger_bands(prices: &[f64], period: usize, std_devs: f64) -> Option<Envelope> {
    let middle = sma_series(prices, period)?;
    let deviation = stdev_series(prices, period)?;

    let upper = middle.iter().zip(&deviation).map(|(m, d)| m + std_devs * d).collect();
    let lower = middle.iter().zip(&deviation).map(|(m, d)| m - std_devs * d).collect();

    Some(Envelope {
        upper,
        middle,
        lower,
    })
}

/// Keltner Channels: EMA ± `multiplier` × ATR
pub fn keltner_channels(
    candles: &CandleSeries,
    period: usize,
    atr_period: usize,
    multiplier: f64,
) -> Option<Envelope> {
    let ema = ema_series(candles.close(), period)?;
    let atr = atr_series(candles, atr_period)?;

    let len = ema.len().min(atr.len());
    let middle = tail(&ema, len)?.to_vec();
    let atr = tail(&atr, len)?;

    let upper = middle.iter().zip(atr).map(|(m, a)| m + multiplier * a).collect();
    let lower = middle.iter().zip(atr).map(|(m, a)| m - multiplier * a).collect();

    Some(Envelope {
        upper,
        middle,
        lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_flat_prices_collapse() {
        let prices = vec![100.0; 30];
        let bands = bollinger_bands(&prices, 20, 2.0).unwrap();

        let lower = bands.lower.last().unwrap();
        let upper = bands.upper.last().unwrap();
        assert!((upper - 100.0).abs() < 1e-9);
        assert!((lower - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bollinger_orders_bands() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let bands = bollinger_bands(&prices, 20, 2.2).unwrap();

        for i in 0..bands.middle.len() {
            assert!(bands.lower[i] <= bands.middle[i]);
            assert!(bands.middle[i] <= bands.upper[i]);
        }
    }

    #[test]
    fn test_keltner_width_follows_atr() {
        let closes: Vec<f64> = vec![100.0; 40];
        let candles = CandleSeries::new(
            closes.clone(),
            closes.iter().map(|c| c + 2.0).collect(),
            closes.iter().map(|c| c - 2.0).collect(),
            closes,
            None,
        )
        .unwrap();

        let channels = keltner_channels(&candles, 20, 10, 1.5).unwrap();
        let lower = channels.lower.last().unwrap();
        let upper = channels.upper.last().unwrap();

        // ATR is 4, so the channel spans 2 * 1.5 * 4
        assert!((upper - lower - 12.0).abs() < 1e-9);
    }
}
