//! Window-based series, mostly built on `yata` methods.
//!
//! Every function returns a series trailing-aligned with its input: the last
//! output corresponds to the last input. Outputs produced before the window is
//! full are dropped, so a `period`-window over `n` values yields `n - period + 1`
//! values.

use yata::core::{Method, PeriodType};
use yata::methods::{Highest, Lowest, EMA, RMA, SMA};

fn run_method<M>(values: &[f64], period: usize) -> Option<Vec<f64>>
where
    M: Method<Params = PeriodType, Input = f64, Output = f64>,
{
    if period == 0 || values.len() < period {
        return None;
    }

    let length = PeriodType::try_from(period).ok()?;
    let mut method = M::new(length, values.first()?).ok()?;
    let outputs: Vec<f64> = values.iter().map(|value| method.next(value)).collect();

    Some(outputs[period - 1..].to_vec())
}

/// Simple Moving Average series
pub fn sma_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    run_method::<SMA>(values, period)
}

/// Exponential Moving Average series
pub fn ema_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    run_method::<EMA>(values, period)
}

/// Wilder's running moving average series (used by RSI, ATR and ADX)
pub fn rma_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    run_method::<RMA>(values, period)
}

/// Rolling population standard deviation series
pub fn stdev_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || values.len() < period {
        return None;
    }

    Some(
        values
            .windows(period)
            .map(|window| {
                let mean = window.iter().sum::<f64>() / period as f64;
                let variance =
                    window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
                variance.sqrt()
            })
            .collect(),
    )
}

/// Rolling maximum series
pub fn highest_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    run_method::<Highest>(values, period)
}

/// Rolling minimum series
pub fn lowest_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    run_method::<Lowest>(values, period)
}

/// Last `len` elements of a slice, or None if it is shorter
pub fn tail(values: &[f64], len: usize) -> Option<&[f64]> {
    values.len().checked_sub(len).map(|start| &values[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_series() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        let sma = sma_series(&prices, 5).unwrap();

        assert_eq!(sma.len(), 1);
        assert!((sma[0] - 104.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_insufficient_data() {
        let prices = vec![100.0, 102.0];
        assert!(sma_series(&prices, 5).is_none());
        assert!(ema_series(&prices, 0).is_none());
    }

    #[test]
    fn test_ema_tracks_uptrend() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let ema = ema_series(&prices, 5).unwrap();

        assert_eq!(ema.len(), 26);
        // EMA lags a rising price
        assert!(*ema.last().unwrap() < *prices.last().unwrap());
        assert!(ema.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_highest_lowest() {
        let values = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0];
        let highest = highest_series(&values, 3).unwrap();
        let lowest = lowest_series(&values, 3).unwrap();

        assert_eq!(highest, vec![4.0, 4.0, 5.0, 9.0, 9.0]);
        assert_eq!(lowest, vec![1.0, 1.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_tail() {
        let values = vec![1.0, 2.0, 3.0];
        assert_eq!(tail(&values, 2), Some(&values[1..]));
        assert!(tail(&values, 4).is_none());
    }
}
