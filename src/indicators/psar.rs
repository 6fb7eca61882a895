//! Parabolic SAR (stop and reverse)
//!
//! Trails price with an accelerating stop. Price above the SAR means the
//! trailing stop is below it (uptrend); price below means downtrend.

/// Calculate the SAR series; one value for every candle after the first
pub fn psar_series(high: &[f64], low: &[f64], step: f64, max_step: f64) -> Option<Vec<f64>> {
    let n = high.len();
    if n < 2 || low.len() != n || step <= 0.0 || max_step < step {
        return None;
    }

    let mut rising = high[1] >= high[0];
    let mut sar = if rising { low[0] } else { high[0] };
    let mut extreme = if rising { high[0] } else { low[0] };
    let mut acceleration = step;
    let mut series = Vec::with_capacity(n - 1);

    for i in 1..n {
        sar += acceleration * (extreme - sar);

        if rising {
            // SAR never sits above the two previous lows
            sar = sar.min(low[i - 1]);
            if i >= 2 {
                sar = sar.min(low[i - 2]);
            }

            if low[i] < sar {
                rising = false;
                sar = extreme;
                extreme = low[i];
                acceleration = step;
            } else if high[i] > extreme {
                extreme = high[i];
                acceleration = (acceleration + step).min(max_step);
            }
        } else {
            sar = sar.max(high[i - 1]);
            if i >= 2 {
                sar = sar.max(high[i - 2]);
            }

            if high[i] > sar {
                rising = true;
                sar = extreme;
                extreme = high[i];
                acceleration = step;
            } else if low[i] < extreme {
                extreme = low[i];
                acceleration = (acceleration + step).min(max_step);
            }
        }

        series.push(sar);
    }

    Some(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psar_below_price_in_uptrend() {
        let high: Vec<f64> = (0..30).map(|i| 101.0 + i as f64).collect();
        let low: Vec<f64> = (0..30).map(|i| 99.0 + i as f64).collect();

        let sar = psar_series(&high, &low, 0.02, 0.2).unwrap();
        assert_eq!(sar.len(), 29);
        assert!(*sar.last().unwrap() < *low.last().unwrap());
    }

    #[test]
    fn test_psar_flips_on_reversal() {
        let mut high: Vec<f64> = (0..20).map(|i| 101.0 + i as f64).collect();
        let mut low: Vec<f64> = (0..20).map(|i| 99.0 + i as f64).collect();
        for i in 0..20 {
            high.push(120.0 - i as f64 * 2.0);
            low.push(118.0 - i as f64 * 2.0);
        }

        let sar = psar_series(&high, &low, 0.02, 0.2).unwrap();
        assert!(*sar.last().unwrap() > *high.last().unwrap());
    }

    #[test]
    fn test_psar_invalid_input() {
        assert!(psar_series(&[1.0], &[1.0], 0.02, 0.2).is_none());
        assert!(psar_series(&[1.0, 2.0], &[1.0, 2.0], 0.0, 0.2).is_none());
    }
}
