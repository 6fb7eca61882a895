//! Candle-geometry analysts. They read raw bars rather than indicator series
//! and carry the smallest magnitudes on the panel.

use super::{directional, AnalystInput};
use crate::indicators::volume_ratio;
use crate::models::VoteReport;

/// Fades a run of same-coloured candles: at least `streak_min` red bars in the
/// last `streak_window` votes CALL, the same count of green bars votes PUT.
pub fn candle_streak(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let t = input.thresholds;
    let (open, close) = (input.candles.open(), input.candles.close());

    if close.len() < t.streak_window {
        anyhow::bail!("need {} candles for streak detection", t.streak_window);
    }

    let start = close.len() - t.streak_window;
    let bodies: Vec<f64> = close[start..]
        .iter()
        .zip(&open[start..])
        .map(|(c, o)| c - o)
        .collect();
    let green = bodies.iter().filter(|b| **b > 0.0).count();
    let red = bodies.iter().filter(|b| **b < 0.0).count();

    let vote = if red >= t.streak_min {
        2
    } else if green >= t.streak_min {
        -2
    } else {
        0
    };

    Ok(VoteReport::new(vote, 3))
}

/// Hammer (long lower wick) votes CALL; shooting star (long upper wick) votes PUT
pub fn hammer_wick(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let c = input.candles;
    let i = c
        .len()
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("candle series is empty"))?;
    let (open, high, low, close) = (c.open()[i], c.high()[i], c.low()[i], c.close()[i]);

    let body = (close - open).abs();
    let lower_wick = open.min(close) - low;
    let upper_wick = high - open.max(close);
    let ratio = input.thresholds.wick_body_ratio;

    let vote = if lower_wick > body * ratio && lower_wick > upper_wick {
        1
    } else if upper_wick > body * ratio && upper_wick > lower_wick {
        -1
    } else {
        0
    };

    Ok(VoteReport::new(vote, 1))
}

/// Sides with the latest candle when its volume spikes above the trailing mean.
/// Abstains when the feed carries no volume.
pub fn volume_spike(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let Some(volume) = input.candles.volume() else {
        return Ok(VoteReport::abstain(1));
    };

    let t = input.thresholds;
    let Some(ratio) = volume_ratio(volume, t.volume_lookback) else {
        return Ok(VoteReport::abstain(1));
    };

    if ratio <= t.volume_spike_ratio {
        return Ok(VoteReport::abstain(1));
    }

    let open = *input
        .candles
        .open()
        .last()
        .ok_or_else(|| anyhow::anyhow!("candle series is empty"))?;
    let close = input.last_close()?;

    Ok(VoteReport::new(directional(close - open, 1), 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysts::PanelThresholds;
    use crate::indicators::IndicatorSnapshot;
    use crate::models::CandleSeries;

    fn evaluate(
        analyst: fn(&AnalystInput<'_>) -> anyhow::Result<VoteReport>,
        candles: &CandleSeries,
    ) -> VoteReport {
        let thresholds = PanelThresholds::default();
        let snapshot = IndicatorSnapshot::new();
        analyst(&AnalystInput {
            candles,
            indicators: &snapshot,
            thresholds: &thresholds,
            trend: None,
        })
        .unwrap()
    }

    fn bars(ohlc: &[(f64, f64, f64, f64)], volume: Option<Vec<f64>>) -> CandleSeries {
        CandleSeries::new(
            ohlc.iter().map(|b| b.0).collect(),
            ohlc.iter().map(|b| b.1).collect(),
            ohlc.iter().map(|b| b.2).collect(),
            ohlc.iter().map(|b| b.3).collect(),
            volume,
        )
        .unwrap()
    }

    #[test]
    fn test_candle_streak_fades_red_run() {
        let red = (101.0, 101.5, 99.5, 100.0);
        let green = (100.0, 101.5, 99.5, 101.0);
        let candles = bars(&[green, red, red, green, red, red], None);

        assert_eq!(evaluate(candle_streak, &candles).value, 2);
    }

    #[test]
    fn test_candle_streak_mixed_abstains() {
        let red = (101.0, 101.5, 99.5, 100.0);
        let green = (100.0, 101.5, 99.5, 101.0);
        let candles = bars(&[red, green, red, green, red], None);

        assert_eq!(evaluate(candle_streak, &candles).value, 0);
    }

    #[test]
    fn test_hammer_and_shooting_star() {
        let hammer = bars(&[(100.0, 100.6, 97.0, 100.5)], None);
        let star = bars(&[(100.5, 103.0, 99.9, 100.0)], None);
        let marubozu = bars(&[(100.0, 102.0, 100.0, 102.0)], None);

        assert_eq!(evaluate(hammer_wick, &hammer).value, 1);
        assert_eq!(evaluate(hammer_wick, &star).value, -1);
        assert_eq!(evaluate(hammer_wick, &marubozu).value, 0);
    }

    #[test]
    fn test_volume_spike_with_green_bar() {
        let mut ohlc = vec![(100.0, 101.0, 99.0, 100.0); 20];
        ohlc.push((100.0, 103.0, 99.5, 102.5));
        let mut volume = vec![1000.0; 20];
        volume.push(3000.0);

        let report = evaluate(volume_spike, &bars(&ohlc, Some(volume)));
        assert_eq!(report.value, 1);
        assert_eq!(report.duration, 1);
    }

    #[test]
    fn test_volume_spike_without_volume_abstains() {
        let ohlc = vec![(100.0, 101.0, 99.0, 100.0); 25];
        assert!(evaluate(volume_spike, &bars(&ohlc, None)).is_abstain());
    }
}
