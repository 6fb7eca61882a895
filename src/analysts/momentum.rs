//! Oscillator analysts. Each fades an overextended reading, so their
//! suggested durations are short.

use super::{directional, AnalystInput};
use crate::indicators::Indicator;
use crate::models::VoteReport;

/// RSI beyond its extremes: oversold votes CALL, overbought votes PUT
pub fn rsi_extremes(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let rsi = input.indicators.last(Indicator::Rsi)?;
    let t = input.thresholds;

    let vote = if rsi < t.rsi_oversold {
        3
    } else if rsi > t.rsi_overbought {
        -3
    } else {
        0
    };

    Ok(VoteReport::new(vote, 2))
}

/// Stochastic %K turning against %D inside an extreme zone
pub fn stochastic_cross(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let k = input.indicators.last(Indicator::StochasticK)?;
    let d = input.indicators.last(Indicator::StochasticD)?;
    let t = input.thresholds;

    let vote = if k < t.stochastic_low && k > d {
        2
    } else if k > t.stochastic_high && k < d {
        -2
    } else {
        0
    };

    Ok(VoteReport::new(vote, 1))
}

pub fn williams_r(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let wr = input.indicators.last(Indicator::WilliamsR)?;
    let t = input.thresholds;

    let vote = if wr < t.williams_low {
        2
    } else if wr > t.williams_high {
        -2
    } else {
        0
    };

    Ok(VoteReport::new(vote, 1))
}

/// Follows the sign of the MACD histogram
pub fn macd_histogram(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let histogram = input.indicators.last(Indicator::MacdHistogram)?;
    Ok(VoteReport::new(directional(histogram, 1), 3))
}

/// Fades a rate of change beyond `roc_limit` percent
pub fn rate_of_change(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let roc = input.indicators.last(Indicator::Roc)?;
    let limit = input.thresholds.roc_limit;

    let vote = if roc < -limit {
        1
    } else if roc > limit {
        -1
    } else {
        0
    };

    Ok(VoteReport::new(vote, 2))
}

pub fn cci_extremes(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let cci = input.indicators.last(Indicator::Cci)?;
    let limit = input.thresholds.cci_limit;

    let vote = if cci < -limit {
        2
    } else if cci > limit {
        -2
    } else {
        0
    };

    Ok(VoteReport::new(vote, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysts::PanelThresholds;
    use crate::indicators::IndicatorSnapshot;
    use crate::models::CandleSeries;

    fn vote_with(
        analyst: fn(&AnalystInput<'_>) -> anyhow::Result<VoteReport>,
        values: &[(Indicator, f64)],
    ) -> anyhow::Result<VoteReport> {
        let candles = CandleSeries::new(vec![1.0], vec![1.0], vec![1.0], vec![1.0], None)?;
        let mut snapshot = IndicatorSnapshot::new();
        for &(indicator, value) in values {
            snapshot.insert(indicator, vec![value]);
        }
        let thresholds = PanelThresholds::default();

        analyst(&AnalystInput {
            candles: &candles,
            indicators: &snapshot,
            thresholds: &thresholds,
            trend: None,
        })
    }

    #[test]
    fn test_rsi_extremes() {
        assert_eq!(vote_with(rsi_extremes, &[(Indicator::Rsi, 15.0)]).unwrap().value, 3);
        assert_eq!(vote_with(rsi_extremes, &[(Indicator::Rsi, 85.0)]).unwrap().value, -3);
        assert_eq!(vote_with(rsi_extremes, &[(Indicator::Rsi, 50.0)]).unwrap().value, 0);
    }

    #[test]
    fn test_rsi_missing_is_error() {
        assert!(vote_with(rsi_extremes, &[]).is_err());
    }

    #[test]
    fn test_stochastic_cross_needs_turn() {
        let oversold_turning = [(Indicator::StochasticK, 15.0), (Indicator::StochasticD, 10.0)];
        let oversold_falling = [(Indicator::StochasticK, 10.0), (Indicator::StochasticD, 15.0)];
        let overbought_turning = [(Indicator::StochasticK, 85.0), (Indicator::StochasticD, 90.0)];

        assert_eq!(vote_with(stochastic_cross, &oversold_turning).unwrap().value, 2);
        assert_eq!(vote_with(stochastic_cross, &oversold_falling).unwrap().value, 0);
        assert_eq!(vote_with(stochastic_cross, &overbought_turning).unwrap().value, -2);
    }

    #[test]
    fn test_williams_r() {
        assert_eq!(vote_with(williams_r, &[(Indicator::WilliamsR, -95.0)]).unwrap().value, 2);
        assert_eq!(vote_with(williams_r, &[(Indicator::WilliamsR, -5.0)]).unwrap().value, -2);
    }

    #[test]
    fn test_macd_histogram_follows_sign() {
        let report = vote_with(macd_histogram, &[(Indicator::MacdHistogram, -0.3)]).unwrap();
        assert_eq!(report.value, -1);
        assert_eq!(report.duration, 3);
    }

    #[test]
    fn test_rate_of_change_fades() {
        assert_eq!(vote_with(rate_of_change, &[(Indicator::Roc, -2.0)]).unwrap().value, 1);
        assert_eq!(vote_with(rate_of_change, &[(Indicator::Roc, 0.5)]).unwrap().value, 0);
    }

    #[test]
    fn test_cci_extremes() {
        assert_eq!(vote_with(cci_extremes, &[(Indicator::Cci, 200.0)]).unwrap().value, -2);
        assert_eq!(vote_with(cci_extremes, &[(Indicator::Cci, -151.0)]).unwrap().value, 2);
    }
}
