//! Volume-derived series.

/// On-Balance Volume, one value per candle starting at zero
pub fn obv_series(close: &[f64], volume: &[f64]) -> Option<Vec<f64>> {
    if close.is_empty() || close.len() != volume.len() {
        return None;
    }

    let mut obv = Vec::with_capacity(close.len());
    let mut running = 0.0;
    obv.push(running);

    for i in 1..close.len() {
        if close[i] > close[i - 1] {
            running += volume[i];
        } else if close[i] < close[i - 1] {
            running -= volume[i];
        }
        obv.push(running);
    }

    Some(obv)
}

/// Ratio of the latest volume to the mean of the `lookback` volumes before it
pub fn volume_ratio(volume: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || volume.len() < lookback + 1 {
        return None;
    }

    let current = volume[volume.len() - 1];
    let history = &volume[volume.len() - 1 - lookback..volume.len() - 1];
    let average = history.iter().sum::<f64>() / lookback as f64;

    (average > 0.0).then(|| current / average)
}
