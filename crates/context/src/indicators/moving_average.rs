/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average series seeded with the SMA of the first `period` values.
///
/// The returned series starts at index `period - 1` of the input.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);
    for value in &values[period..] {
        let prev = series[series.len() - 1];
        series.push(value * k + prev * (1.0 - k));
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_uses_trailing_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&values, 2), Some(4.5));
        assert_eq!(sma(&values, 5), Some(3.0));
        assert_eq!(sma(&values, 6), None);
        assert_eq!(sma(&values, 0), None);
    }

    #[test]
    fn test_ema_of_constant_series_is_constant() {
        let values = [10.0; 30];
        let ema = ema_series(&values, 12);
        assert_eq!(ema.len(), 19);
        assert!(ema.iter().all(|v| (v - 10.0).abs() < 1e-9));
    }
}
