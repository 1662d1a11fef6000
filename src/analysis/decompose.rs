//! Classical additive seasonal decomposition: `observed = trend + seasonal + residual`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecompositionError {
    #[error("seasonal period must be at least 2, got {0}")]
    InvalidPeriod(usize),
    #[error("need at least {required} observations (two full cycles), got {available}")]
    TooShort { required: usize, available: usize },
    #[error("observation {index} is not a finite number")]
    NonFinite { index: usize },
}

/// The four aligned component sequences.
///
/// `trend` and `residual` are `None` for the first and last `period / 2`
/// observations, where the centered moving average has no full window.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub observed: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

/// Splits a series into trend, seasonal and residual parts.
pub trait Decomposer {
    fn decompose(&self, values: &[f64], period: usize) -> Result<Decomposition, DecompositionError>;
}

/// Moving-average trend, period-averaged seasonal component.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveDecomposer;

impl Decomposer for AdditiveDecomposer {
    fn decompose(&self, values: &[f64], period: usize) -> Result<Decomposition, DecompositionError> {
        decompose_additive(values, period)
    }
}

/// Perform additive decomposition.
pub fn decompose_additive(values: &[f64], period: usize) -> Result<Decomposition, DecompositionError> {
    if period < 2 {
        return Err(DecompositionError::InvalidPeriod(period));
    }
    let n = values.len();
    if n < 2 * period {
        return Err(DecompositionError::TooShort {
            required: 2 * period,
            available: n,
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(DecompositionError::NonFinite { index });
    }

    let trend = centered_moving_average(values, period);

    let detrended: Vec<Option<f64>> = values
        .iter()
        .zip(&trend)
        .map(|(v, t)| t.map(|t| v - t))
        .collect();

    // Mean detrended value per phase, centered so one cycle sums to zero.
    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let (sum, count) = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .flatten()
                .fold((0.0, 0usize), |(s, c), d| (s + d, c + 1));
            // n >= 2 * period guarantees every phase has a defined value
            sum / count.max(1) as f64
        })
        .collect();
    let level = phase_means.iter().sum::<f64>() / period as f64;
    for m in &mut phase_means {
        *m -= level;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();

    let residual = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((v, t), s)| t.map(|t| v - t - s))
        .collect();

    Ok(Decomposition {
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
    })
}

/// Two-sided moving average over `period` observations.
///
/// Even periods use a `2 x period` average (half weight on both window ends)
/// so the window stays centered on the observation.
fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let half = period / 2;
    let weights: Vec<f64> = if period % 2 == 0 {
        (0..=period)
            .map(|k| if k == 0 || k == period { 0.5 } else { 1.0 })
            .map(|w| w / period as f64)
            .collect()
    } else {
        vec![1.0 / period as f64; period]
    };

    (0..values.len())
        .map(|i| {
            if i < half || i + half >= values.len() {
                return None;
            }
            let window = &values[i - half..=i + half];
            Some(window.iter().zip(&weights).map(|(v, w)| v * w).sum())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    const TOL: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOL
    }

    /// Linear trend plus a fixed zero-mean annual pattern.
    fn seasonal_line(n: usize) -> (Vec<f64>, Vec<f64>) {
        let pattern: Vec<f64> = (0..12).map(|m| 10.0 * (2.0 * PI * m as f64 / 12.0).sin()).collect();
        let values = (0..n).map(|i| 500.0 + 2.0 * i as f64 + pattern[i % 12]).collect();
        (values, pattern)
    }

    #[test]
    fn components_reconstruct_the_observed_series() {
        let values: Vec<f64> = (0..48)
            .map(|i| 100.0 + (i * 7 % 13) as f64 + 3.0 * (i % 12) as f64)
            .collect();
        let d = decompose_additive(&values, 12).unwrap();

        assert_eq!(d.observed, values);
        for i in 0..values.len() {
            if let (Some(t), Some(r)) = (d.trend[i], d.residual[i]) {
                assert!(close(t + d.seasonal[i] + r, d.observed[i]), "index {i}");
            }
        }
    }

    #[test]
    fn trend_edges_are_undefined() {
        let (values, _) = seasonal_line(36);
        let d = decompose_additive(&values, 12).unwrap();

        assert_eq!(d.trend.iter().take_while(|t| t.is_none()).count(), 6);
        assert_eq!(d.trend.iter().rev().take_while(|t| t.is_none()).count(), 6);
        assert_eq!(d.trend.iter().flatten().count(), 24);
        assert_eq!(d.residual.iter().flatten().count(), 24);
        assert!(d.seasonal.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn seasonal_component_is_centered_and_periodic() {
        let values: Vec<f64> = (0..60).map(|i| ((i * 31) % 17) as f64).collect();
        let d = decompose_additive(&values, 12).unwrap();

        let cycle: f64 = d.seasonal[..12].iter().sum();
        assert!(cycle.abs() < TOL);
        for i in 12..60 {
            assert!(close(d.seasonal[i], d.seasonal[i - 12]));
        }
    }

    #[test]
    fn recovers_line_and_pattern() {
        let (values, pattern) = seasonal_line(48);
        let d = decompose_additive(&values, 12).unwrap();

        for i in 6..42 {
            let t = d.trend[i].unwrap();
            assert!(close(t, 500.0 + 2.0 * i as f64), "trend at {i}: {t}");
            assert!(close(d.seasonal[i], pattern[i % 12]), "seasonal at {i}");
            assert!(d.residual[i].unwrap().abs() < 1e-6);
        }
    }

    #[test]
    fn odd_period_uses_plain_average() {
        let values: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let d = decompose_additive(&values, 3).unwrap();

        assert_eq!(d.trend[0], None);
        assert!(close(d.trend[1].unwrap(), 1.0));
        assert!(close(d.trend[7].unwrap(), 7.0));
        assert_eq!(d.trend[8], None);
    }

    #[test]
    fn rejects_short_or_bad_input() {
        assert_eq!(
            decompose_additive(&[1.0; 23], 12),
            Err(DecompositionError::TooShort {
                required: 24,
                available: 23
            })
        );
        assert_eq!(
            decompose_additive(&[1.0; 10], 1),
            Err(DecompositionError::InvalidPeriod(1))
        );
        let mut values = vec![1.0; 24];
        values[5] = f64::NAN;
        assert_eq!(
            AdditiveDecomposer.decompose(&values, 12),
            Err(DecompositionError::NonFinite { index: 5 })
        );
    }

    #[test]
    fn constant_series_has_flat_components() {
        let d = decompose_additive(&[5.0; 24], 12).unwrap();
        assert!(d.trend.iter().flatten().all(|t| close(*t, 5.0)));
        assert!(d.seasonal.iter().all(|s| close(*s, 0.0)));
        assert!(d.residual.iter().flatten().all(|r| close(*r, 0.0)));
    }
}
