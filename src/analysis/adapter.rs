use chrono::{Datelike, NaiveDate};

use super::decompose::{Decomposer, DecompositionError};
use crate::data::filter::FilteredSeries;

/// Observations per seasonal cycle. The series is assumed to be monthly
/// with an annual cycle; the actual date spacing is not used to infer it.
pub const SEASONAL_PERIOD: usize = 12;

/// Two full cycles.
pub const MIN_OBSERVATIONS: usize = 2 * SEASONAL_PERIOD;

// ---------------------------------------------------------------------------
// Outcome of the decomposition step for one filter selection
// ---------------------------------------------------------------------------

/// Decomposed series re-indexed by date.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalComponents {
    pub dates: Vec<NaiveDate>,
    pub observed: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionOutcome {
    /// Fewer than [`MIN_OBSERVATIONS`]; the decomposer was not called.
    Insufficient { available: usize },
    Failed(DecompositionError),
    Ready(SeasonalComponents),
}

impl DecompositionOutcome {
    /// Text shown in place of the charts, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            DecompositionOutcome::Insufficient { available } => Some(format!(
                "Not enough data for seasonal decomposition. \
                 At least {MIN_OBSERVATIONS} monthly observations are required \
                 (the selection has {available})."
            )),
            DecompositionOutcome::Failed(err) => {
                Some(format!("Seasonal decomposition failed: {err}"))
            }
            DecompositionOutcome::Ready(_) => None,
        }
    }

    pub fn components(&self) -> Option<&SeasonalComponents> {
        match self {
            DecompositionOutcome::Ready(c) => Some(c),
            _ => None,
        }
    }
}

/// Gate on size, re-index by date and run the decomposer with
/// [`SEASONAL_PERIOD`].
pub fn decompose_series(series: &FilteredSeries, decomposer: &dyn Decomposer) -> DecompositionOutcome {
    if series.len() < MIN_OBSERVATIONS {
        return DecompositionOutcome::Insufficient {
            available: series.len(),
        };
    }

    let mut indexed: Vec<(NaiveDate, f64)> = series
        .records
        .iter()
        .map(|rec| (rec.date, rec.value))
        .collect();
    indexed.sort_by_key(|(date, _)| *date);
    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = indexed.into_iter().unzip();

    if !is_monthly(&dates) {
        log::warn!(
            "Series of {} observations is not evenly monthly; decomposing with period {SEASONAL_PERIOD} anyway",
            dates.len()
        );
    }

    match decomposer.decompose(&values, SEASONAL_PERIOD) {
        Ok(d) => DecompositionOutcome::Ready(SeasonalComponents {
            dates,
            observed: d.observed,
            trend: d.trend,
            seasonal: d.seasonal,
            residual: d.residual,
        }),
        Err(err) => {
            log::error!("Seasonal decomposition failed: {err}");
            DecompositionOutcome::Failed(err)
        }
    }
}

/// Every consecutive pair of dates is exactly one calendar month apart.
fn is_monthly(dates: &[NaiveDate]) -> bool {
    dates.windows(2).all(|w| {
        let months = |d: &NaiveDate| d.year() * 12 + d.month0() as i32;
        months(&w[1]) - months(&w[0]) == 1
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::analysis::decompose::{AdditiveDecomposer, Decomposition};
    use crate::data::model::record;

    /// Counts calls and delegates to the real decomposer.
    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl Decomposer for Counting {
        fn decompose(&self, values: &[f64], period: usize) -> Result<Decomposition, DecompositionError> {
            self.calls.set(self.calls.get() + 1);
            AdditiveDecomposer.decompose(values, period)
        }
    }

    struct Failing;

    impl Decomposer for Failing {
        fn decompose(&self, _: &[f64], _: usize) -> Result<Decomposition, DecompositionError> {
            Err(DecompositionError::NonFinite { index: 3 })
        }
    }

    fn monthly(n: usize) -> FilteredSeries {
        let records = (0..n)
            .map(|i| {
                let date = format!("{}-{:02}-01", 2020 + i / 12, i % 12 + 1);
                let value = 1000.0 + 5.0 * i as f64 + [30.0, -10.0, 0.0, 20.0][i % 4];
                record(&date, "Germany", "Beef", "Production", value)
            })
            .collect();
        FilteredSeries { records }
    }

    #[test]
    fn three_years_produce_four_aligned_sequences() {
        let series = monthly(36);
        let counting = Counting::default();
        let outcome = decompose_series(&series, &counting);

        assert_eq!(counting.calls.get(), 1);
        assert_eq!(outcome.message(), None);
        let c = outcome.components().unwrap();
        assert_eq!(c.dates.len(), 36);
        assert_eq!(c.observed.len(), 36);
        assert_eq!(c.trend.len(), 36);
        assert_eq!(c.seasonal.len(), 36);
        assert_eq!(c.residual.len(), 36);

        let values: Vec<f64> = series.records.iter().map(|r| r.value).collect();
        assert_eq!(c.observed, values);
        for i in 0..36 {
            if let (Some(t), Some(r)) = (c.trend[i], c.residual[i]) {
                assert!((t + c.seasonal[i] + r - c.observed[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn short_series_never_reaches_the_decomposer() {
        for n in [0, 10, MIN_OBSERVATIONS - 1] {
            let counting = Counting::default();
            let outcome = decompose_series(&monthly(n), &counting);

            assert_eq!(counting.calls.get(), 0);
            assert_eq!(outcome, DecompositionOutcome::Insufficient { available: n });
            assert!(outcome.components().is_none());
            assert!(outcome.message().unwrap().contains("At least 24 monthly observations"));
        }
    }

    #[test]
    fn exactly_two_cycles_is_enough() {
        let outcome = decompose_series(&monthly(MIN_OBSERVATIONS), &AdditiveDecomposer);
        assert!(outcome.components().is_some());
    }

    #[test]
    fn unsorted_input_is_reindexed_by_date() {
        let mut series = monthly(30);
        series.records.reverse();
        let outcome = decompose_series(&series, &AdditiveDecomposer);

        let c = outcome.components().unwrap();
        assert!(c.dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(c.observed[0], monthly(30).records[0].value);
    }

    #[test]
    fn decomposer_failure_becomes_a_message() {
        let outcome = decompose_series(&monthly(30), &Failing);
        assert!(matches!(outcome, DecompositionOutcome::Failed(_)));
        assert_eq!(
            outcome.message().unwrap(),
            "Seasonal decomposition failed: observation 3 is not a finite number"
        );
    }

    #[test]
    fn monthly_spacing_check() {
        let dates: Vec<NaiveDate> = monthly(14).records.iter().map(|r| r.date).collect();
        assert!(is_monthly(&dates));

        let mut gappy = dates.clone();
        gappy.remove(5);
        assert!(!is_monthly(&gappy));

        let mut doubled = dates;
        doubled.insert(3, doubled[3]);
        assert!(!is_monthly(&doubled));
    }
}
