use std::collections::BTreeSet;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Filter selection: one country, one meat type, a set of value categories
// ---------------------------------------------------------------------------

/// What the user picked in the side panel.
///
/// `country` and `meat_type` are drawn from the dataset's distinct values and
/// `value_categories` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub country: String,
    pub meat_type: String,
    pub value_categories: BTreeSet<String>,
}

impl FilterSelection {
    /// First country, first meat type and every value category.
    /// `None` when the dataset has no records.
    pub fn for_dataset(dataset: &Dataset) -> Option<Self> {
        Some(FilterSelection {
            country: dataset.countries.first()?.clone(),
            meat_type: dataset.meat_types.first()?.clone(),
            value_categories: dataset.value_categories.iter().cloned().collect(),
        })
    }

    /// Re-check the selection against a (re)loaded dataset.
    ///
    /// Values the dataset no longer has fall back to the defaults; the
    /// category set is intersected with what exists and reset to all of them
    /// if nothing survives. Returns `false` for an empty dataset.
    pub fn revalidate(&mut self, dataset: &Dataset) -> bool {
        let Some(defaults) = FilterSelection::for_dataset(dataset) else {
            return false;
        };

        if !dataset.countries.contains(&self.country) {
            self.country = defaults.country;
        }
        if !dataset.meat_types.contains(&self.meat_type) {
            self.meat_type = defaults.meat_type;
        }
        self.value_categories
            .retain(|c| defaults.value_categories.contains(c));
        if self.value_categories.is_empty() {
            self.value_categories = defaults.value_categories;
        }
        true
    }

    /// Whether a record passes all three predicates.
    pub fn matches(&self, record: &Record) -> bool {
        record.country == self.country
            && record.meat_type == self.meat_type
            && self.value_categories.contains(&record.value_category)
    }
}

// ---------------------------------------------------------------------------
// Filtered series
// ---------------------------------------------------------------------------

/// Records matching a [`FilterSelection`], ascending by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredSeries {
    pub records: Vec<Record>,
}

impl FilteredSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Apply the selection and sort by date.
///
/// The sort is stable: records sharing a date keep their file order.
pub fn filter(dataset: &Dataset, selection: &FilterSelection) -> FilteredSeries {
    let mut records: Vec<Record> = dataset
        .records
        .iter()
        .filter(|rec| selection.matches(rec))
        .cloned()
        .collect();
    records.sort_by_key(|rec| rec.date);
    FilteredSeries { records }
}
