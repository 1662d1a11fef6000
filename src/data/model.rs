use std::collections::HashSet;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// A single production record (one row of the source table).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Observation month (day is normally the 1st).
    pub date: NaiveDate,
    pub country: String,
    pub meat_type: String,
    /// e.g. "Production", "Import", "Export".
    pub value_category: String,
    /// Tonnes, non-negative.
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with the distinct values of each filter column.
///
/// Distinct values keep the order in which they first appear in the file,
/// so the first entry is what a fresh selection starts from.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records, in file order.
    pub records: Vec<Record>,
    pub countries: Vec<String>,
    pub meat_types: Vec<String>,
    pub value_categories: Vec<String>,
}

impl Dataset {
    /// Build the column indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut countries = Distinct::default();
        let mut meat_types = Distinct::default();
        let mut value_categories = Distinct::default();

        for rec in &records {
            countries.push(&rec.country);
            meat_types.push(&rec.meat_type);
            value_categories.push(&rec.value_category);
        }

        Dataset {
            records,
            countries: countries.values,
            meat_types: meat_types.values,
            value_categories: value_categories.values,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// First-appearance-ordered set of strings.
#[derive(Default)]
struct Distinct {
    seen: HashSet<String>,
    values: Vec<String>,
}

impl Distinct {
    fn push(&mut self, value: &str) {
        if !self.seen.contains(value) {
            self.seen.insert(value.to_string());
            self.values.push(value.to_string());
        }
    }
}

#[cfg(test)]
pub(crate) fn record(date: &str, country: &str, meat: &str, category: &str, value: f64) -> Record {
    Record {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        country: country.to_string(),
        meat_type: meat.to_string(),
        value_category: category.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_values_keep_first_appearance_order() {
        let ds = Dataset::from_records(vec![
            record("2020-01-01", "Germany", "Pork", "Production", 1.0),
            record("2020-01-01", "Austria", "Beef", "Import", 2.0),
            record("2020-02-01", "Germany", "Beef", "Production", 3.0),
            record("2020-02-01", "Belgium", "Pork", "Export", 4.0),
        ]);

        assert_eq!(ds.len(), 4);
        assert_eq!(ds.countries, vec!["Germany", "Austria", "Belgium"]);
        assert_eq!(ds.meat_types, vec!["Pork", "Beef"]);
        assert_eq!(ds.value_categories, vec!["Production", "Import", "Export"]);
    }

    #[test]
    fn empty_dataset_has_no_distinct_values() {
        let ds = Dataset::from_records(Vec::new());
        assert!(ds.is_empty());
        assert!(ds.countries.is_empty());
        assert!(ds.value_categories.is_empty());
    }
}
