use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::adapter::{decompose_series, DecompositionOutcome};
use crate::analysis::decompose::AdditiveDecomposer;
use crate::color::ColorMap;
use crate::data::cache::load_cached;
use crate::data::filter::{filter, FilterSelection, FilteredSeries};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Shared, read-only dataset from the load cache.
    pub dataset: Arc<Dataset>,

    /// File the dataset came from.
    pub source: PathBuf,

    /// Current filter selection (None only for an empty dataset).
    pub selection: Option<FilterSelection>,

    /// Records passing the current selection, sorted by date.
    pub series: FilteredSeries,

    /// Seasonal decomposition of `series`.
    pub decomposition: DecompositionOutcome,

    /// Colour per value category.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>, source: PathBuf) -> Self {
        let mut state = AppState {
            selection: FilterSelection::for_dataset(&dataset),
            color_map: ColorMap::new(&dataset.value_categories),
            dataset,
            source,
            series: FilteredSeries::default(),
            decomposition: DecompositionOutcome::Insufficient { available: 0 },
            status_message: None,
        };
        state.recompute();
        state
    }

    /// Swap in a newly loaded dataset, keeping as much of the selection as
    /// still applies.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>, source: PathBuf) {
        self.selection = match self.selection.take() {
            Some(mut sel) => {
                if sel.revalidate(&dataset) {
                    Some(sel)
                } else {
                    FilterSelection::for_dataset(&dataset)
                }
            }
            None => FilterSelection::for_dataset(&dataset),
        };
        self.color_map = ColorMap::new(&dataset.value_categories);
        self.dataset = dataset;
        self.source = source;
        self.status_message = None;
        self.recompute();
    }

    /// Load `path` through the cache; on failure keep the current dataset.
    pub fn open(&mut self, path: &Path) {
        match load_cached(path) {
            Ok(dataset) => self.set_dataset(dataset, path.to_path_buf()),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Re-run filter and decomposition from scratch.
    pub fn recompute(&mut self) {
        self.series = match &self.selection {
            Some(sel) => filter(&self.dataset, sel),
            None => FilteredSeries::default(),
        };
        self.decomposition = decompose_series(&self.series, &AdditiveDecomposer);
    }

    pub fn set_country(&mut self, country: &str) {
        if let Some(sel) = &mut self.selection {
            if sel.country != country {
                sel.country = country.to_string();
                self.recompute();
            }
        }
    }

    pub fn set_meat_type(&mut self, meat_type: &str) {
        if let Some(sel) = &mut self.selection {
            if sel.meat_type != meat_type {
                sel.meat_type = meat_type.to_string();
                self.recompute();
            }
        }
    }

    /// Toggle a value category. The last selected category cannot be removed.
    pub fn toggle_category(&mut self, category: &str) {
        let Some(sel) = &mut self.selection else {
            return;
        };
        if sel.value_categories.contains(category) {
            if sel.value_categories.len() == 1 {
                return;
            }
            sel.value_categories.remove(category);
        } else {
            sel.value_categories.insert(category.to_string());
        }
        self.recompute();
    }

    /// Select every value category in the dataset.
    pub fn select_all_categories(&mut self) {
        if let Some(sel) = &mut self.selection {
            sel.value_categories = self.dataset.value_categories.iter().cloned().collect();
            self.recompute();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record;

    /// 30 months of Germany/Beef production plus 10 of Austria/Beef
    /// production and import.
    fn state() -> AppState {
        let mut records = Vec::new();
        for i in 0..30 {
            let date = format!("{}-{:02}-01", 2020 + i / 12, i % 12 + 1);
            records.push(record(&date, "Germany", "Beef", "Production", 100.0 + i as f64));
        }
        for i in 0..10 {
            let date = format!("2021-{:02}-01", i + 1);
            records.push(record(&date, "Austria", "Beef", "Production", 5.0));
            records.push(record(&date, "Austria", "Beef", "Import", 1.0));
        }
        AppState::new(Arc::new(Dataset::from_records(records)), PathBuf::from("memory.csv"))
    }

    #[test]
    fn starts_with_first_values_and_decomposes() {
        let st = state();
        let sel = st.selection.as_ref().unwrap();
        assert_eq!(sel.country, "Germany");
        assert_eq!(st.series.len(), 30);
        assert!(st.decomposition.components().is_some());
    }

    #[test]
    fn switching_country_recomputes_everything() {
        let mut st = state();
        st.set_country("Austria");

        assert_eq!(st.series.len(), 20);
        assert_eq!(
            st.decomposition,
            DecompositionOutcome::Insufficient { available: 20 }
        );

        st.toggle_category("Import");
        assert_eq!(st.series.len(), 10);
        assert!(st.series.records.iter().all(|r| r.value_category == "Production"));
    }

    #[test]
    fn last_category_cannot_be_deselected() {
        let mut st = state();
        st.toggle_category("Import");
        st.toggle_category("Production");

        let sel = st.selection.as_ref().unwrap();
        assert_eq!(sel.value_categories.len(), 1);
        assert!(sel.value_categories.contains("Production"));

        st.select_all_categories();
        assert_eq!(st.selection.as_ref().unwrap().value_categories.len(), 2);
    }

    #[test]
    fn unknown_meat_type_gives_empty_series() {
        let mut st = state();
        st.set_country("Germany");
        st.set_meat_type("Pork");
        assert!(st.series.is_empty());
        assert_eq!(
            st.decomposition,
            DecompositionOutcome::Insufficient { available: 0 }
        );
    }

    #[test]
    fn failed_open_keeps_the_dataset() {
        let mut st = state();
        st.open(Path::new("/no/such/file.csv"));

        assert!(st.status_message.as_deref().unwrap().starts_with("Error:"));
        assert_eq!(st.dataset.len(), 50);
        assert_eq!(st.series.len(), 30);
    }

    #[test]
    fn new_dataset_revalidates_selection() {
        let mut st = state();
        st.set_country("Austria");
        let other = Dataset::from_records(vec![record("2020-01-01", "Poland", "Beef", "Export", 3.0)]);
        st.set_dataset(Arc::new(other), PathBuf::from("other.csv"));

        let sel = st.selection.as_ref().unwrap();
        assert_eq!(sel.country, "Poland");
        assert_eq!(sel.meat_type, "Beef");
        assert_eq!(sel.value_categories.len(), 1);
        assert_eq!(st.series.len(), 1);
    }
}
