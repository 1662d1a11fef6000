use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{FromColor, Hsl, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Hue step between consecutive colours (the golden angle), so the first
/// categories keep their colours when more are added.
const HUE_STEP: f32 = 137.508;

/// `n` distinct category colours.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (30.0 + i as f32 * HUE_STEP) % 360.0;
            let hsl: Hsl = Hsl::new(hue, 0.7, 0.45);
            let rgb = Srgb::<f32>::from_color(hsl).into_format::<u8>();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: value category → Color32
// ---------------------------------------------------------------------------

/// Maps each value category to a distinct colour.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map from the dataset's value categories.
    pub fn new(categories: &[String]) -> Self {
        let mapping = categories
            .iter()
            .cloned()
            .zip(generate_palette(categories.len()))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a category; unknown categories are grey.
    pub fn color_for(&self, category: &str) -> Color32 {
        self.mapping.get(category).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        assert!(generate_palette(0).is_empty());
        let colours = generate_palette(3);
        assert_eq!(colours.len(), 3);
        assert_ne!(colours[0], colours[1]);
        assert_ne!(colours[1], colours[2]);
        assert_ne!(colours[0], colours[2]);
    }

    #[test]
    fn adding_categories_keeps_earlier_colours() {
        let small = generate_palette(2);
        let large = generate_palette(5);
        assert_eq!(small[..], large[..2]);
    }

    #[test]
    fn unknown_category_falls_back_to_grey() {
        let map = ColorMap::new(&["Production".to_string(), "Import".to_string()]);
        assert_ne!(map.color_for("Production"), map.color_for("Import"));
        assert_eq!(map.color_for("Export"), Color32::GRAY);
    }
}
