/// Data layer: core types, loading, caching and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset   (cache: once per path)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, distinct countries / meat types / categories
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  country == · ∧ meat type == · ∧ category ∈ · → FilteredSeries
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
