/// Seasonal decomposition of a filtered series.
///
/// ```text
///   FilteredSeries
///        │
///        ▼
///   ┌──────────┐
///   │ adapter   │  size gate (≥ 24), re-index by date
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ decompose │  additive, period 12 → observed / trend / seasonal / residual
///   └──────────┘
/// ```

pub mod adapter;
pub mod decompose;
