/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, distinct stations (immutable, Arc-shared)
///   └──────────┘
///        │  Selection (station, start, end)
///        ▼
///   ┌──────────┐
///   │  filter   │  station + inclusive date range → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  skip-missing means, monthly group-by → summaries
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  the four dashboard panels, JSON export
///   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
