// Fraud Dashboard - Core Library
// Exposes all modules for use in the TUI binary and tests

pub mod dataset;
pub mod loader;
pub mod filter;
pub mod metrics;
pub mod charts;
pub mod geo;
pub mod config;

// Only compiled when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use dataset::{
    canonical_name, canonicalize_headers, source_name, Dataset, Estado, Transaction, COLUMN_MAP,
    DETAIL_COLUMNS,
};
pub use loader::{inspect_path, inspect_report, load_dataset, DatasetCache};
pub use filter::{EstadoFilter, FilterRow, FilterState};
pub use metrics::DashboardMetrics;
pub use charts::{
    category_counts, map_points, AmountHistogram, CategoryCount, HistogramBin, MapPoint,
    HISTOGRAM_BINS,
};
pub use geo::{CityRegistry, BUILTIN_CITY_COORDS};
pub use config::{
    dashboard_home, load_secrets, log_level, resolve_data_path, Secrets, DEFAULT_DATA_FILE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
