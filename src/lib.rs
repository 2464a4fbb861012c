/*!
# nomadash - Nomad Consumption Dashboard Engine

An engine for exploring Seoul's single-person ("nomad") card-consumption
dataset: card spending that occurred outside the cardholder's home,
workplace, and primary-spending districts.

The engine is a single-pass pipeline over one in-memory table. Given a
loaded dataset, a district geometry resource, and an immutable selection
state, it recomputes every derived view, aggregate, chart, and export from
scratch - there is no incremental state between interactions.

## Example

```rust,ignore
use nomadash::{reader, Dashboard, Selection, Metric};

let data = reader::load_csv("nomad_consumption.csv")?;
let geometry = reader::geometry::load_geojson("seoul_districts.json")?;

let dashboard = Dashboard::new(data, geometry);
let selection = Selection::defaults(dashboard.data(), Metric::Amount)?
    .with_customer_region("강남구");

let frame = dashboard.render(&selection)?;
println!("{}", frame.charts.pie);
```

## Architecture

The pipeline runs strictly top to bottom on every interaction:
- **Loader** → EUC-KR CSV into a Polars DataFrame with a parsed date column
- **Filter chain** → date range, then customer region, merchant regions,
  genders, and age bands, each stage a pure view of the previous one
- **Aggregator** → group-and-sum parameterized by the selected metric
- **Writers** → Vega-Lite JSON for the choropleth map, pie, line, and bar
- **Export** → CSV payloads at five points, per-export encoding

## Core Components

- [`reader`] - Dataset and geometry loading
- [`selection`] - Selection state and cascaded widget domains
- [`filter`] - Date-range selector and cascading filter chain
- [`aggregate`] - Metric-parameterized group-and-sum
- [`writer`] - Chart output layer (Vega-Lite JSON)
- [`export`] - CSV export with per-export encoding
- [`dashboard`] - Full-recompute orchestration
*/

pub mod aggregate;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod reader;
pub mod schema;
pub mod selection;
pub mod writer;

// Re-export key types for convenience
pub use dashboard::{Dashboard, Frame};
pub use reader::geometry::DistrictGeometry;
pub use selection::{AgeSelection, Metric, Selection};

// DataFrame abstraction (wraps Polars)
pub use polars::prelude::DataFrame;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum DashError {
    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Filter error: {0}")]
    Filter(String),

    #[error("Aggregation error: {0}")]
    Aggregate(String),

    #[error("Chart output error: {0}")]
    Writer(String),

    #[error("Export error: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, DashError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
