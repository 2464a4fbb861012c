/*!
nomadash command line interface

Runs the dashboard pipeline headlessly: loads the consumption CSV and the
district geometry, applies a selection, and writes the chart specs and
CSV exports a UI would offer for download.
*/

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use nomadash::selection::AgeSelection;
use nomadash::{reader, Dashboard, Metric, Selection, VERSION};

#[derive(Parser)]
#[command(name = "nomadash")]
#[command(about = "Nomad consumption dashboard engine for Seoul card data")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render charts and exports for one selection
    Render {
        /// Path to the EUC-KR consumption CSV
        #[arg(long)]
        data: PathBuf,

        /// Path to the district GeoJSON
        #[arg(long)]
        geometry: PathBuf,

        /// Output directory for chart JSON and export CSV files
        #[arg(long, default_value = "out")]
        out: PathBuf,

        /// Metric to sum (amount | count)
        #[arg(long, default_value = "amount")]
        metric: Metric,

        /// Start date (YYYY-MM-DD); defaults to the dataset minimum
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD); defaults to the dataset maximum
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Customer region; defaults to the first region in sort order
        #[arg(long)]
        customer_region: Option<String>,

        /// Merchant region filter (repeatable; none = all)
        #[arg(long)]
        merchant_region: Vec<String>,

        /// Gender filter (repeatable; none = all)
        #[arg(long)]
        gender: Vec<String>,

        /// Lower age band bound; defaults to the domain minimum
        #[arg(long)]
        age_from: Option<String>,

        /// Upper age band bound; defaults to the domain maximum
        #[arg(long)]
        age_to: Option<String>,
    },

    /// Print the cascaded widget domains for a selection
    Domains {
        /// Path to the EUC-KR consumption CSV
        #[arg(long)]
        data: PathBuf,

        /// Customer region; defaults to the first region in sort order
        #[arg(long)]
        customer_region: Option<String>,

        /// Merchant region filter (repeatable; none = all)
        #[arg(long)]
        merchant_region: Vec<String>,

        /// Gender filter (repeatable; none = all)
        #[arg(long)]
        gender: Vec<String>,
    },

    /// Load the dataset and print its shape and date range
    Inspect {
        /// Path to the EUC-KR consumption CSV
        #[arg(long)]
        data: PathBuf,
    },
}

/// Build a selection from defaults plus the CLI overrides.
#[allow(clippy::too_many_arguments)]
fn build_selection(
    dashboard: &Dashboard,
    metric: Metric,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    customer_region: Option<String>,
    merchant_regions: Vec<String>,
    genders: Vec<String>,
    age_from: Option<String>,
    age_to: Option<String>,
) -> anyhow::Result<Selection> {
    let mut selection = Selection::defaults(dashboard.data(), metric)?;

    let start = start.unwrap_or(selection.date_range.0);
    let end = end.unwrap_or(selection.date_range.1);
    selection = selection.with_date_range(start, end);
    if let Some(region) = customer_region {
        selection = selection.with_customer_region(region);
    }
    selection = selection
        .with_merchant_regions(merchant_regions)
        .with_genders(genders);

    // The age domain depends on everything upstream, so resolve it last.
    let domains = dashboard.domains(&selection)?;
    let age_bands = AgeSelection::from_domain(
        &domains.age_bands,
        age_from.as_deref(),
        age_to.as_deref(),
    );
    Ok(selection.with_age_bands(age_bands))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            data,
            geometry,
            out,
            metric,
            start,
            end,
            customer_region,
            merchant_region,
            gender,
            age_from,
            age_to,
        } => {
            let table = reader::load_csv(&data)?;
            let districts = reader::geometry::load_geojson_cached(&geometry)?;
            let dashboard = Dashboard::new(table, (*districts).clone());

            let selection = build_selection(
                &dashboard,
                metric,
                start,
                end,
                customer_region,
                merchant_region,
                gender,
                age_from,
                age_to,
            )?;
            log::info!(
                "rendering: customer region '{}', metric {}",
                selection.customer_region,
                selection.metric
            );

            let frame = dashboard.render(&selection)?;

            fs::create_dir_all(&out)?;
            for (name, chart) in [
                ("map.json", &frame.charts.map),
                ("pie.json", &frame.charts.pie),
                ("line.json", &frame.charts.line),
                ("bar.json", &frame.charts.bar),
            ] {
                fs::write(out.join(name), serde_json::to_string_pretty(chart)?)?;
            }
            for export in &frame.exports {
                fs::write(out.join(&export.name), &export.bytes)?;
            }

            println!(
                "Rendered {} filtered rows into {}",
                frame.views.filtered.height(),
                out.display()
            );
        }

        Commands::Domains {
            data,
            customer_region,
            merchant_region,
            gender,
        } => {
            let table = reader::load_csv(&data)?;
            let mut selection = Selection::defaults(&table, Metric::Amount)?;
            if let Some(region) = customer_region {
                selection = selection.with_customer_region(region);
            }
            selection = selection
                .with_merchant_regions(merchant_region)
                .with_genders(gender);

            // Geometry is irrelevant for domains; an empty one will do.
            let dashboard = Dashboard::new(
                table,
                nomadash::DistrictGeometry::from_str(
                    r#"{"type": "FeatureCollection", "features": []}"#,
                )?,
            );
            let domains = dashboard.domains(&selection)?;

            println!("Customer regions: {}", domains.customer_regions.join(", "));
            println!("Merchant regions: {}", domains.merchant_regions.join(", "));
            println!("Genders: {}", domains.genders.join(", "));
            println!("Age bands: {}", domains.age_bands.join(", "));
        }

        Commands::Inspect { data } => {
            let table = reader::load_csv(&data)?;
            let (start, end) = reader::date_span(&table)?;
            println!("Rows: {}", table.height());
            println!(
                "Columns: {}",
                table
                    .get_column_names()
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("Date range: {} .. {}", start, end);
        }
    }

    Ok(())
}
