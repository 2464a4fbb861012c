//! Full-recompute orchestration
//!
//! [`Dashboard`] holds the two long-lived resources (the loaded table and
//! the district geometry) and recomputes everything else from scratch for
//! each interaction: filter views, aggregates, chart specs, and export
//! payloads, all bundled in a [`Frame`].
//!
//! Which filter stage feeds which output is fixed policy:
//!
//! | output            | view                  |
//! |-------------------|-----------------------|
//! | choropleth map    | customer-region view  |
//! | line chart        | customer-region view  |
//! | pie chart         | fully filtered view   |
//! | bar chart         | fully filtered view   |
//! | aggregate exports | fully filtered view   |
//!
//! The narrower scope of the map and line chart is intentional: they
//! always show the full spread for the selected customer region.

use polars::prelude::DataFrame;
use serde_json::Value;

use crate::export::{Encoding, Export};
use crate::filter::{self, Views};
use crate::reader::geometry::DistrictGeometry;
use crate::selection::{self, Selection};
use crate::writer::{BarWriter, ChartWriter, ChoroplethWriter, LineWriter, PieWriter};
use crate::{aggregate, schema, Result};

/// The aggregate tables of one interaction cycle.
#[derive(Debug, Clone)]
pub struct Aggregates {
    /// Metric per merchant region over the customer-region view (map input).
    pub map_regions: DataFrame,
    /// Metric per merchant region over the filtered view (pie input, export).
    pub regions: DataFrame,
    /// Metric per age band over the customer-region view (line input).
    pub age_trend: DataFrame,
    /// Metric per age band over the filtered view (export).
    pub ages: DataFrame,
    /// Metric per business category and age band over the filtered view.
    pub category_age: DataFrame,
}

/// The four chart specs of one interaction cycle, as Vega-Lite JSON.
#[derive(Debug, Clone)]
pub struct Charts {
    pub map: Value,
    pub pie: Value,
    pub line: Value,
    pub bar: Value,
}

/// Cascaded widget domains for a selection.
///
/// Each domain is computed from the previous filter stage's output, so
/// the customer-region domain is a superset of what survives later
/// stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    pub customer_regions: Vec<String>,
    pub merchant_regions: Vec<String>,
    pub genders: Vec<String>,
    pub age_bands: Vec<String>,
}

/// Everything one interaction produces.
#[derive(Debug, Clone)]
pub struct Frame {
    pub views: Views,
    pub aggregates: Aggregates,
    pub charts: Charts,
    pub exports: Vec<Export>,
}

impl Frame {
    /// Look up an export payload by file name.
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }
}

/// The dashboard engine: loaded table + geometry, recomputed per call.
pub struct Dashboard {
    data: DataFrame,
    geometry: DistrictGeometry,
}

impl Dashboard {
    pub fn new(data: DataFrame, geometry: DistrictGeometry) -> Self {
        Self { data, geometry }
    }

    /// The full loaded table (all dates, unfiltered).
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn geometry(&self) -> &DistrictGeometry {
        &self.geometry
    }

    /// Compute the cascaded widget domains for a selection.
    pub fn domains(&self, selection: &Selection) -> Result<Domains> {
        let (start, end) = selection.date_range;
        let dated = filter::by_date_range(&self.data, start, end)?;
        let customer_regions = selection::column_domain(&dated, schema::CUSTOMER_REGION)?;

        let customer = filter::by_customer_region(&dated, &selection.customer_region)?;
        let merchant_regions = selection::column_domain(&customer, schema::MERCHANT_REGION)?;

        let merchant = filter::by_merchant_regions(&customer, &selection.merchant_regions)?;
        let genders = selection::column_domain(&merchant, schema::GENDER)?;

        let gender = filter::by_genders(&merchant, &selection.genders)?;
        let age_bands = selection::column_domain(&gender, schema::AGE_BAND)?;

        Ok(Domains {
            customer_regions,
            merchant_regions,
            genders,
            age_bands,
        })
    }

    /// Recompute the whole pipeline for one selection.
    pub fn render(&self, selection: &Selection) -> Result<Frame> {
        let metric = selection.metric;
        let views = filter::run(&self.data, selection)?;

        let aggregates = Aggregates {
            map_regions: aggregate::by_merchant_region(&views.customer, metric)?,
            regions: aggregate::by_merchant_region(&views.filtered, metric)?,
            age_trend: aggregate::by_age_band(&views.customer, metric)?,
            ages: aggregate::by_age_band(&views.filtered, metric)?,
            category_age: aggregate::by_category_age(&views.filtered, metric)?,
        };

        let charts = Charts {
            map: ChoroplethWriter::new(&self.geometry, metric).write(&aggregates.map_regions)?,
            pie: PieWriter::new(metric).write(&aggregates.regions)?,
            line: LineWriter::new(metric).write(&aggregates.age_trend)?,
            bar: BarWriter::new(metric).write(&aggregates.category_age)?,
        };

        let exports = vec![
            Export::new("preview.csv", &self.data, Encoding::EucKr)?,
            Export::new(
                format!("merchant_region_{}.csv", metric.slug()),
                &aggregates.regions,
                Encoding::Utf8,
            )?,
            Export::new(
                format!("age_band_{}.csv", metric.slug()),
                &aggregates.ages,
                Encoding::Utf8,
            )?,
            Export::new(
                format!("category_age_{}.csv", metric.slug()),
                &aggregates.category_age,
                Encoding::Utf8,
            )?,
            Export::new("filtered_rows.csv", &views.filtered, Encoding::Utf8)?,
        ];

        Ok(Frame {
            views,
            aggregates,
            charts,
            exports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader;
    use crate::reader::geometry::tests::sample_geojson;
    use crate::selection::{AgeSelection, Metric};
    use chrono::NaiveDate;

    fn sample_data() -> DataFrame {
        let csv = "\
일별(DATE),고객주소시군구(CUSTM_GU_NM),가맹점주소시군구(STORE_GU_NM),성별(GENDER),연령대별(AGE_GR),업종(UPJONG_NM),카드이용금액(USE_AMT),카드이용건수(USE_CNT)
20170106,강남구,마포구,여성,20대,한식,12000,2
20170601,강남구,종로구,남성,30대,커피,4500,1
20180315,강남구,마포구,남성,40대,한식,8000,1
20180901,강남구,용산구,여성,30대,일식,22000,2
20190501,서초구,강남구,여성,50대,한식,30000,3
20191229,서초구,종로구,남성,20대,커피,6000,2
";
        let bytes = encoding_rs::EUC_KR.encode(csv).0.into_owned();
        reader::load_csv_bytes(&bytes).unwrap()
    }

    fn dashboard() -> Dashboard {
        let geometry = DistrictGeometry::from_str(&sample_geojson()).unwrap();
        Dashboard::new(sample_data(), geometry)
    }

    fn gangnam_selection(metric: Metric) -> Selection {
        Selection {
            metric,
            date_range: (
                NaiveDate::from_ymd_opt(2017, 1, 6).unwrap(),
                NaiveDate::from_ymd_opt(2019, 12, 29).unwrap(),
            ),
            customer_region: "강남구".to_string(),
            merchant_regions: vec![],
            genders: vec![],
            age_bands: AgeSelection::Range("20대".to_string(), "40대".to_string()),
        }
    }

    #[test]
    fn test_pie_values_sum_to_customer_region_total() {
        // With no merchant/gender narrowing and the full age range, the
        // pie must account for every won spent by the selected customer
        // region within the date window.
        let frame = dashboard().render(&gangnam_selection(Metric::Amount)).unwrap();
        let values = frame.charts.pie["data"]["values"].as_array().unwrap();
        let sum: i64 = values
            .iter()
            .map(|v| v[schema::LABEL_TOTAL].as_i64().unwrap())
            .sum();
        assert_eq!(sum, 12000 + 4500 + 8000 + 22000);
    }

    #[test]
    fn test_map_bypasses_merchant_filter() {
        let selection =
            gangnam_selection(Metric::Amount).with_merchant_regions(vec!["마포구".to_string()]);
        let frame = dashboard().render(&selection).unwrap();

        // The pie narrows to the selected merchant region...
        assert_eq!(frame.aggregates.regions.height(), 1);
        // ...but the map aggregate still spans every merchant region of
        // the customer view.
        assert_eq!(frame.aggregates.map_regions.height(), 3);
    }

    #[test]
    fn test_line_bypasses_gender_and_age_filters() {
        let selection = gangnam_selection(Metric::Count)
            .with_genders(vec!["여성".to_string()])
            .with_age_bands(AgeSelection::Single("20대".to_string()));
        let frame = dashboard().render(&selection).unwrap();

        // Filtered view: one row (여성, 20대). Line still covers the
        // customer view's 20대/30대/40대 bands.
        assert_eq!(frame.views.filtered.height(), 1);
        assert_eq!(frame.aggregates.age_trend.height(), 3);
    }

    #[test]
    fn test_domains_cascade() {
        let selection = gangnam_selection(Metric::Amount);
        let domains = dashboard().domains(&selection).unwrap();
        assert_eq!(domains.customer_regions, vec!["강남구", "서초구"]);
        assert_eq!(
            domains.merchant_regions,
            vec!["마포구", "용산구", "종로구"]
        );
        assert_eq!(domains.genders, vec!["남성", "여성"]);
        assert_eq!(domains.age_bands, vec!["20대", "30대", "40대"]);
    }

    #[test]
    fn test_domains_narrow_downstream_only() {
        // Narrowing the merchant selection narrows gender/age domains but
        // never the customer or merchant domains themselves.
        let selection =
            gangnam_selection(Metric::Amount).with_merchant_regions(vec!["종로구".to_string()]);
        let domains = dashboard().domains(&selection).unwrap();
        assert_eq!(
            domains.merchant_regions,
            vec!["마포구", "용산구", "종로구"]
        );
        assert_eq!(domains.genders, vec!["남성"]);
        assert_eq!(domains.age_bands, vec!["30대"]);
    }

    #[test]
    fn test_render_produces_five_exports() {
        let frame = dashboard().render(&gangnam_selection(Metric::Amount)).unwrap();
        assert_eq!(frame.exports.len(), 5);
        assert!(frame.export("preview.csv").is_some());
        assert!(frame.export("merchant_region_amount.csv").is_some());
        assert!(frame.export("age_band_amount.csv").is_some());
        assert!(frame.export("category_age_amount.csv").is_some());
        assert!(frame.export("filtered_rows.csv").is_some());
    }

    #[test]
    fn test_unmatched_district_absent_from_exports() {
        // 종로구 is in the geometry; with a merchant filter excluding it
        // the aggregate export must not mention it, while the map still
        // renders its polygon (transparent).
        let selection =
            gangnam_selection(Metric::Amount).with_merchant_regions(vec!["마포구".to_string()]);
        let frame = dashboard().render(&selection).unwrap();

        let export = frame.export("merchant_region_amount.csv").unwrap();
        let text = String::from_utf8(export.bytes.clone()).unwrap();
        assert!(!text.contains("종로구"));

        let features = frame.charts.map["data"]["values"]["features"]
            .as_array()
            .unwrap();
        assert!(features
            .iter()
            .any(|f| f["properties"][schema::GEOMETRY_NAME_KEY] == "종로구"));
    }

    #[test]
    fn test_empty_result_degrades_gracefully() {
        let selection = gangnam_selection(Metric::Amount).with_date_range(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        );
        let frame = dashboard().render(&selection).unwrap();
        assert_eq!(frame.views.filtered.height(), 0);
        assert!(frame.charts.pie["data"]["values"]
            .as_array()
            .unwrap()
            .is_empty());
        assert!(frame.charts.bar["data"]["values"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_render_is_deterministic() {
        let dashboard = dashboard();
        let selection = gangnam_selection(Metric::Count);
        let first = dashboard.render(&selection).unwrap();
        let second = dashboard.render(&selection).unwrap();
        assert_eq!(first.charts.pie, second.charts.pie);
        assert_eq!(first.charts.map, second.charts.map);
        assert!(first.views.filtered.equals(&second.views.filtered));
    }
}
