//! Centralized naming for dataset columns, aggregate labels, and geometry keys.
//!
//! The source CSV carries the original Korean headers of the nomad
//! consumption dataset. Every module refers to columns through the
//! constants here so a header change touches exactly one file.
//!
//! # Categories
//!
//! - **Source columns**: headers of the loaded CSV
//! - **Aggregate labels**: column names used in aggregate output tables
//! - **Geometry keys**: GeoJSON property names and the city prefix
//!   stripped during district-name normalization

// ============================================================================
// Source columns
// ============================================================================

/// Transaction date, `YYYYMMDD` in the raw file, `Date` after loading
pub const DATE: &str = "일별(DATE)";

/// Administrative district of the cardholder's registered address
pub const CUSTOMER_REGION: &str = "고객주소시군구(CUSTM_GU_NM)";

/// Administrative district where the transaction occurred
pub const MERCHANT_REGION: &str = "가맹점주소시군구(STORE_GU_NM)";

/// Cardholder gender
pub const GENDER: &str = "성별(GENDER)";

/// Ordinal age band of the cardholder
pub const AGE_BAND: &str = "연령대별(AGE_GR)";

/// Business category of the merchant
pub const CATEGORY: &str = "업종(UPJONG_NM)";

/// Card usage amount (won)
pub const USE_AMOUNT: &str = "카드이용금액(USE_AMT)";

/// Card usage count (transactions)
pub const USE_COUNT: &str = "카드이용건수(USE_CNT)";

/// Columns every loaded dataset must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    DATE,
    CUSTOMER_REGION,
    MERCHANT_REGION,
    GENDER,
    AGE_BAND,
    CATEGORY,
    USE_AMOUNT,
    USE_COUNT,
];

// ============================================================================
// Aggregate labels
// ============================================================================

/// Key column label for region-keyed aggregate tables
pub const LABEL_REGION: &str = "Region";

/// Key column label for age-band-keyed aggregate tables
pub const LABEL_AGE_BAND: &str = "Age Band";

/// Key column label for business-category-keyed aggregate tables
pub const LABEL_CATEGORY: &str = "Category";

/// Value column label for summed metrics
pub const LABEL_TOTAL: &str = "Total";

// ============================================================================
// Geometry keys
// ============================================================================

/// GeoJSON property holding the administrative district name
pub const GEOMETRY_NAME_KEY: &str = "SGG_NM";

/// City prefix stripped from geometry district names before joining
pub const CITY_PREFIX: &str = "서울특별시 ";

/// Normalize a district name for joining: trim whitespace and drop the
/// administrative-city prefix if present.
pub fn normalize_district(name: &str) -> String {
    let trimmed = name.trim();
    trimmed
        .strip_prefix(CITY_PREFIX)
        .unwrap_or(trimmed)
        .to_string()
}
