//! CSV export
//!
//! Serializes a table to comma-delimited CSV with a header row, in the
//! encoding the export point calls for: the raw preview keeps the source
//! file's EUC-KR encoding, aggregate and filtered-row exports use UTF-8.
//!
//! Dates are written back as `YYYYMMDD`, so re-loading an exported raw
//! table through [`crate::reader::load_csv_bytes`] reproduces the same
//! row count and column set.

use polars::prelude::*;

use crate::{DashError, Result};

/// Text encoding of an export payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// The source file's single-byte Korean encoding.
    EucKr,
    /// Universal text encoding for aggregate downloads.
    Utf8,
}

/// One downloadable CSV payload.
#[derive(Debug, Clone)]
pub struct Export {
    /// Content-derived file name, including the `.csv` extension.
    pub name: String,
    pub encoding: Encoding,
    pub bytes: Vec<u8>,
}

impl Export {
    pub fn new(name: impl Into<String>, df: &DataFrame, encoding: Encoding) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            encoding,
            bytes: to_csv(df, encoding)?,
        })
    }
}

/// Serialize a table to CSV bytes in the requested encoding.
pub fn to_csv(df: &DataFrame, encoding: Encoding) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .with_date_format(Some("%Y%m%d".to_string()))
        .finish(&mut df)
        .map_err(|e| DashError::Export(format!("CSV serialization failed: {}", e)))?;

    match encoding {
        Encoding::Utf8 => Ok(buf),
        Encoding::EucKr => {
            let text = String::from_utf8(buf)
                .map_err(|e| DashError::Export(format!("CSV output is not UTF-8: {}", e)))?;
            let (bytes, _, had_errors) = encoding_rs::EUC_KR.encode(&text);
            if had_errors {
                return Err(DashError::Export(
                    "Table contains characters not representable in EUC-KR".to_string(),
                ));
            }
            Ok(bytes.into_owned())
        }
    }
}
