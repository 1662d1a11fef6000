use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use serde::Deserialize;
use thiserror::Error;

use super::model::{Dataset, Record};

pub const DATE: &str = "Date";
pub const COUNTRY: &str = "Country";
pub const MEAT_TYPE: &str = "Meat Type";
pub const VALUE_CATEGORY: &str = "Value Category";
pub const VALUE: &str = "Value";

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = [DATE, COUNTRY, MEAT_TYPE, VALUE_CATEGORY, VALUE];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A `Date` cell that could not be read as a calendar date.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("row {row}: cannot parse '{value}' as a date")]
pub struct DateParseError {
    /// 1-based data row.
    pub row: usize,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },
    #[error("row {row}: invalid value '{value}' (expected a non-negative number of tonnes)")]
    InvalidValue { row: usize, value: String },
    #[error(transparent)]
    Date(#[from] DateParseError),
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet: {0}")]
    Parquet(#[from] ParquetError),
    #[error("Arrow: {0}")]
    Arrow(#[from] ArrowError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a production dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least the [`REQUIRED_COLUMNS`]
/// * `.json`    – `[{ "Date": ..., "Country": ..., ... }, ...]`
/// * `.parquet` – flat columns with the same names
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    if dataset.is_empty() {
        log::warn!("{} contains no records", path.display());
    }
    Ok(dataset)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse the textual forms a `Date` column shows up in.
///
/// `YYYY-MM` is read as the first of that month.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok()
}

fn parse_value(text: &str, row: usize) -> Result<f64, LoadError> {
    let invalid = || LoadError::InvalidValue {
        row,
        value: text.to_string(),
    };
    let value: f64 = text.trim().parse().map_err(|_| invalid())?;
    check_value(value, row)?;
    Ok(value)
}

fn check_value(value: f64, row: usize) -> Result<(), LoadError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LoadError::InvalidValue {
            row,
            value: value.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Columns other than the required ones are ignored.
fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open(path)?);

    let headers = build_header_map(reader.headers()?);
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = *headers
            .get(name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
    }
    let [date_idx, country_idx, meat_idx, category_idx, value_idx] = idx;

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let rec = result?;
        let field = |col: usize| rec.get(col).unwrap_or("");

        let date_text = field(date_idx);
        let date = parse_date(date_text).ok_or_else(|| DateParseError {
            row,
            value: date_text.to_string(),
        })?;

        records.push(Record {
            date,
            country: field(country_idx).to_string(),
            meat_type: field(meat_idx).to_string(),
            value_category: field(category_idx).to_string(),
            value: parse_value(field(value_idx), row)?,
        });
    }

    Ok(Dataset::from_records(records))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), i))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as `df.to_json(orient='records')` writes it.
#[derive(Debug, Deserialize)]
struct JsonRecord {
    #[serde(rename = "Date")]
    date: JsonDate,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Meat Type")]
    meat_type: String,
    #[serde(rename = "Value Category")]
    value_category: String,
    #[serde(rename = "Value")]
    value: Option<f64>,
}

/// Dates arrive either as text or as epoch milliseconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDate {
    Text(String),
    EpochMillis(i64),
}

impl fmt::Display for JsonDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonDate::Text(text) => write!(f, "{text}"),
            JsonDate::EpochMillis(ms) => write!(f, "{ms}"),
        }
    }
}

fn load_json(path: &Path) -> Result<Dataset, LoadError> {
    let rows: Vec<JsonRecord> = serde_json::from_reader(std::io::BufReader::new(open(path)?))?;

    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let row = i + 1;
            let date = match raw.date {
                JsonDate::Text(ref text) => parse_date(text),
                JsonDate::EpochMillis(ms) => {
                    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.date_naive())
                }
            }
            .ok_or_else(|| DateParseError {
                row,
                value: raw.date.to_string(),
            })?;
            let value = raw.value.ok_or_else(|| LoadError::InvalidValue {
                row,
                value: "null".to_string(),
            })?;
            check_value(value, row)?;

            Ok(Record {
                date,
                country: raw.country,
                meat_type: raw.meat_type,
                value_category: raw.value_category,
                value,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// `Date` may be stored as text, Date32/Date64 or a timestamp; `Value` as
/// any numeric type. Works with files written by both Pandas and Polars.
fn load_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?.build()?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let offset = records.len();

        let dates = date_column(column(&batch, DATE)?, offset)?;
        let countries = cast(column(&batch, COUNTRY)?, &DataType::Utf8)?;
        let meats = cast(column(&batch, MEAT_TYPE)?, &DataType::Utf8)?;
        let categories = cast(column(&batch, VALUE_CATEGORY)?, &DataType::Utf8)?;
        let raw_values = column(&batch, VALUE)?;
        let values = cast(raw_values, &DataType::Float64)?;

        let countries = countries.as_string::<i32>();
        let meats = meats.as_string::<i32>();
        let categories = categories.as_string::<i32>();
        let values = values.as_primitive::<Float64Type>();

        for (i, date) in dates.into_iter().enumerate() {
            let row = offset + i + 1;
            let require = |arr: &dyn Array, name: &str| {
                if arr.is_null(i) {
                    Err(LoadError::Malformed {
                        row,
                        message: format!("null in column '{name}'"),
                    })
                } else {
                    Ok(())
                }
            };
            require(countries, COUNTRY)?;
            require(meats, MEAT_TYPE)?;
            require(categories, VALUE_CATEGORY)?;
            if values.is_null(i) {
                // Non-numeric text casts to null as well; report the cell itself.
                return Err(LoadError::InvalidValue {
                    row,
                    value: cell_text(raw_values, i),
                });
            }
            let value = values.value(i);
            check_value(value, row)?;

            records.push(Record {
                date,
                country: countries.value(i).to_string(),
                meat_type: meats.value(i).to_string(),
                value_category: categories.value(i).to_string(),
                value,
            });
        }
    }

    Ok(Dataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, LoadError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

/// Source text of one cell, or "null".
fn cell_text(col: &ArrayRef, i: usize) -> String {
    if col.is_null(i) {
        return "null".to_string();
    }
    cast(col, &DataType::Utf8)
        .ok()
        .and_then(|text| {
            let text = text.as_string::<i32>();
            (!text.is_null(i)).then(|| text.value(i).to_string())
        })
        .unwrap_or_else(|| "null".to_string())
}

/// Convert a `Date` column of any supported type to calendar dates.
fn date_column(col: &ArrayRef, offset: usize) -> Result<Vec<NaiveDate>, LoadError> {
    let bad = |i: usize, value: String| DateParseError {
        row: offset + i + 1,
        value,
    };

    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = cast(col, &DataType::Utf8)?;
            let text = text.as_string::<i32>();
            (0..text.len())
                .map(|i| {
                    if text.is_null(i) {
                        return Err(LoadError::from(bad(i, "null".to_string())));
                    }
                    parse_date(text.value(i))
                        .ok_or_else(|| LoadError::from(bad(i, text.value(i).to_string())))
                })
                .collect()
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let days = cast(col, &DataType::Date32)?;
            let days = days.as_primitive::<Date32Type>();
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
            (0..days.len())
                .map(|i| {
                    if days.is_null(i) {
                        return Err(LoadError::from(bad(i, "null".to_string())));
                    }
                    let d = days.value(i);
                    epoch
                        .checked_add_signed(Duration::days(d.into()))
                        .ok_or_else(|| LoadError::from(bad(i, d.to_string())))
                })
                .collect()
        }
        other => Err(LoadError::Malformed {
            row: offset + 1,
            message: format!("column '{DATE}' has unsupported type {other:?}"),
        }),
    }
}
