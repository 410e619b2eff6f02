use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use stockanalyser_core::{FetchError, PricePoint, PriceSeries};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Load a daily price series from a CSV file.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `timestamp` (or `date`, `datetime`), `close` (or `adj close`), and
/// optionally `open`, `high`, `low`, `volume`.
///
/// The symbol is taken from the file stem.
pub fn load_series_from_csv(path: &Path) -> Result<PriceSeries, FetchError> {
    let symbol = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let file = std::fs::File::open(path)?;
    load_series_from_reader(&symbol, file)
}

/// Same as [`load_series_from_csv`] but from any reader.
pub fn load_series_from_reader<R: Read>(symbol: &str, reader: R) -> Result<PriceSeries, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| FetchError::Parse(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_columns(&headers)?;

    let mut points = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| FetchError::Parse(format!("CSV record error: {}", e)))?;

        // Blank closes show up for market holidays in some exports.
        let close_raw = record.get(col_map.close).unwrap_or("");
        if is_missing(close_raw) {
            continue;
        }

        let timestamp = parse_timestamp(field(&record, col_map.timestamp))?;
        let close = parse_decimal(close_raw, "close")?;
        let optional = |idx: Option<usize>, name: &str| -> Result<Option<Decimal>, FetchError> {
            match idx.and_then(|i| record.get(i)) {
                Some(raw) if !is_missing(raw) => parse_decimal(raw, name).map(Some),
                _ => Ok(None),
            }
        };

        points.push(PricePoint {
            timestamp,
            open: optional(col_map.open, "open")?,
            high: optional(col_map.high, "high")?,
            low: optional(col_map.low, "low")?,
            close,
            volume: optional(col_map.volume, "volume")?,
        });
    }

    if points.is_empty() {
        return Err(FetchError::NoData(symbol.to_string()));
    }

    // Sort by timestamp
    points.sort_by_key(|p| p.timestamp);
    Ok(PriceSeries::new(symbol, points)?)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct ColumnMap {
    timestamp: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnMap, FetchError> {
    let timestamp = find_column(headers, &["timestamp", "date", "datetime", "time"])
        .ok_or_else(|| FetchError::Parse("No timestamp column found".into()))?;
    let close = find_column(headers, &["close", "c", "adj close", "adj_close"])
        .ok_or_else(|| FetchError::Parse("No close column found".into()))?;

    Ok(ColumnMap {
        timestamp,
        open: find_column(headers, &["open", "o"]),
        high: find_column(headers, &["high", "h"]),
        low: find_column(headers, &["low", "l"]),
        close,
        volume: find_column(headers, &["volume", "vol", "v"]),
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    // Names are in preference order.
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("")
}

fn is_missing(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan")
}

fn parse_decimal(s: &str, field: &str) -> Result<Decimal, FetchError> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|e| FetchError::Parse(format!("Failed to parse {} '{}': {}", field, s, e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, FetchError> {
    let s = s.trim();

    // Try RFC 3339 / ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Common formats (without timezone, assume UTC)
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%d/%m/%Y %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    // Date-only formats
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Some(naive_dt) = chrono::NaiveDate::parse_from_str(s, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive_dt, Utc));
        }
    }

    // Try Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(FetchError::Parse(format!("Unable to parse timestamp: '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_yahoo_style_export() {
        let data = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-03-05,170.76,172.04,169.62,170.12,169.80,95132400
2024-03-04,176.15,176.90,173.79,175.10,174.77,81510100
2024-03-06,171.06,171.24,168.68,169.12,168.80,68587700
";
        let series = load_series_from_reader("AAPL", data.as_bytes()).unwrap();
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.len(), 3);
        // rows are re-ordered chronologically; plain close wins over adj close
        assert_eq!(series.closes(), vec![dec!(175.10), dec!(170.12), dec!(169.12)]);
        assert_eq!(series.last().volume, Some(dec!(68587700)));
        assert!(series.highs().is_some());
    }

    #[test]
    fn test_close_only_file_and_holiday_rows() {
        let data = "timestamp,close\n2024-01-01,\n2024-01-02,10.5\n2024-01-03,null\n2024-01-04,11\n";
        let series = load_series_from_reader("X", data.as_bytes()).unwrap();
        assert_eq!(series.closes(), vec![dec!(10.5), dec!(11)]);
        assert!(series.lows().is_none());
    }

    #[test]
    fn test_missing_close_column() {
        let data = "date,open\n2024-01-02,1\n";
        let err = load_series_from_reader("X", data.as_bytes()).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let data = "date,close\n2024-01-02,1\n2024-01-02,2\n";
        let err = load_series_from_reader("X", data.as_bytes()).unwrap_err();
        assert!(matches!(err, FetchError::InvalidSeries(_)));
    }

    #[test]
    fn test_empty_file_is_no_data() {
        let err = load_series_from_reader("X", "date,close\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FetchError::NoData(_)));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-05T14:30:00Z").is_ok());
        assert!(parse_timestamp("2024-03-05 14:30:00").is_ok());
        assert!(parse_timestamp("03/05/2024").is_ok());
        assert!(parse_timestamp("1709649000").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
