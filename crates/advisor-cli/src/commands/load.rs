//! OHLCV CSV 로더.
//!
//! `date,open,high,low,close,volume` 헤더를 가진 파일을 읽습니다.
//! 날짜는 `YYYY-MM-DD` 또는 RFC 3339 형식을 받습니다.

use advisor_core::{Candle, PriceSeries};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// CSV 한 행.
#[derive(Debug, Deserialize)]
struct OhlcvRecord {
    date: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    #[serde(default)]
    volume: Decimal,
}

/// 파일 이름에서 심볼을 추정합니다 (`data/AAPL_daily.csv` → `AAPL`).
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('_').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("Invalid date: {}", value))?;
        return Ok(midnight.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid date: {}", value))
}

/// CSV 파일을 가격 시계열로 읽습니다. 행은 날짜순으로 정렬합니다.
pub fn load_series(path: impl AsRef<Path>, symbol: Option<&str>) -> Result<PriceSeries> {
    let path = path.as_ref();
    let symbol = symbol.map_or_else(|| symbol_from_path(path), str::to_uppercase);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut candles = Vec::new();
    for (line, record) in reader.deserialize::<OhlcvRecord>().enumerate() {
        let record = record.with_context(|| format!("Invalid row {} in {}", line + 1, path.display()))?;
        candles.push(Candle::new(
            parse_timestamp(&record.date)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }
    candles.sort_by_key(|c| c.timestamp);

    let series = PriceSeries::new(symbol, candles)?;
    info!(symbol = series.symbol(), candles = series.len(), path = %path.display(), "Series loaded");
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_symbol_from_path() {
        assert_eq!(symbol_from_path(Path::new("data/us/spy_daily_20240101.csv")), "SPY");
        assert_eq!(symbol_from_path(Path::new("AAPL.csv")), "AAPL");
    }

    #[test]
    fn test_load_sorts_rows() {
        let path = write_temp(
            "msft_load.csv",
            "date,open,high,low,close,volume\n\
             2024-01-03,11,12,10,11.5,1000\n\
             2024-01-02,10,11,9,10.5,900\n",
        );
        let series = load_series(&path, Some("msft")).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(series.symbol(), "MSFT");
        assert_eq!(series.closes(), vec![dec!(10.5), dec!(11.5)]);
    }

    #[test]
    fn test_load_rejects_bad_date() {
        let path = write_temp("bad_date.csv", "date,open,high,low,close,volume\nyesterday,1,1,1,1,1\n");
        let result = load_series(&path, None);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_duplicate_dates() {
        let path = write_temp(
            "dup.csv",
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,1,1\n2024-01-02,1,1,1,1,1\n",
        );
        let result = load_series(&path, None);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
