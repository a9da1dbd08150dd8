//! Bar loading for the runner.
//!
//! Two sources of bars:
//! 1. CSV files with `timestamp` (or `date`), `open`, `high`, `low`, `close`,
//!    `volume` columns. Empty price cells load as void bars.
//! 2. Synthetic bars, a seeded regime-switching random walk. Deterministic
//!    per symbol, meant for demos and tests only.
//!
//! `StaticDataSource` serves loaded series through the `DataSource` port,
//! optionally replaying history up to a moving cursor.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use regimelab_core::domain::{first_unordered, Bar};
use regimelab_core::ports::DataSource;
use regimelab_core::DataUnavailableError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {index} does not come strictly after the row before it")]
    Unordered { index: usize },

    #[error("no bars in {0}")]
    Empty(String),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "Date", alias = "time")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

/// Load an ordered bar series from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_csv(file)?;
    if bars.is_empty() {
        return Err(LoadError::Empty(path.display().to_string()));
    }
    Ok(bars)
}

/// Parse bars from any CSV reader. Rows must already be in time order.
pub fn read_csv<R: std::io::Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();

    for (row, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let record = record?;
        let timestamp =
            parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::BadTimestamp {
                row: row + 1,
                value: record.timestamp.clone(),
            })?;
        bars.push(Bar::new(
            timestamp,
            record.open.unwrap_or(f64::NAN),
            record.high.unwrap_or(f64::NAN),
            record.low.unwrap_or(f64::NAN),
            record.close.unwrap_or(f64::NAN),
            record.volume.unwrap_or(0.0),
        ));
    }

    if let Some(index) = first_unordered(&bars) {
        return Err(LoadError::Unordered { index });
    }
    Ok(bars)
}

/// RFC 3339 timestamps, or plain `YYYY-MM-DD` dates taken as midnight UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Deterministic BLAKE3 hash over timestamps and OHLCV values.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `count` weekday bars starting at `start`.
///
/// A random walk whose drift and volatility are redrawn every 40 bars, so a
/// long enough series passes through calm trends and choppy stretches. The
/// seed is derived from the symbol name: same symbol, same bars.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, count: usize) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const SEGMENT: usize = 40;
    const DRIFTS: [f64; 3] = [0.004, 0.0, -0.004];
    const VOLS: [f64; 3] = [0.006, 0.012, 0.03];

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut date = start;
    let (mut drift, mut vol) = (0.0, 0.01);

    while bars.len() < count {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
            continue;
        }
        if bars.len() % SEGMENT == 0 {
            drift = DRIFTS[rng.gen_range(0..DRIFTS.len())];
            vol = VOLS[rng.gen_range(0..VOLS.len())];
        }

        let daily_return: f64 = drift + rng.gen_range(-1.0..1.0) * vol;
        let open = price;
        let close = (price * (1.0 + daily_return)).max(1.0);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..vol / 2.0));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..vol / 2.0));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

        // Stamped at the 16:00 New York close, 21:00 UTC.
        let timestamp = date
            .and_hms_opt(21, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or_default();
        bars.push(Bar::new(timestamp, open, high, low, close, volume));

        price = close;
        date += Duration::days(1);
    }

    bars
}

/// In-memory `DataSource` over preloaded series.
///
/// With a cursor set, only bars at or before the cursor are visible, which
/// lets a driver replay history one day at a time.
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    series: HashMap<String, Vec<Bar>>,
    cursor: Option<DateTime<Utc>>,
}

impl StaticDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.series.insert(symbol.into(), bars);
    }

    /// Hide every bar after `as_of`.
    pub fn set_cursor(&mut self, as_of: DateTime<Utc>) {
        self.cursor = Some(as_of);
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    pub fn series(&self, symbol: &str) -> Option<&[Bar]> {
        self.series.get(symbol).map(Vec::as_slice)
    }
}

impl DataSource for StaticDataSource {
    fn name(&self) -> &str {
        "static"
    }

    fn get_bars(&self, symbol: &str, window: usize) -> Result<Vec<Bar>, DataUnavailableError> {
        let bars = self
            .series
            .get(symbol)
            .ok_or_else(|| DataUnavailableError::new(symbol, "unknown symbol"))?;
        let end = match self.cursor {
            Some(as_of) => bars.partition_point(|b| b.timestamp <= as_of),
            None => bars.len(),
        };
        if end == 0 {
            return Err(DataUnavailableError::new(symbol, "no bars at or before cursor"));
        }
        let start = end.saturating_sub(window);
        Ok(bars[start..end].to_vec())
    }
}
