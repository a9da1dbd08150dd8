//! Artifact export: JSON, CSV and a plain-text summary.
//!
//! - **JSON**: the full `BacktestResult`, schema versioned
//! - **CSV**: trade tape and equity curve for spreadsheets and plotting
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regimelab_core::domain::{EquityPoint, TradeRecord};

use crate::result::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult`, rejecting schema versions newer than ours.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: symbol, side, mode, entry_timestamp, entry_price, exit_timestamp,
/// exit_price, qty, pl, pl_percent, exit_reason
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "side",
        "mode",
        "entry_timestamp",
        "entry_price",
        "exit_timestamp",
        "exit_price",
        "qty",
        "pl",
        "pl_percent",
        "exit_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.as_str(),
            t.side.as_str(),
            t.mode.as_str(),
            &t.entry_timestamp.to_rfc3339(),
            &format!("{:.6}", t.entry_price),
            &t.exit_timestamp.to_rfc3339(),
            &format!("{:.6}", t.exit_price),
            &format!("{}", t.qty),
            &format!("{:.2}", t.pl),
            &format!("{:.6}", t.pl_percent),
            t.exit_reason.as_str(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for point in equity_curve {
        wtr.write_record([&point.timestamp.to_rfc3339(), &format!("{:.2}", point.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run.
///
/// Creates `{symbol}_{run_id prefix}/` under `output_dir` containing
/// `manifest.json`, `trades.csv`, `equity.csv` and `summary.txt`.
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix = result.run_id.get(..12).unwrap_or(&result.run_id);
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("manifest.json"), &export_json(result)?)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(&result.equity_curve)?)?;
    write(&run_dir.join("summary.txt"), &result.summary())?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::data_loader::generate_synthetic_bars;
    use crate::simulator::run_backtest;
    use chrono::NaiveDate;

    fn sample_result() -> BacktestResult {
        let bars =
            generate_synthetic_bars("EXPORT", NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), 250);
        run_backtest("EXPORT", &bars, 10_000.0, &RunConfig::default()).unwrap()
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        assert_eq!(import_json(&json).unwrap(), result);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut result = sample_result();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&result).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn trades_csv_has_one_row_per_trade() {
        let result = sample_result();
        let csv = export_trades_csv(&result.trades).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("symbol,side,mode,"));
        assert_eq!(lines.count(), result.trades.len());
    }

    #[test]
    fn equity_csv_has_one_row_per_point() {
        let result = sample_result();
        let csv = export_equity_csv(&result.equity_curve).unwrap();
        assert_eq!(csv.lines().count(), result.equity_curve.len() + 1);
    }

    #[test]
    fn artifacts_roundtrip_through_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        for name in ["manifest.json", "trades.csv", "equity.csv", "summary.txt"] {
            assert!(run_dir.join(name).exists(), "missing {name}");
        }
        assert_eq!(load_artifacts(&run_dir).unwrap(), result);
    }
}
