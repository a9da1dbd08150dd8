//! Loading run configuration from TOML files on disk.

use std::io::Write;

use regimelab_runner::{FillPrice, RunConfig, RunConfigError};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_partial_file_over_defaults() {
    let file = write_config(
        r#"
[trading]
stop_loss_pct = 0.03

[backtest]
fill_price = "typical"
close_at_end = false
"#,
    );
    let config = RunConfig::load(file.path()).unwrap();
    let defaults = RunConfig::default();

    assert_eq!(config.trading.stop_loss_pct, 0.03);
    assert_eq!(config.trading.take_profit_pct, defaults.trading.take_profit_pct);
    assert_eq!(config.indicators, defaults.indicators);
    assert_eq!(config.backtest.fill_price, FillPrice::Typical);
    assert!(!config.backtest.close_at_end);
    assert_ne!(config.run_id(), defaults.run_id());
}

#[test]
fn missing_file_is_io_error_naming_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    match RunConfig::load(&path) {
        Err(RunConfigError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn misspelled_key_is_rejected() {
    let file = write_config("[trading]\nstop_los_pct = 0.03\n");
    assert!(matches!(
        RunConfig::load(file.path()),
        Err(RunConfigError::Parse(_))
    ));
}

#[test]
fn inconsistent_values_are_rejected_after_parsing() {
    let file = write_config("[trading]\nmax_position_pct = 0.0\n");
    assert!(matches!(
        RunConfig::load(file.path()),
        Err(RunConfigError::Invalid(_))
    ));
}

#[test]
fn saved_config_loads_back_identically() {
    let mut config = RunConfig::default();
    config.trading.position_size_pct = 0.08;
    config.backtest.lookback = 80;

    let file = write_config(&config.to_toml_string().unwrap());
    let loaded = RunConfig::load(file.path()).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.run_id(), config.run_id());
}
