//! CLI integration tests for the backtest command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config) and command line overrides
//! - Dry-run and validate with real INI files on disk
//! - Full backtest from a CSV data directory to a JSON result file
//! - Exit codes for config, data and contract failures

use clap::Parser;
use sectrader::adapters::file_config_adapter::FileConfigAdapter;
use sectrader::cli::{self, Cli, LayeredConfig, Overrides};
use sectrader::domain::backtest::BacktestResult;
use sectrader::domain::error::SectraderError;
use sectrader::domain::market::Timerange;
use sectrader::ports::config_port::ConfigPort;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ExitCode doesn't implement PartialEq, so compare the debug output.
fn assert_exit(actual: ExitCode, expected: u8) {
    assert_eq!(
        format!("{actual:?}"),
        format!("{:?}", ExitCode::from(expected))
    );
}

fn run_args(args: &[&str]) -> ExitCode {
    let mut argv = vec!["sectrader"];
    argv.extend_from_slice(args);
    cli::run(Cli::parse_from(argv))
}

const VALID_INI: &str = r#"
[data]
datadir = /nonexistent/data

[backtest]
pair = BTC/USDT
timeframe = 5m
timerange = 20240101-20240201

[mpc]
parties = 3
frac_bits = 16
seed = 42

[strategy]
name = sma_dip
window = 3

[logging]
level = warn
"#;

const DIP_CSV: &str = "timestamp,open,high,low,close,volume\n\
    2024-01-01 00:00:00,100,100,100,100,10\n\
    2024-01-01 00:05:00,100,100,100,100,11\n\
    2024-01-01 00:10:00,100,100,100,100,12\n\
    2024-01-01 00:15:00,100,100,100,100,13\n\
    2024-01-01 00:20:00,90,90,90,90,14\n\
    2024-01-01 00:25:00,110,110,110,110,15\n\
    2024-01-01 00:30:00,90,90,90,90,16\n\
    2024-01-01 00:35:00,130,130,130,130,17\n";

/// Data directory holding `BTC_USDT-5m.csv` and a config pointing at it.
/// `backtest_extra` lines are appended to the `[backtest]` section.
fn workspace(backtest_extra: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("BTC_USDT-5m.csv"), DIP_CSV).unwrap();
    let ini = format!(
        "[data]\ndatadir = {}\n\n[backtest]\npair = BTC/USDT\ntimeframe = 5m\n{backtest_extra}\n\n[strategy]\nname = sma_dip\nwindow = 3\n\n[logging]\nlevel = warn\n",
        dir.path().display()
    );
    let config = dir.path().join("config.ini");
    std::fs::write(&config, ini).unwrap();
    (dir, config)
}

fn read_result(path: &Path) -> BacktestResult {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(config.pair, "BTC/USDT");
        assert_eq!(config.timeframe, "5m");
        assert_eq!(config.timerange.to_string(), "20240101-20240201");
        assert_eq!(config.output, None);
    }

    #[test]
    fn build_backtest_config_defaults_to_unbounded() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\npair = ETH/BTC\ntimeframe = 1h\n").unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        assert_eq!(config.timerange, Timerange::UNBOUNDED);
    }

    #[test]
    fn build_backtest_config_missing_pair() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ntimeframe = 1h\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, SectraderError::ConfigMissing { key, .. } if key == "pair"));
    }

    #[test]
    fn build_backtest_config_bad_timerange() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\npair = ETH/BTC\ntimeframe = 1h\ntimerange = 20240301-20240101\n",
        )
        .unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, SectraderError::ConfigInvalid { key, .. } if key == "timerange"));
    }

    #[test]
    fn overrides_win_over_file() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let overrides = Overrides {
            pair: Some("ETH/USDT".into()),
            timerange: Some("20240115-".into()),
            output: Some(PathBuf::from("out/result.json")),
            ..Overrides::default()
        };
        let layered = LayeredConfig::new(&adapter, &overrides);

        let config = cli::build_backtest_config(&layered).unwrap();
        assert_eq!(config.pair, "ETH/USDT");
        assert_eq!(config.timeframe, "5m");
        assert_eq!(config.timerange.to_string(), "20240115-");
        assert_eq!(config.output, Some(PathBuf::from("out/result.json")));
    }

    #[test]
    fn overrides_only_touch_backtest_section() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let overrides = Overrides {
            pair: Some("ETH/USDT".into()),
            ..Overrides::default()
        };
        let layered = LayeredConfig::new(&adapter, &overrides);

        assert_eq!(layered.get_string("strategy", "pair"), None);
        assert_eq!(layered.get_int("mpc", "seed", 0), 42);
        assert_eq!(layered.get_int("strategy", "window", 0), 3);
    }
}

mod dry_run {
    use super::*;

    #[test]
    fn dry_run_valid_config_succeeds() {
        let file = write_temp_ini(VALID_INI);
        let path = file.path().to_str().unwrap();
        assert_exit(run_args(&["backtest", "--config", path, "--dry-run"]), 0);
    }

    #[test]
    fn dry_run_missing_file_is_config_error() {
        assert_exit(
            run_args(&["backtest", "--config", "/nonexistent/config.ini", "--dry-run"]),
            2,
        );
    }

    #[test]
    fn dry_run_rejects_bad_override() {
        let file = write_temp_ini(VALID_INI);
        let path = file.path().to_str().unwrap();
        assert_exit(
            run_args(&["backtest", "--config", path, "--timeframe", "5x", "--dry-run"]),
            2,
        );
    }

    #[test]
    fn dry_run_rejects_unknown_strategy() {
        let ini = VALID_INI.replace("name = sma_dip", "name = moonshot");
        let file = write_temp_ini(&ini);
        let path = file.path().to_str().unwrap();
        assert_exit(run_args(&["backtest", "--config", path, "--dry-run"]), 2);
    }

    #[test]
    fn validate_command_succeeds() {
        let file = write_temp_ini(VALID_INI);
        let path = file.path().to_str().unwrap();
        assert_exit(run_args(&["validate", "--config", path]), 0);
    }

    #[test]
    fn validate_command_reports_missing_key() {
        let ini = VALID_INI.replace("datadir = /nonexistent/data", "");
        let file = write_temp_ini(&ini);
        let path = file.path().to_str().unwrap();
        assert_exit(run_args(&["validate", "--config", path]), 2);
    }
}

mod pipeline_csv {
    use super::*;

    #[test]
    fn backtest_writes_json_result() {
        let (dir, config) = workspace("");
        let output = dir.path().join("out").join("result.json");

        let exit = run_args(&[
            "backtest",
            "--config",
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        assert_exit(exit, 0);

        let result = read_result(&output);
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].entry_price, 90.0);
        assert_eq!(result.trades[0].exit_price, 110.0);
        assert_eq!(result.statistics.trade_count, 2);
    }

    #[test]
    fn output_is_byte_identical_across_runs() {
        let (dir, config) = workspace("");
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");

        for out in [&first, &second] {
            let exit = run_args(&[
                "backtest",
                "--config",
                config.to_str().unwrap(),
                "--output",
                out.to_str().unwrap(),
            ]);
            assert_exit(exit, 0);
        }

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn output_from_config_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("from_config.json");
        let (_data, config) = workspace(&format!("output = {}", output.display()));

        assert_exit(run_args(&["backtest", "--config", config.to_str().unwrap()]), 0);
        assert!(output.exists());
    }

    #[test]
    fn missing_pair_file_is_data_error() {
        let (_dir, config) = workspace("");
        let exit = run_args(&[
            "backtest",
            "--config",
            config.to_str().unwrap(),
            "--pair",
            "DOGE/USDT",
        ]);
        assert_exit(exit, 5);
    }

    #[test]
    fn empty_timerange_is_data_error() {
        let (_dir, config) = workspace("");
        let exit = run_args(&[
            "backtest",
            "--config",
            config.to_str().unwrap(),
            "--timerange",
            "20250101-",
        ]);
        assert_exit(exit, 5);
    }
}
