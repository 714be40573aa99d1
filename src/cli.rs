//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_result_adapter::JsonResultAdapter;
use crate::adapters::local_runtime::{LocalRuntime, LocalRuntimeConfig};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::SectraderError;
use crate::domain::market::Timerange;
use crate::domain::strategy::{Strategy, strategy_from_config};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ResultPort;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(
    name = "sectrader",
    about = "Strategy backtester over secret-shared market data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a secure backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        pair: Option<String>,
        #[arg(long)]
        timeframe: Option<String>,
        /// YYYYMMDD-YYYYMMDD, either side may be empty
        #[arg(long)]
        timerange: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command line values that replace `[backtest]` keys from the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub pair: Option<String>,
    pub timeframe: Option<String>,
    pub timerange: Option<String>,
    pub output: Option<PathBuf>,
}

impl Overrides {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            "pair" => self.pair.clone(),
            "timeframe" => self.timeframe.clone(),
            "timerange" => self.timerange.clone(),
            "output" => self.output.as_ref().map(|p| p.display().to_string()),
            _ => None,
        }
    }
}

/// A config file with command line overrides layered on top, so overridden
/// values go through the same validation as file values.
pub struct LayeredConfig<'a> {
    base: &'a dyn ConfigPort,
    overrides: &'a Overrides,
}

impl<'a> LayeredConfig<'a> {
    pub fn new(base: &'a dyn ConfigPort, overrides: &'a Overrides) -> Self {
        Self { base, overrides }
    }

    fn overridden(&self, section: &str, key: &str) -> Option<String> {
        if section.eq_ignore_ascii_case("backtest") {
            self.overrides.get(&key.to_ascii_lowercase())
        } else {
            None
        }
    }
}

impl ConfigPort for LayeredConfig<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.overridden(section, key)
            .or_else(|| self.base.get_string(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.overridden(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_int(section, key, default),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        match self.overridden(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_double(section, key, default),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.overridden(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_bool(section, key, default),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            pair,
            timeframe,
            timerange,
            output,
            dry_run,
        } => {
            let overrides = Overrides {
                pair,
                timeframe,
                timerange,
                output,
            };
            run_backtest(&config, &overrides, dry_run)
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SectraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Install the global subscriber. `RUST_LOG` wins over `[logging] level`.
/// Does nothing if a subscriber is already installed.
pub fn init_logging(config: &dyn ConfigPort) {
    use tracing_subscriber::EnvFilter;

    let level = config
        .get_trimmed("logging", "level")
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
        .to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SectraderError> {
    let required = |key: &str| {
        config
            .get_trimmed("backtest", key)
            .ok_or_else(|| SectraderError::ConfigMissing {
                section: "backtest".into(),
                key: key.into(),
            })
    };

    let timerange = match config.get_trimmed("backtest", "timerange") {
        Some(raw) => raw
            .parse::<Timerange>()
            .map_err(|e| SectraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "timerange".into(),
                reason: e.to_string(),
            })?,
        None => Timerange::UNBOUNDED,
    };

    Ok(BacktestConfig {
        pair: required("pair")?,
        timeframe: required("timeframe")?,
        timerange,
        output: config.get_trimmed("backtest", "output").map(PathBuf::from),
    })
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)
}

fn run_backtest(config_path: &Path, overrides: &Overrides, dry_run: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = LayeredConfig::new(&adapter, overrides);
    init_logging(&config);

    let outcome = if dry_run {
        dry_run_plan(&config)
    } else {
        backtest_pipeline(&config)
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn dry_run_plan(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    validate_all(config)?;
    eprintln!("Config validated successfully");

    let bt_config = build_backtest_config(config)?;
    let strategy = strategy_from_config(config)?;
    let runtime_config = LocalRuntimeConfig::from_config(config);
    let data_port = CsvAdapter::from_config(config)?;

    eprintln!("\nBacktest:");
    eprintln!("  pair:      {}", bt_config.pair);
    eprintln!("  timeframe: {}", bt_config.timeframe);
    eprintln!("  timerange: {}", bt_config.timerange);
    eprintln!(
        "  data file: {}",
        data_port
            .csv_path(&bt_config.pair, &bt_config.timeframe)
            .display()
    );
    if let Some(output) = &bt_config.output {
        eprintln!("  output:    {}", output.display());
    }

    print_strategy(strategy.as_ref());

    eprintln!("\nSecure runtime:");
    eprintln!("  parties:   {}", runtime_config.parties);
    eprintln!("  frac_bits: {}", runtime_config.frac_bits);
    eprintln!("  seed:      {}", runtime_config.seed);
    Ok(())
}

fn backtest_pipeline(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    validate_all(config)?;

    let bt_config = build_backtest_config(config)?;
    let strategy = strategy_from_config(config)?;
    eprintln!("Loading strategy: {}", strategy.name());

    let data_port = CsvAdapter::from_config(config)?;
    let runtime = LocalRuntime::new(LocalRuntimeConfig::from_config(config))?;

    eprintln!(
        "Running secure backtest: {} {} ({})",
        bt_config.pair, bt_config.timeframe, bt_config.timerange
    );
    let result = backtest_engine::run_backtest(
        &data_port,
        &runtime,
        &bt_config.pair,
        &bt_config.timeframe,
        &bt_config.timerange,
        strategy.as_ref(),
    )?;

    print_summary(&result);

    if let Some(output) = &bt_config.output {
        JsonResultAdapter::new().write(&result, output)?;
        eprintln!("\nResult written to: {}", output.display());
    }
    Ok(())
}

fn print_strategy(strategy: &dyn Strategy) {
    eprintln!("\nStrategy: {}", strategy.name());
    eprintln!("  warm-up: {} rows", strategy.warmup_period());
    eprintln!("  indicators:");
    for indicator in strategy.indicators() {
        eprintln!("    {indicator}");
    }
}

fn print_summary(result: &BacktestResult) {
    let stats = &result.statistics;
    eprintln!("\n=== Results ===");
    eprintln!("Total Trades:     {}", stats.trade_count);
    eprintln!("Win Rate:         {:.1}%", stats.win_rate * 100.0);
    eprintln!("Total Return:     {:.2}%", stats.total_return_pct);
    eprintln!("Average Profit:   {:.2}%", stats.average_profit_pct);

    if !result.trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for trade in &result.trades {
            let sign = if trade.profit_pct >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {} @ {:.4} -> {} @ {:.4}  {}{:.2}%",
                trade.entry_time,
                trade.entry_price,
                trade.exit_time,
                trade.exit_price,
                sign,
                trade.profit_pct,
            );
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match strategy_from_config(&adapter) {
        Ok(strategy) => print_strategy(strategy.as_ref()),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("\nConfig is valid");
    ExitCode::SUCCESS
}
