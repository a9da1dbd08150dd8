//! RegimeLab CLI: backtest, decide, paper and sweep commands.
//!
//! Commands:
//! - `backtest`: simulate the decision engine over a CSV file or synthetic bars
//! - `decide`: run a single decision cycle on the latest bars
//! - `paper`: replay bars day by day through a paper-trading session
//! - `sweep`: grid search over stop loss, take profit and position size

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use regimelab_core::domain::{Bar, Mode, Position, Side};
use regimelab_core::ports::OrderExecutor;
use regimelab_core::{ConditionAnalyzer, CycleError, DecisionEngine, ModeSelector};
use regimelab_runner::export::save_artifacts;
use regimelab_runner::{
    generate_synthetic_bars, load_csv, run_backtest, PaperExecutor, ParamGrid, ParamSweep,
    RunConfig, StaticDataSource, TradingSession,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI: regime-switching strategy backtester"
)]
struct Cli {
    /// Default log filter when REGIMELAB_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where bars come from: a CSV file or the seeded generator.
#[derive(Args)]
struct BarSource {
    /// CSV file with timestamp, open, high, low, close, volume columns.
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Generate this many synthetic daily bars instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// First date of the synthetic series (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-02")]
    start: String,

    /// Symbol label. Also seeds the synthetic generator.
    #[arg(long, default_value = "SPY")]
    symbol: String,

    /// Path to a TOML run config. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the engine over a bar series and print the summary.
    Backtest {
        #[command(flatten)]
        source: BarSource,

        /// Starting cash.
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,

        /// Write manifest.json, trades.csv, equity.csv and summary.txt here.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the full result as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run one decision cycle on the most recent bars.
    Decide {
        #[command(flatten)]
        source: BarSource,

        /// Account equity used for sizing.
        #[arg(long, default_value_t = 100_000.0)]
        equity: f64,

        /// Side of an already open position.
        #[arg(long, requires_all = ["qty", "entry_price", "entry_mode"])]
        side: Option<SideArg>,

        /// Quantity of the open position.
        #[arg(long)]
        qty: Option<f64>,

        /// Entry price of the open position.
        #[arg(long)]
        entry_price: Option<f64>,

        /// Mode the open position was entered under.
        #[arg(long)]
        entry_mode: Option<ModeArg>,
    },
    /// Replay the series one bar at a time through a paper-trading session.
    Paper {
        #[command(flatten)]
        source: BarSource,

        /// Starting cash of the paper account.
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,
    },
    /// Backtest every point of a parameter grid and rank by Sharpe.
    Sweep {
        #[command(flatten)]
        source: BarSource,

        /// Starting cash for every run.
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,

        /// Stop loss fractions to try.
        #[arg(long, value_delimiter = ',', default_values_t = [0.01, 0.02, 0.03])]
        stop_loss: Vec<f64>,

        /// Take profit fractions to try.
        #[arg(long, value_delimiter = ',', default_values_t = [0.03, 0.05, 0.08])]
        take_profit: Vec<f64>,

        /// Position size fractions to try.
        #[arg(long, value_delimiter = ',', default_values_t = [0.05, 0.10, 0.20])]
        position_size: Vec<f64>,

        /// How many ranked runs to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Long,
    Short,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Long => Side::Long,
            SideArg::Short => Side::Short,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Bull,
    Volatile,
    Bear,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Bull => Mode::Bull,
            ModeArg::Volatile => Mode::Volatile,
            ModeArg::Bear => Mode::Bear,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Backtest {
            source,
            capital,
            out,
            json,
        } => run_backtest_cmd(&source, capital, out.as_deref(), json),
        Commands::Decide {
            source,
            equity,
            side,
            qty,
            entry_price,
            entry_mode,
        } => {
            let open = match (side, qty, entry_price, entry_mode) {
                (Some(side), Some(qty), Some(price), Some(mode)) => {
                    Some((side.into(), qty, price, mode.into()))
                }
                _ => None,
            };
            run_decide(&source, equity, open)
        }
        Commands::Paper { source, capital } => run_paper(&source, capital),
        Commands::Sweep {
            source,
            capital,
            stop_loss,
            take_profit,
            position_size,
            top,
        } => {
            let grid = ParamGrid {
                stop_loss_pcts: stop_loss,
                take_profit_pcts: take_profit,
                position_size_pcts: position_size,
            };
            run_sweep(&source, capital, &grid, top)
        }
    }
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = std::env::var("REGIMELAB_LOG").unwrap_or_else(|_| level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter: {filter}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load_inputs(source: &BarSource) -> Result<(RunConfig, Vec<Bar>)> {
    let config = match &source.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    let bars = match (&source.csv, source.synthetic) {
        (Some(path), _) => load_csv(path)?,
        (None, Some(count)) => {
            let start = NaiveDate::parse_from_str(&source.start, "%Y-%m-%d")
                .with_context(|| format!("invalid --start date: {}", source.start))?;
            warn!(count, "using SYNTHETIC bars");
            generate_synthetic_bars(&source.symbol, start, count)
        }
        (None, None) => bail!("one of --csv or --synthetic is required"),
    };
    info!(symbol = %source.symbol, bars = bars.len(), run_id = %config.run_id(), "inputs loaded");
    Ok((config, bars))
}

fn run_backtest_cmd(source: &BarSource, capital: f64, out: Option<&Path>, json: bool) -> Result<()> {
    let (config, bars) = load_inputs(source)?;
    let result = run_backtest(&source.symbol, &bars, capital, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary());
    }

    if let Some(dir) = out {
        let run_dir = save_artifacts(&result, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_decide(
    source: &BarSource,
    equity: f64,
    open: Option<(Side, f64, f64, Mode)>,
) -> Result<()> {
    let (config, bars) = load_inputs(source)?;
    let window = &bars[bars.len().saturating_sub(config.backtest.lookback)..];
    let conditions = ConditionAnalyzer::new(config.indicators.clone()).analyze(window)?;
    let selected = ModeSelector::select(&conditions, &config.trading);

    let position = open.map(|(side, qty, price, mode)| {
        Position::new(&source.symbol, side, qty, price, conditions.as_of, mode)
    });

    println!("As of:        {}", conditions.as_of);
    println!("Price:        {:.4}", conditions.current_price);
    println!("Volatility:   {:.4}", conditions.volatility);
    println!("Trend:        {:.4}", conditions.trend_strength);
    println!("Sentiment:    {:.4}", conditions.sentiment);
    println!("RSI:          {:.2}", conditions.rsi);
    println!("ADX:          {:.2}", conditions.adx);
    println!("Mode:         {selected}");

    let engine = DecisionEngine::new(config.trading.clone());
    match engine.decide(&source.symbol, &conditions, position.as_ref(), equity) {
        Ok(decision) => println!("Decision:     {}", serde_json::to_string(&decision.action)?),
        Err(e) => println!("Entry refused: {e}"),
    }
    Ok(())
}

fn run_paper(source: &BarSource, capital: f64) -> Result<()> {
    let (config, bars) = load_inputs(source)?;
    let lookback = config.backtest.lookback;
    if bars.len() < lookback {
        bail!("need at least {lookback} bars, got {}", bars.len());
    }

    let symbol = source.symbol.as_str();
    let mut session = TradingSession::new(
        &config,
        StaticDataSource::new().with_series(symbol, bars.clone()),
        PaperExecutor::new(capital),
    );

    let mut refused = 0usize;
    for bar in &bars[lookback - 1..] {
        session.data_source_mut().set_cursor(bar.timestamp);
        session.executor_mut().mark(symbol, bar.close, bar.timestamp);
        match session.run_cycle(symbol) {
            Ok(report) if report.decision.action.is_open() || report.decision.action.is_close() => {
                println!(
                    "{}  {:<9} {}",
                    bar.timestamp.date_naive(),
                    report.decision.mode,
                    serde_json::to_string(&report.decision.action)?
                );
            }
            Ok(_) => {}
            Err(CycleError::RiskViolation(e)) => {
                refused += 1;
                warn!(error = %e, "entry refused");
            }
            Err(e) => warn!(error = %e, "cycle failed"),
        }
    }

    let account = session.executor().get_account()?;
    println!();
    println!("Fills:          {}", session.executor().fills().len());
    println!("Refused:        {refused}");
    println!("Cash:           {:.2}", account.cash);
    println!("Equity:         {:.2}", account.equity);
    if let Some(held) = session.executor().get_position(symbol)? {
        println!(
            "Open position:  {} {} @ {:.4}",
            held.side, held.qty, held.avg_entry_price
        );
    }
    Ok(())
}

fn run_sweep(source: &BarSource, capital: f64, grid: &ParamGrid, top: usize) -> Result<()> {
    let (config, bars) = load_inputs(source)?;
    let results = ParamSweep::new(&source.symbol, &bars, capital).sweep(grid, &config)?;
    if results.is_empty() {
        bail!("no valid configurations in the grid");
    }

    println!(
        "{:<4} {:>8} {:>8} {:>8} {:>8} {:>10} {:>8}  {}",
        "Rank", "Stop", "Target", "Size", "Sharpe", "Return%", "Trades", "Run"
    );
    println!("{}", "-".repeat(78));
    for (rank, (cfg, result)) in results.top_n(top).into_iter().enumerate() {
        let m = &result.metrics;
        println!(
            "{:<4} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>10.2} {:>8}  {}",
            rank + 1,
            cfg.trading.stop_loss_pct,
            cfg.trading.take_profit_pct,
            cfg.trading.position_size_pct,
            m.sharpe_ratio,
            m.total_return_pct,
            m.total_trades,
            result.run_id.get(..12).unwrap_or(&result.run_id),
        );
    }
    Ok(())
}
