//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvTickAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_independent, Backtest, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{build_backtest_config, build_strategy_configs};
use crate::domain::error::TickTraderError;
use crate::domain::metrics::Metrics;
use crate::domain::observation::MarketObservation;
use crate::domain::signal_bus::{shared_log, AlertObserver, LoggingObserver, SharedLog, SignalBus};
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "ticktrader", about = "Tick-replay strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Tick CSV; overrides [backtest] data_path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Equity CSV; overrides [backtest] report_path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Run each strategy on its own ledger, in parallel
        #[arg(long)]
        parallel: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Command {
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Backtest { config, .. } | Command::Validate { config } => config,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            parallel,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config)
            } else {
                run_backtest(&config, data.as_deref(), output.as_deref(), parallel)
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// `[logging] level` from the command's config file, or the default when the
/// file or key is absent. Load errors surface later, when the command runs.
pub fn configured_log_level(cli: &Cli) -> String {
    FileConfigAdapter::from_file(cli.command.config_path())
        .ok()
        .and_then(|c| c.get_string("logging", "level"))
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// CLI flag first, then the config key.
pub fn resolve_path(flag: Option<&Path>, config: &dyn ConfigPort, key: &str) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("backtest", key)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
}

/// Observer sinks for one run.
pub struct RunSinks {
    pub logs: SharedLog,
    pub alerts: SharedLog,
}

impl RunSinks {
    pub fn new() -> Self {
        RunSinks {
            logs: shared_log(),
            alerts: shared_log(),
        }
    }

    /// Bus with the alert observer, plus the logging observer when enabled.
    pub fn bus(&self, config: &BacktestConfig, log_signals: bool) -> SignalBus {
        let mut bus = SignalBus::new();
        if log_signals {
            bus.attach(Box::new(LoggingObserver::new(self.logs.clone())));
        }
        bus.attach(Box::new(AlertObserver::new(
            config.alert_notional,
            self.alerts.clone(),
        )));
        bus
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl Default for RunSinks {
    fn default() -> Self {
        Self::new()
    }
}

struct Plan {
    bt_config: BacktestConfig,
    strategies: Vec<StrategyConfig>,
    log_signals: bool,
}

fn plan(adapter: &FileConfigAdapter) -> Result<Plan, TickTraderError> {
    Ok(Plan {
        bt_config: build_backtest_config(adapter)?,
        strategies: build_strategy_configs(adapter)?,
        log_signals: adapter.get_bool("backtest", "log_signals", true),
    })
}

fn load_ticks(path: &Path) -> Result<Vec<MarketObservation>, TickTraderError> {
    let ticks = CsvTickAdapter::new(path.to_path_buf()).load_observations()?;
    if ticks.is_empty() {
        return Err(TickTraderError::NoData {
            reason: format!("{} has no ticks", path.display()),
        });
    }
    Ok(ticks)
}

fn run_backtest(
    config_path: &Path,
    data_flag: Option<&Path>,
    output_flag: Option<&Path>,
    parallel: bool,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let plan = match plan(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Load ticks
    let Some(data_path) = resolve_path(data_flag, &adapter, "data_path") else {
        let e = TickTraderError::ConfigMissing {
            section: "backtest".into(),
            key: "data_path".into(),
        };
        eprintln!("error: {e} (or pass --data)");
        return (&e).into();
    };
    eprintln!("Loading ticks from {}", data_path.display());
    let ticks = match load_ticks(&data_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("  {} ticks", ticks.len());

    // Stage 3: Run
    let outcome = if parallel {
        run_parallel(&plan, &ticks)
    } else {
        run_combined(&plan, ticks)
    };
    let runs = match outcome {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Summaries
    for run in &runs {
        print_summary(&run.name, &run.result, &run.sinks, plan.bt_config.initial_capital);
    }

    // Stage 5: Report
    let Some(output) = resolve_path(output_flag, &adapter, "report_path") else {
        return ExitCode::SUCCESS;
    };
    let reporter = CsvReportAdapter::new();
    let mut written = Vec::new();
    for run in &runs {
        let path = match run.key {
            Some(key) if runs.len() > 1 => per_run_path(&output, key),
            _ => output.clone(),
        };
        if let Err(e) = reporter.write(&run.result, &path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        written.push(path);
    }
    for path in &written {
        eprintln!("\nReport written to: {}", path.display());
    }
    ExitCode::SUCCESS
}

struct NamedRun {
    name: String,
    /// Config key of the single strategy behind an independent run.
    key: Option<&'static str>,
    result: BacktestResult,
    sinks: RunSinks,
}

fn run_combined(plan: &Plan, ticks: Vec<MarketObservation>) -> Result<Vec<NamedRun>, TickTraderError> {
    let names: Vec<&str> = plan.strategies.iter().map(|s| s.name()).collect();
    eprintln!("Running combined backtest: {}", names.join(" + "));

    let sinks = RunSinks::new();
    let strategies = plan.strategies.iter().map(StrategyConfig::build).collect();
    let rng = StdRng::seed_from_u64(plan.bt_config.seed);
    let mut bt = Backtest::new(
        &plan.bt_config,
        strategies,
        sinks.bus(&plan.bt_config, plan.log_signals),
        rng,
    )?;
    bt.run(ticks);
    Ok(vec![NamedRun {
        name: names.join("+"),
        key: None,
        result: bt.finish(),
        sinks,
    }])
}

fn run_parallel(plan: &Plan, ticks: &[MarketObservation]) -> Result<Vec<NamedRun>, TickTraderError> {
    eprintln!(
        "Running {} independent backtests in parallel",
        plan.strategies.len()
    );
    let sinks: Vec<RunSinks> = plan.strategies.iter().map(|_| RunSinks::new()).collect();
    let runs = run_independent(&plan.bt_config, &plan.strategies, ticks, |i, _| {
        sinks[i].bus(&plan.bt_config, plan.log_signals)
    })?;
    Ok(runs
        .into_iter()
        .zip(&plan.strategies)
        .zip(sinks)
        .map(|((run, strategy), sinks)| NamedRun {
            name: run.name,
            key: Some(strategy.key()),
            result: run.result,
            sinks,
        })
        .collect())
}

/// `out/report.csv` + `mean_reversion` -> `out/report.mean_reversion.csv`.
pub fn per_run_path(output: &Path, key: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".into());
    output.with_file_name(format!("{stem}.{key}.csv"))
}

fn print_summary(name: &str, result: &BacktestResult, sinks: &RunSinks, initial_capital: f64) {
    let metrics = Metrics::compute(&result.equity_curve, initial_capital);
    let failed = result.orders.len() - result.fill_count();

    eprintln!("\n=== {name} ===");
    eprintln!("Final Cash:       {:.2}", result.context.cash());
    if let Some(equity) = result.final_equity() {
        eprintln!("Final Equity:     {equity:.2}");
    }
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Volatility:       {:.4}", metrics.volatility);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Signals:          {}", result.signals_published);
    eprintln!("Fills:            {}", result.fill_count());
    eprintln!("Failed:           {failed}");
    eprintln!("Rejections:       {}", result.error_log.len());
    eprintln!("Alerts:           {}", sinks.alert_count());

    if !result.context.positions().is_empty() {
        eprintln!("Positions:");
        for pos in result.context.positions().values() {
            eprintln!("  {}: {} @ {:.4}", pos.symbol, pos.quantity, pos.avg_price);
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let plan = match plan(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let bt = &plan.bt_config;
    eprintln!("\nBacktest:");
    eprintln!("  initial_capital:     {}", bt.initial_capital);
    eprintln!("  failure_probability: {}", bt.failure_probability);
    eprintln!("  seed:                {}", bt.seed);
    eprintln!("  alert_notional:      {}", bt.alert_notional);
    eprintln!("\nStrategies:");
    for s in &plan.strategies {
        eprintln!("  {s}");
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
