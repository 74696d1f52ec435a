//! CLI integration tests for the backtest command orchestration.
//!
//! Tests cover:
//! - Config building from real INI files (build_backtest_config, build_strategy_configs)
//! - Path resolution between flags and config keys
//! - Validate and dry-run commands
//! - Combined and parallel backtests end to end, including report files
//! - Exit codes for config, data and report failures

mod common;

use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;
use ticktrader::adapters::file_config_adapter::FileConfigAdapter;
use ticktrader::cli::{self, Cli, Command};
use ticktrader::domain::config_validation::{build_backtest_config, build_strategy_configs};
use ticktrader::domain::error::TickTraderError;
use ticktrader::domain::strategy::StrategyConfig;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[backtest]
initial_capital = 100000.0
failure_probability = 0.0
seed = 11
alert_notional = 500
strategies = mean_reversion, breakout, momentum

[mean_reversion]
window = 5
k = 1.0
quantity = 10

[breakout]
lookback = 3
quantity = 5

[momentum]
window = 3
quantity = 2

[logging]
level = warn
"#;

fn backtest(config: &Path, data: Option<&Path>, output: Option<&Path>, parallel: bool) -> ExitCode {
    cli::run(Cli {
        command: Command::Backtest {
            config: config.to_path_buf(),
            data: data.map(Path::to_path_buf),
            output: output.map(Path::to_path_buf),
            parallel,
            dry_run: false,
        },
    })
}

fn tick_file(dir: &Path) -> std::path::PathBuf {
    let ticks = interleaved(("AAA", &wave(40, 100.0)), ("BBB", &wave(40, 25.0)));
    write_file(dir, "ticks.csv", &ticks_csv(&ticks))
}

mod config_loading {
    use super::*;

    #[test]
    fn builds_configs_from_file() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();

        let bt = build_backtest_config(&adapter).unwrap();
        assert_eq!(bt.seed, 11);
        assert!((bt.failure_probability - 0.0).abs() < f64::EPSILON);
        assert!((bt.alert_notional - 500.0).abs() < f64::EPSILON);

        let strategies = build_strategy_configs(&adapter).unwrap();
        assert_eq!(strategies.len(), 3);
        assert_eq!(
            strategies[1],
            StrategyConfig::Breakout {
                lookback: 3,
                quantity: 5.0
            }
        );
        assert_eq!(strategies[2].name(), "Momentum");
    }

    #[test]
    fn log_level_comes_from_config() {
        let file = write_temp_ini(VALID_INI);
        let cli = Cli {
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        };
        assert_eq!(cli::configured_log_level(&cli), "warn");
    }

    #[test]
    fn log_level_defaults_when_file_missing() {
        let cli = Cli {
            command: Command::Validate {
                config: "/nonexistent/bt.ini".into(),
            },
        };
        assert_eq!(cli::configured_log_level(&cli), cli::DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn invalid_section_is_reported_with_key() {
        let file = write_temp_ini("[backtest]\nstrategies = breakout\n[breakout]\nquantity = -1\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let err = build_strategy_configs(&adapter).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config value [breakout] quantity: quantity must be positive"
        );
        assert_eq!(ExitCode::from(&err), ExitCode::from(2));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_file_succeeds() {
        let file = write_temp_ini(VALID_INI);
        let code = cli::run(Cli {
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        });
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let file = write_temp_ini("[backtest]\nstrategies = martingale\n");
        let code = cli::run(Cli {
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        });
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn duplicate_strategy_is_config_error() {
        let dir = TempDir::new().unwrap();
        let ini = VALID_INI.replace(
            "strategies = mean_reversion, breakout, momentum",
            "strategies = breakout, breakout",
        );
        let ini = write_file(dir.path(), "bt.ini", &ini);
        let data = tick_file(dir.path());
        let out = dir.path().join("report.csv");

        let code = backtest(&ini, Some(data.as_path()), Some(out.as_path()), true);
        assert_eq!(code, ExitCode::from(2));
        assert!(!dir.path().join("report.breakout.csv").exists());
    }

    #[test]
    fn dry_run_does_not_need_data() {
        let file = write_temp_ini(VALID_INI);
        let code = cli::run(Cli {
            command: Command::Backtest {
                config: file.path().to_path_buf(),
                data: Some("/nonexistent/ticks.csv".into()),
                output: None,
                parallel: false,
                dry_run: true,
            },
        });
        assert_eq!(code, ExitCode::SUCCESS);
    }
}

mod backtest_command {
    use super::*;

    #[test]
    fn combined_run_writes_report() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "bt.ini", VALID_INI);
        let data = tick_file(dir.path());
        let out = dir.path().join("report.csv");

        let code = backtest(&ini, Some(data.as_path()), Some(out.as_path()), false);
        assert_eq!(code, ExitCode::SUCCESS);

        let equity = fs::read_to_string(&out).unwrap();
        // header + one row per tick
        assert_eq!(equity.lines().count(), 81);
        assert!(equity.starts_with("timestamp,equity\n"));

        let trades = fs::read_to_string(dir.path().join("report.trades.csv")).unwrap();
        assert!(trades.lines().count() > 1);
        assert!(trades.lines().skip(1).all(|l| l.starts_with("EXECUTE,")));
    }

    #[test]
    fn parallel_run_writes_one_report_per_strategy() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "bt.ini", VALID_INI);
        let data = tick_file(dir.path());
        let out = dir.path().join("report.csv");

        let code = backtest(&ini, Some(data.as_path()), Some(out.as_path()), true);
        assert_eq!(code, ExitCode::SUCCESS);

        for name in ["mean_reversion", "breakout", "momentum"] {
            let path = dir.path().join(format!("report.{name}.csv"));
            let equity = fs::read_to_string(&path).unwrap();
            assert_eq!(equity.lines().count(), 81, "{}", path.display());
        }
        assert!(!out.exists());
    }

    #[test]
    fn data_and_report_paths_from_config() {
        let dir = TempDir::new().unwrap();
        let data = tick_file(dir.path());
        let out = dir.path().join("from_config.csv");
        let ini = VALID_INI.replace(
            "[backtest]\n",
            &format!(
                "[backtest]\ndata_path = {}\nreport_path = {}\n",
                data.display(),
                out.display()
            ),
        );
        let ini = write_file(dir.path(), "bt.ini", &ini);

        assert_eq!(backtest(&ini, None, None, false), ExitCode::SUCCESS);
        assert!(out.exists());
    }

    #[test]
    fn no_report_without_output() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "bt.ini", VALID_INI);
        let data = tick_file(dir.path());

        assert_eq!(backtest(&ini, Some(data.as_path()), None, false), ExitCode::SUCCESS);
        let csvs = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(csvs, 2);
    }

    #[test]
    fn missing_data_path_is_config_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "bt.ini", VALID_INI);
        assert_eq!(backtest(&ini, None, None, false), ExitCode::from(2));
    }

    #[test]
    fn bad_tick_file_is_data_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "bt.ini", VALID_INI);
        let data = write_file(dir.path(), "ticks.csv", "timestamp,symbol,price\n2024-01-02,AAA,-1\n");
        assert_eq!(backtest(&ini, Some(data.as_path()), None, false), ExitCode::from(5));
    }

    #[test]
    fn empty_tick_file_is_data_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "bt.ini", VALID_INI);
        let data = write_file(dir.path(), "ticks.csv", "timestamp,symbol,price\n");
        assert_eq!(backtest(&ini, Some(data.as_path()), None, false), ExitCode::from(5));
    }

    #[test]
    fn unwritable_report_is_report_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "bt.ini", VALID_INI);
        let data = tick_file(dir.path());
        let out = dir.path().join("missing_dir").join("report.csv");
        assert_eq!(backtest(&ini, Some(data.as_path()), Some(out.as_path()), false), ExitCode::from(6));
    }

    #[test]
    fn report_error_maps_to_exit_six() {
        let err = TickTraderError::Report {
            reason: "disk full".into(),
        };
        assert_eq!(ExitCode::from(&err), ExitCode::from(6));
    }
}
