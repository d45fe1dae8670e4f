//! tproj command line tool.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tproj_cli::commands::{
    error_report, run_check, run_environments, run_inspect, run_new, run_normalize,
};
use tproj_cli::config::CliConfig;
use tproj_cli::logging::{LogConfig, LogFormat, init_logging};
use tproj_xml::WriteOptions;
use tracing::debug;
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::summary::{print_created, print_environments, print_normalized, print_outline};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            return ExitCode::FAILURE;
        }
    };
    let log_config = log_config_from_cli(&cli, &config);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(error) => {
            debug!(error = %format!("{error:#}"), "command failed");
            for line in error_report(&error) {
                eprintln!("{line}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &CliConfig) -> Result<ExitCode> {
    match command {
        Command::Inspect(args) => {
            let result = run_inspect(&args.project)?;
            print_outline(&result);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => {
            let result = run_check(&args.project)?;
            println!("{}", serde_json::to_string_pretty(&result.messages)?);
            if result.skipped > 0 {
                eprintln!(
                    "warning: {} element(s) of {} were skipped",
                    result.skipped,
                    result.path.display()
                );
            }
            Ok(if result.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Normalize(args) => {
            let options = write_options(config, args.indent);
            let result = run_normalize(&args.file, args.output.as_deref(), options)?;
            print_normalized(&result);
            Ok(ExitCode::SUCCESS)
        }
        Command::New(args) => {
            let options = write_options(config, args.indent);
            let result = run_new(&args.name, &args.output, args.template, args.force, options)?;
            print_created(&result);
            Ok(ExitCode::SUCCESS)
        }
        Command::Environments(args) => {
            let rows = run_environments(&args.file)?;
            print_environments(&rows);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn write_options(config: &CliConfig, indent: Option<usize>) -> WriteOptions {
    let mut options = config.xml.write_options();
    if let Some(indent_width) = indent {
        options.indent_width = indent_width;
    }
    options
}

/// Flags win over `tproj.toml`, which wins over `RUST_LOG` and the defaults.
fn log_config_from_cli(cli: &Cli, config: &CliConfig) -> LogConfig {
    let mut log_config = config.logging.to_log_config();
    if cli.verbosity.is_present() {
        log_config = log_config.with_level(cli.verbosity.tracing_level_filter());
    }
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level(match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        });
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        });
    }
    if cli.log_file.is_some() {
        log_config = log_config.with_log_file(cli.log_file.clone());
    }
    log_config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => log_config.log_file.is_none() && io::stderr().is_terminal(),
    };
    log_config
}
