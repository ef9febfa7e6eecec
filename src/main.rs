use anyhow::Result;
use clap::Parser;
use crossbeam_channel::{unbounded, Receiver};

use bulkmt::cli::{Cli, StatsFormat};
use bulkmt::config::BulkConfig;
use bulkmt::config_file::ConfigFile;
use bulkmt::debug::{format_error_message, format_warning_message};
use bulkmt::platform::{Ctrl, ExitCode, SafeStderr, SafeStdout, SignalHandler};
use bulkmt::runner;

fn main() {
    let mut stderr = SafeStderr::new();
    let cli = process_args_with_config(&mut stderr);

    let config = match BulkConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            stderr.writeln(&format_error_message(&format!("{:#}", e)));
            ExitCode::InvalidUsage.exit();
        }
    };

    let (ctrl_tx, ctrl_rx) = unbounded();
    let _signal_handler = match SignalHandler::new(ctrl_tx) {
        Ok(handler) => Some(handler),
        Err(e) => {
            stderr.writeln(&format_warning_message(&format!(
                "signal handling unavailable: {}",
                e
            )));
            None
        }
    };

    if let Err(e) = run(&config, ctrl_rx) {
        stderr.writeln(&format_error_message(&format!("{:#}", e)));
        ExitCode::GeneralError.exit();
    }

    if SignalHandler::should_terminate() {
        ExitCode::SignalInt.exit();
    }
}

fn run(config: &BulkConfig, ctrl_rx: Receiver<Ctrl>) -> Result<()> {
    let report = runner::run(config, ctrl_rx)?;

    if config.output.stats {
        let text = match config.output.stats_format {
            StatsFormat::Table => format!("\n{}", report.format_table()),
            StatsFormat::Json => format!("{}\n", report.format_json()?),
        };
        SafeStdout::new().write_str(&text)?;
    }

    Ok(())
}

/// Extract --config-file argument early, before clap runs
fn extract_config_file_arg(args: &[String]) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == "--config-file")
        .map(|pair| pair[1].clone())
}

/// Apply config file defaults and aliases, then parse the command line
fn process_args_with_config(stderr: &mut SafeStderr) -> Cli {
    let raw_args: Vec<String> = std::env::args().collect();

    if raw_args.iter().any(|arg| arg == "--show-config") {
        ConfigFile::show_config();
        ExitCode::Success.exit();
    }

    let ignore_config = raw_args.iter().any(|arg| arg == "--ignore-config");
    let processed_args = if ignore_config {
        raw_args
    } else {
        let config_file_path = extract_config_file_arg(&raw_args);
        match ConfigFile::load_with_custom_path(config_file_path.as_deref())
            .and_then(|config_file| config_file.process_args(raw_args))
        {
            Ok(processed) => processed,
            Err(e) => {
                stderr.writeln(&format_error_message(&format!("Config error: {:#}", e)));
                ExitCode::GeneralError.exit();
            }
        }
    };

    let cli = Cli::parse_from(processed_args);

    // Aliases are expanded before clap sees them; leftovers mean config was ignored.
    if !cli.alias.is_empty() {
        stderr.writeln(&format_warning_message(&format!(
            "aliases ignored without a config file: {}",
            cli.alias.join(", ")
        )));
    }

    cli
}
