// Command-line interface definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum StatsFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "bulkmt")]
#[command(about = "Group a stream of commands into bulks and log them from worker threads")]
#[command(
    long_about = "Group a stream of commands into bulks and log them from worker threads\n\nCommands are read one per line. Outside of blocks they are grouped into bulks of\nBULK_SIZE commands. A line containing only '{' starts a block and a matching '}'\nends it; everything in between forms one bulk regardless of size. Nested blocks\nare merged into the outer one. A block left open at end of input is discarded.\n\nEvery bulk is printed by a screen worker and written to its own\nbulk<timestamp>_<n>.log file by a pool of file workers.\n\nEXAMPLES:\n  bulkmt 3 < commands.txt\n  bulkmt 5 --file-threads 4 --output-dir logs/ -i commands.txt"
)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Commands per bulk outside of blocks (must be at least 1)
    #[arg(value_name = "BULK_SIZE", default_value_t = 5, value_parser = parse_bulk_size)]
    pub bulk_size: usize,

    /// Read commands from FILE instead of stdin ("-" means stdin)
    #[arg(short = 'i', long = "input", value_name = "FILE", help_heading = "Input Options")]
    pub input: Option<PathBuf>,

    /// Line that opens a block
    #[arg(long = "open-token", default_value = "{", help_heading = "Input Options")]
    pub open_token: String,

    /// Line that closes a block
    #[arg(long = "close-token", default_value = "}", help_heading = "Input Options")]
    pub close_token: String,

    /// Directory for bulk log files (default: current directory)
    #[arg(short = 'd', long = "output-dir", value_name = "DIR", help_heading = "Output Options")]
    pub output_dir: Option<PathBuf>,

    /// Do not print bulks to stdout
    #[arg(long = "no-screen", help_heading = "Output Options")]
    pub no_screen: bool,

    /// Do not write bulk log files
    #[arg(long = "no-files", help_heading = "Output Options")]
    pub no_files: bool,

    /// Format of the end-of-run statistics
    #[arg(long = "stats-format", value_enum, default_value = "table", help_heading = "Output Options")]
    pub stats_format: StatsFormat,

    /// Do not print end-of-run statistics
    #[arg(long = "no-stats", help_heading = "Output Options")]
    pub no_stats: bool,

    /// Number of file writer threads (0 = one per CPU)
    #[arg(long = "file-threads", default_value_t = 2, help_heading = "Performance Options")]
    pub file_threads: usize,

    /// Increase diagnostic output on stderr (-v lifecycle, -vv per bulk)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Error Handling")]
    pub verbose: u8,

    /// Expand a named alias from the config file
    #[arg(short = 'a', long = "alias", value_name = "NAME", help_heading = "Configuration Options")]
    pub alias: Vec<String>,

    /// Use this config file instead of the default search path
    #[arg(long = "config-file", value_name = "FILE", help_heading = "Configuration Options")]
    pub config_file: Option<String>,

    /// Ignore configuration files
    #[arg(long = "ignore-config", help_heading = "Configuration Options")]
    pub ignore_config: bool,

    /// Show configuration file locations and active settings, then exit
    #[arg(long = "show-config", help_heading = "Configuration Options")]
    pub show_config: bool,
}

fn parse_bulk_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a valid bulk size", value))?;
    if size == 0 {
        return Err("bulk size must be at least 1".to_string());
    }
    Ok(size)
}
