use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::cli::{Cli, StatsFormat};
use crate::debug::DebugConfig;
use crate::parser::{DEFAULT_CLOSE_TOKEN, DEFAULT_OPEN_TOKEN};

/// Main configuration struct for bulkmt
#[derive(Debug, Clone)]
pub struct BulkConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone)]
pub struct InputConfig {
    /// None reads stdin
    pub path: Option<PathBuf>,
    pub open_token: String,
    pub close_token: String,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub screen: bool,
    pub files: bool,
    pub stats: bool,
    pub stats_format: StatsFormat,
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub bulk_size: usize,
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    /// 0 means one per CPU
    pub file_threads: usize,
}

impl BulkConfig {
    /// Build and validate configuration from CLI arguments
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let dir = match &cli.output_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let config = Self {
            input: InputConfig {
                path: cli.input.clone(),
                open_token: cli.open_token.clone(),
                close_token: cli.close_token.clone(),
            },
            output: OutputConfig {
                dir,
                screen: !cli.no_screen,
                files: !cli.no_files,
                stats: !cli.no_stats,
                stats_format: cli.stats_format.clone(),
            },
            processing: ProcessingConfig {
                bulk_size: cli.bulk_size,
                verbose: cli.verbose,
            },
            performance: PerformanceConfig {
                file_threads: cli.file_threads,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.processing.bulk_size == 0 {
            bail!("bulk size must be at least 1");
        }
        if self.input.open_token.is_empty() || self.input.close_token.is_empty() {
            bail!("block tokens must not be empty");
        }
        if self.input.open_token == self.input.close_token {
            bail!(
                "open and close tokens must differ (both are '{}')",
                self.input.open_token
            );
        }
        if self.output.files && !self.output.dir.is_dir() {
            bail!(
                "output directory '{}' does not exist",
                self.output.dir.display()
            );
        }
        Ok(())
    }

    pub fn effective_file_threads(&self) -> usize {
        if self.performance.file_threads == 0 {
            num_cpus::get()
        } else {
            self.performance.file_threads
        }
    }

    pub fn debug(&self) -> DebugConfig {
        DebugConfig::new(self.processing.verbose)
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            input: InputConfig {
                path: None,
                open_token: DEFAULT_OPEN_TOKEN.to_string(),
                close_token: DEFAULT_CLOSE_TOKEN.to_string(),
            },
            output: OutputConfig {
                dir: PathBuf::from("."),
                screen: true,
                files: true,
                stats: true,
                stats_format: StatsFormat::Table,
            },
            processing: ProcessingConfig {
                bulk_size: 5,
                verbose: 0,
            },
            performance: PerformanceConfig { file_threads: 2 },
        }
    }
}
