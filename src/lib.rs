// Core library for bulkmt: bulk assembly, worker threads and sinks

pub mod bulk;
pub mod cli;
pub mod config;
pub mod config_file;
pub mod debug;
pub mod parser;
pub mod platform;
pub mod readers;
pub mod runner;
pub mod sink;
pub mod stats;
pub mod worker;

pub use bulk::Bulk;
pub use config::BulkConfig;
pub use parser::{BulkParser, ParserStats};
pub use sink::{BulkSink, FileSink, ScreenSink};
pub use stats::RunReport;
pub use worker::{Worker, WorkerContext, WorkerId};
