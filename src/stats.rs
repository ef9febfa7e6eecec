//! End-of-run statistics report

use anyhow::Result;
use serde::Serialize;

use crate::parser::ParserStats;
use crate::sink::BulkSink;

#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub worker: String,
    pub blocks: usize,
    pub commands: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SinkReport {
    pub name: String,
    pub blocks: usize,
    pub commands: usize,
    pub workers: Vec<WorkerReport>,
}

impl SinkReport {
    pub fn from_sink(sink: &dyn BulkSink) -> Self {
        let stats = sink.stats();
        let total = stats.total();
        Self {
            name: sink.name().to_string(),
            blocks: total.blocks,
            commands: total.commands,
            workers: stats
                .iter()
                .map(|(id, counts)| WorkerReport {
                    worker: id.to_string(),
                    blocks: counts.blocks,
                    commands: counts.commands,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub parser: ParserStats,
    pub sinks: Vec<SinkReport>,
}

impl RunReport {
    pub fn sink(&self, name: &str) -> Option<&SinkReport> {
        self.sinks.iter().find(|s| s.name == name)
    }

    pub fn format_table(&self) -> String {
        let mut output = String::new();

        output.push_str("MAIN\n");
        output.push_str(&format!("  Lines {}\n", self.parser.lines));
        output.push_str(&format!("  Blocks {}\n", self.parser.blocks));
        output.push_str(&format!("  Commands {}\n", self.parser.commands));
        if self.parser.discarded > 0 {
            output.push_str(&format!(
                "  Discarded {} (unterminated block)\n",
                self.parser.discarded
            ));
        }

        for sink in &self.sinks {
            output.push('\n');
            output.push_str(&sink.name.to_uppercase());
            output.push('\n');
            output.push_str("Blocks\n");
            for worker in &sink.workers {
                output.push_str(&format!("  {} => {}\n", worker.worker, worker.blocks));
            }
            output.push_str("Commands\n");
            for worker in &sink.workers {
                output.push_str(&format!("  {} => {}\n", worker.worker, worker.commands));
            }
        }

        output
    }

    pub fn format_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
