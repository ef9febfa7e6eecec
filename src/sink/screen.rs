use anyhow::{Context, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::bulk::Bulk;
use crate::debug::DebugConfig;
use crate::platform::SafeStdout;
use crate::worker::Worker;

use super::{BulkSink, SinkStats};

pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Prints every bulk as `<worker> bulk: ...` from a single worker thread
pub struct ScreenSink {
    worker: Worker,
    stats: SinkStats,
    debug: DebugConfig,
}

impl ScreenSink {
    pub fn stdout(debug: DebugConfig) -> Result<Self> {
        Self::new(Arc::new(Mutex::new(SafeStdout::new())), debug)
    }

    pub fn new(output: SharedWriter, debug: DebugConfig) -> Result<Self> {
        let worker = Worker::new("screen", debug, move |ctx, bulk: Bulk| {
            let mut out = output
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            writeln!(out, "{} {}", ctx.id(), bulk.render())
                .and_then(|_| out.flush())
                .context("Failed to write bulk to screen")
        })?;

        Ok(Self {
            worker,
            stats: SinkStats::new(),
            debug,
        })
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }
}

impl BulkSink for ScreenSink {
    fn name(&self) -> &str {
        "screen"
    }

    fn push(&mut self, bulk: Bulk) -> Result<()> {
        let id = self.worker.id();
        self.debug
            .log_trace(&format!("screen: {} commands -> {}", bulk.len(), id));
        self.worker.submit(bulk.clone())?;
        self.stats.record(id, &bulk);
        Ok(())
    }

    fn stop(&mut self) {
        self.stats.ensure(self.worker.id());
        self.worker.stop();
    }

    fn stats(&self) -> &SinkStats {
        &self.stats
    }
}
