use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::bulk::Bulk;
use crate::debug::DebugConfig;
use crate::worker::Worker;

use super::{BulkSink, SinkStats};

/// Hands out unique `bulk<timestamp>_<counter>.log` paths.
///
/// The timestamp only has second resolution, so the counter keeps names
/// from colliding when several workers write within the same second.
#[derive(Debug)]
pub struct LogNamer {
    dir: PathBuf,
    counter: Mutex<u64>,
}

impl LogNamer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: Mutex::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn next_path(&self, timestamp: i64) -> PathBuf {
        let seq = {
            let mut counter = self
                .counter
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let seq = *counter;
            *counter += 1;
            seq
        };
        self.dir.join(format!("bulk{}_{}.log", timestamp, seq))
    }
}

/// Writes one log file per bulk, spreading bulks round robin over a worker pool
pub struct FileSink {
    workers: Vec<Worker>,
    namer: Arc<LogNamer>,
    next: usize,
    assignments: Vec<usize>,
    stats: SinkStats,
    debug: DebugConfig,
}

impl FileSink {
    pub fn new(worker_count: usize, dir: impl Into<PathBuf>, debug: DebugConfig) -> Result<Self> {
        if worker_count == 0 {
            bail!("file sink needs at least one worker");
        }

        let namer = Arc::new(LogNamer::new(dir));
        let workers = (0..worker_count)
            .map(|_| {
                let namer = Arc::clone(&namer);
                Worker::new("file", debug, move |ctx, bulk: Bulk| {
                    let path = namer.next_path(Utc::now().timestamp());
                    write_bulk(&path, &bulk)?;
                    debug.log_basic(&format!("{} wrote {}", ctx.id(), path.display()));
                    Ok(())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            workers,
            namer,
            next: 0,
            assignments: Vec::new(),
            stats: SinkStats::new(),
            debug,
        })
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn output_dir(&self) -> &Path {
        self.namer.dir()
    }

    /// Pool index chosen for every bulk accepted so far, in arrival order
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }
}

fn write_bulk(path: &Path, bulk: &Bulk) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Failed to create log file '{}'", path.display()))?;
    writeln!(file, "{}", bulk.render())
        .with_context(|| format!("Failed to write log file '{}'", path.display()))?;
    Ok(())
}

impl BulkSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn push(&mut self, bulk: Bulk) -> Result<()> {
        let index = self.next;
        let worker = &self.workers[index];
        self.debug.log_trace(&format!(
            "file: {} commands -> {} (slot {})",
            bulk.len(),
            worker.id(),
            index
        ));
        worker.submit(bulk.clone())?;
        self.stats.record(worker.id(), &bulk);
        self.assignments.push(index);
        self.next = (index + 1) % self.workers.len();
        Ok(())
    }

    fn stop(&mut self) {
        for worker in self.workers.iter_mut() {
            self.stats.ensure(worker.id());
            worker.stop();
        }
    }

    fn stats(&self) -> &SinkStats {
        &self.stats
    }
}
