//! Bulk sinks: consumers that own workers and route bulks to them
//!
//! # Module Structure
//!
//! - `screen`: single worker printing each bulk as one line
//! - `file`: round-robin pool writing one log file per bulk

mod file;
mod screen;

pub use file::{FileSink, LogNamer};
pub use screen::{ScreenSink, SharedWriter};

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use crate::bulk::Bulk;
use crate::worker::WorkerId;

/// A consumer of published bulks
pub trait BulkSink {
    fn name(&self) -> &str;

    /// Hand a bulk to one of the sink's workers. Returns once it is queued.
    fn push(&mut self, bulk: Bulk) -> Result<()>;

    /// Drain and stop every worker. Idempotent.
    fn stop(&mut self);

    /// Per-worker counters, recorded when a bulk is queued (not when written)
    fn stats(&self) -> &SinkStats;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub blocks: usize,
    pub commands: usize,
}

/// Worker counters in first-contact order
#[derive(Debug, Clone, Default)]
pub struct SinkStats {
    workers: IndexMap<WorkerId, WorkerStats>,
}

impl SinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, worker: WorkerId, bulk: &Bulk) {
        let entry = self.workers.entry(worker).or_default();
        entry.blocks += 1;
        entry.commands += bulk.len();
    }

    /// Make sure an idle worker still shows up with zero counts
    pub fn ensure(&mut self, worker: WorkerId) {
        self.workers.entry(worker).or_default();
    }

    pub fn get(&self, worker: WorkerId) -> Option<WorkerStats> {
        self.workers.get(&worker).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, WorkerStats)> + '_ {
        self.workers.iter().map(|(id, stats)| (*id, *stats))
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn total(&self) -> WorkerStats {
        self.workers
            .values()
            .fold(WorkerStats::default(), |acc, s| WorkerStats {
                blocks: acc.blocks + s.blocks,
                commands: acc.commands + s.commands,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugConfig;
    use crate::worker::Worker;

    fn bulk(n: usize) -> Bulk {
        Bulk::from_commands((0..n).map(|i| i.to_string()).collect())
    }

    #[test]
    fn test_record_and_ensure() {
        let a = Worker::idle("a", DebugConfig::default(), |_, _| Ok(()));
        let b = Worker::idle("b", DebugConfig::default(), |_, _| Ok(()));
        let mut stats = SinkStats::new();

        stats.record(a.id(), &bulk(3));
        stats.record(a.id(), &bulk(2));
        stats.ensure(b.id());
        stats.ensure(a.id());

        assert_eq!(
            stats.get(a.id()),
            Some(WorkerStats {
                blocks: 2,
                commands: 5
            })
        );
        assert_eq!(stats.get(b.id()), Some(WorkerStats::default()));
        assert_eq!(stats.len(), 2);
        assert_eq!(
            stats.total(),
            WorkerStats {
                blocks: 2,
                commands: 5
            }
        );

        let order: Vec<WorkerId> = stats.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a.id(), b.id()]);
    }
}
