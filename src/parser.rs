//! Line-by-line bulk assembler
//!
//! Lines at top level are grouped into bulks of a fixed size. A line equal
//! to the open token starts a block: whatever was pending is flushed, and
//! everything up to the matching close token becomes one bulk regardless of
//! size. Nested open/close tokens only move the depth counter.

use serde::Serialize;

use crate::bulk::Bulk;

pub const DEFAULT_OPEN_TOKEN: &str = "{";
pub const DEFAULT_CLOSE_TOKEN: &str = "}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingState {
    TopLevel,
    InBlock,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParserStats {
    pub lines: usize,
    pub blocks: usize,
    pub commands: usize,
    /// Commands dropped because input ended inside an unterminated block
    pub discarded: usize,
}

type Subscriber<'a> = Box<dyn FnMut(&Bulk) + 'a>;

pub struct BulkParser<'a> {
    bulk_size: usize,
    open_token: String,
    close_token: String,
    state: ParsingState,
    depth: usize,
    pending: Vec<String>,
    stats: ParserStats,
    subscribers: Vec<Subscriber<'a>>,
}

impl<'a> BulkParser<'a> {
    /// A `bulk_size` of 0 never publishes by size; only blocks and end of input do.
    pub fn new(bulk_size: usize) -> Self {
        Self {
            bulk_size,
            open_token: DEFAULT_OPEN_TOKEN.to_string(),
            close_token: DEFAULT_CLOSE_TOKEN.to_string(),
            state: ParsingState::TopLevel,
            depth: 0,
            pending: Vec::new(),
            stats: ParserStats::default(),
            subscribers: Vec::new(),
        }
    }

    pub fn with_delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.open_token = open.into();
        self.close_token = close.into();
        self
    }

    pub fn state(&self) -> ParsingState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Register a handler called once per published bulk, in registration order.
    /// Only bulks published after this call are delivered.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&Bulk) + 'a,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Feed every line, then apply the end-of-input policy
    pub fn exec<I, S>(&mut self, lines: I) -> ParserStats
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.feed_line(line.into());
        }
        self.finish();
        self.stats
    }

    pub fn feed_line(&mut self, line: String) {
        self.stats.lines += 1;

        match self.state {
            ParsingState::TopLevel => {
                if line == self.open_token {
                    self.depth = 1;
                    self.publish();
                    self.state = ParsingState::InBlock;
                } else {
                    self.pending.push(line);
                    if self.pending.len() == self.bulk_size {
                        self.publish();
                    }
                }
            }
            ParsingState::InBlock => {
                if line == self.open_token {
                    self.depth += 1;
                } else if line == self.close_token {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.publish();
                        self.state = ParsingState::TopLevel;
                    }
                } else {
                    self.pending.push(line);
                }
            }
        }
    }

    /// End of input: publish a pending top-level bulk, drop an unterminated block
    pub fn finish(&mut self) {
        match self.state {
            ParsingState::TopLevel => self.publish(),
            ParsingState::InBlock => {
                self.stats.discarded += self.pending.len();
                self.pending.clear();
                self.depth = 0;
                self.state = ParsingState::TopLevel;
            }
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    fn publish(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let bulk = Bulk::from_commands(std::mem::take(&mut self.pending));
        self.stats.commands += bulk.len();
        self.stats.blocks += 1;

        for subscriber in self.subscribers.iter_mut() {
            subscriber(&bulk);
        }
    }
}
