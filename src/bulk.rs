//! Bulk type shared between the parser, the sinks and their workers
//!
//! A bulk is frozen at publication time: clones share the same backing
//! storage, so no subscriber can observe another one mutating it.

use std::fmt;
use std::sync::Arc;

/// An ordered, immutable group of commands processed as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bulk {
    commands: Arc<[String]>,
}

impl Bulk {
    pub fn from_commands(commands: Vec<String>) -> Self {
        Self {
            commands: commands.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.commands.iter()
    }

    /// Render as `bulk: <cmd1> <cmd2> ... ` (every command is followed by a space)
    pub fn render(&self) -> String {
        let capacity = 6 + self.commands.iter().map(|c| c.len() + 1).sum::<usize>();
        let mut out = String::with_capacity(capacity);
        out.push_str("bulk: ");
        for command in self.commands.iter() {
            out.push_str(command);
            out.push(' ');
        }
        out
    }
}

impl fmt::Display for Bulk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<'a> IntoIterator for &'a Bulk {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
