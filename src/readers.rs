//! Input line source
//!
//! Lines are read on their own thread and forwarded over a bounded channel
//! so the runner can wait on input and control messages at the same time.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::thread;

use crate::debug;

pub const LINE_BUFFER_SIZE: usize = 1024;

#[derive(Debug)]
pub enum LineMessage {
    Line(String),
    Error(io::Error),
    Eof,
}

/// Open the input: a file if given, stdin otherwise ("-" also means stdin)
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match path {
        Some(p) if p != Path::new("-") => {
            let file = File::open(p)
                .with_context(|| format!("Failed to open input file '{}'", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Spawn the reader thread. The thread ends at EOF, on a read error, or when
/// the receiving side is dropped.
pub fn spawn_line_reader<R>(reader: R) -> Result<(Receiver<LineMessage>, thread::JoinHandle<()>)>
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = bounded(LINE_BUFFER_SIZE);
    let handle = thread::Builder::new()
        .name("bulkmt-reader".to_string())
        .spawn(move || read_lines(reader, sender))
        .context("Failed to spawn input reader thread")?;
    Ok((receiver, handle))
}

fn read_lines<R: BufRead>(mut reader: R, sender: Sender<LineMessage>) {
    let mut buffer = Vec::new();
    let mut line_number = 0usize;
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => {
                let _ = sender.send(LineMessage::Eof);
                break;
            }
            Ok(_) => {
                line_number += 1;
                let line = decode_line(&buffer, line_number);
                if sender.send(LineMessage::Line(line)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = sender.send(LineMessage::Error(e));
                break;
            }
        }
    }
}

/// Strip the line terminator; invalid UTF-8 is replaced rather than ending input
fn decode_line(raw: &[u8], line_number: usize) -> String {
    let text = String::from_utf8_lossy(raw);
    if let Cow::Owned(_) = text {
        debug::warn(&format!(
            "line {} is not valid UTF-8, invalid bytes replaced",
            line_number
        ));
    }
    text.trim_end_matches(&['\r', '\n'][..]).to_string()
}
