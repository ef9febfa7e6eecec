//! Wires the line reader, the parser and the sinks together for one run

use anyhow::Result;
use crossbeam_channel::{never, select, Receiver};
use std::io::BufRead;

use crate::bulk::Bulk;
use crate::config::BulkConfig;
use crate::debug;
use crate::parser::{BulkParser, ParserStats};
use crate::platform::Ctrl;
use crate::readers::{open_input, spawn_line_reader, LineMessage};
use crate::sink::{BulkSink, FileSink, ScreenSink};
use crate::stats::{RunReport, SinkReport};

/// Create the sinks enabled in the configuration, screen first
pub fn build_sinks(config: &BulkConfig) -> Result<Vec<Box<dyn BulkSink>>> {
    let debug = config.debug();
    let mut sinks: Vec<Box<dyn BulkSink>> = Vec::new();

    if config.output.screen {
        sinks.push(Box::new(ScreenSink::stdout(debug)?));
    }
    if config.output.files {
        let files = FileSink::new(
            config.effective_file_threads(),
            config.output.dir.clone(),
            debug,
        )?;
        debug.log_basic(&format!(
            "file sink: {} workers writing to {}",
            files.workers().len(),
            files.output_dir().display()
        ));
        sinks.push(Box::new(files));
    }

    Ok(sinks)
}

/// Run with the configured input and sinks
pub fn run(config: &BulkConfig, ctrl_rx: Receiver<Ctrl>) -> Result<RunReport> {
    let reader = open_input(config.input.path.as_deref())?;
    let sinks = build_sinks(config)?;
    run_with_sinks(config, reader, sinks, ctrl_rx)
}

/// Parse `reader` into bulks, fan them out to `sinks`, then stop the sinks.
///
/// A shutdown request ends input early; the pending bulk is still flushed and
/// every sink drains before the report is built.
pub fn run_with_sinks<R>(
    config: &BulkConfig,
    reader: R,
    mut sinks: Vec<Box<dyn BulkSink>>,
    ctrl_rx: Receiver<Ctrl>,
) -> Result<RunReport>
where
    R: BufRead + Send + 'static,
{
    let (lines, _reader_handle) = spawn_line_reader(reader)?;

    let parser_stats = {
        let mut parser = BulkParser::new(config.processing.bulk_size)
            .with_delimiters(&config.input.open_token, &config.input.close_token);

        for sink in sinks.iter_mut() {
            parser.subscribe(move |bulk: &Bulk| {
                if let Err(e) = sink.push(bulk.clone()) {
                    debug::warn(&format!("{} sink dropped bulk: {:#}", sink.name(), e));
                }
            });
        }

        pump_lines(&mut parser, &lines, ctrl_rx);
        parser.finish();
        parser.stats()
    };

    if parser_stats.discarded > 0 {
        debug::warn(&format!(
            "input ended inside a block, {} commands discarded",
            parser_stats.discarded
        ));
    }

    for sink in sinks.iter_mut() {
        sink.stop();
    }

    Ok(RunReport {
        parser: parser_stats,
        sinks: sinks
            .iter()
            .map(|sink| SinkReport::from_sink(sink.as_ref()))
            .collect(),
    })
}

fn pump_lines(parser: &mut BulkParser<'_>, lines: &Receiver<LineMessage>, ctrl_rx: Receiver<Ctrl>) {
    let mut ctrl = ctrl_rx;
    loop {
        select! {
            recv(lines) -> msg => match msg {
                Ok(LineMessage::Line(line)) => parser.feed_line(line),
                Ok(LineMessage::Error(e)) => {
                    debug::warn(&format!("stopped reading input: {}", e));
                    return;
                }
                Ok(LineMessage::Eof) | Err(_) => return,
            },
            recv(ctrl) -> msg => match msg {
                Ok(Ctrl::Shutdown { .. }) => return,
                Ok(Ctrl::PrintStats) => print_progress(parser.stats()),
                Err(_) => ctrl = never(),
            },
        }
    }
}

fn print_progress(stats: ParserStats) {
    eprintln!(
        "bulkmt: {} lines, {} blocks, {} commands so far",
        stats.lines, stats.blocks, stats.commands
    );
}
