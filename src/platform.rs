use anyhow::Result;
use crossbeam_channel::Sender;
use std::io::{self, Write};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

#[cfg(unix)]
use signal_hook::{consts::SIGINT, consts::SIGPIPE, consts::SIGTERM, consts::SIGUSR1, iterator::Signals};

#[cfg(windows)]
use signal_hook::{consts::SIGINT, flag};

use crate::debug::format_error_message;

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
    SignalInt = 130,  // 128 + SIGINT (2)
    SignalPipe = 141, // 128 + SIGPIPE (13)
    SignalTerm = 143, // 128 + SIGTERM (15)
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

/// Set once a shutdown signal arrives
pub static SHOULD_TERMINATE: AtomicBool = AtomicBool::new(false);

/// Control messages sent by the signal handler to the runner
#[derive(Debug, Clone)]
pub enum Ctrl {
    /// Stop reading input. The pending bulk is flushed and sinks drain as usual.
    Shutdown { immediate: bool },
    /// Print parser counters so far
    PrintStats,
}

pub struct SignalHandler {
    _handle: thread::JoinHandle<()>,
}

impl SignalHandler {
    /// First SIGINT/SIGTERM requests a graceful shutdown, the second exits immediately
    pub fn new(ctrl_sender: Sender<Ctrl>) -> Result<Self> {
        #[cfg(unix)]
        {
            let mut signals = Signals::new([SIGINT, SIGPIPE, SIGTERM, SIGUSR1])?;

            let handle = thread::Builder::new()
                .name("bulkmt-signals".to_string())
                .spawn(move || {
                    let mut shutdown_count = 0;
                    for sig in signals.forever() {
                        match sig {
                            SIGINT | SIGTERM => {
                                SHOULD_TERMINATE.store(true, Ordering::Relaxed);
                                shutdown_count += 1;
                                let immediate = shutdown_count > 1;
                                let _ = ctrl_sender.send(Ctrl::Shutdown { immediate });
                                if immediate {
                                    if sig == SIGINT {
                                        ExitCode::SignalInt.exit();
                                    }
                                    ExitCode::SignalTerm.exit();
                                }
                            }
                            SIGPIPE => {
                                // Broken pipe - exit quietly (normal for Unix pipes)
                                SHOULD_TERMINATE.store(true, Ordering::Relaxed);
                                ExitCode::SignalPipe.exit();
                            }
                            SIGUSR1 => {
                                let _ = ctrl_sender.send(Ctrl::PrintStats);
                            }
                            _ => {
                                eprintln!(
                                    "{}",
                                    format_error_message(&format!(
                                        "Received unexpected signal: {}",
                                        sig
                                    ))
                                );
                            }
                        }
                    }
                })?;

            Ok(SignalHandler { _handle: handle })
        }

        #[cfg(windows)]
        {
            let term_flag = std::sync::Arc::new(AtomicBool::new(false));
            flag::register(SIGINT, std::sync::Arc::clone(&term_flag))?;

            let handle = thread::Builder::new()
                .name("bulkmt-signals".to_string())
                .spawn(move || {
                    let mut shutdown_count = 0;
                    loop {
                        thread::sleep(std::time::Duration::from_millis(100));
                        if term_flag.swap(false, Ordering::Relaxed) {
                            SHOULD_TERMINATE.store(true, Ordering::Relaxed);
                            shutdown_count += 1;
                            let immediate = shutdown_count > 1;
                            let _ = ctrl_sender.send(Ctrl::Shutdown { immediate });
                            if immediate {
                                ExitCode::SignalInt.exit();
                            }
                        }
                    }
                })?;

            Ok(SignalHandler { _handle: handle })
        }
    }

    pub fn should_terminate() -> bool {
        SHOULD_TERMINATE.load(Ordering::Relaxed)
    }
}

/// Safe wrapper for writing to stdout that handles broken pipes
pub struct SafeStdout {
    stdout: io::Stdout,
}

impl SafeStdout {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }

    /// Write to stdout, exiting quietly on a broken pipe
    pub fn write_str(&mut self, data: &str) -> Result<()> {
        self.write_all(data.as_bytes())
            .and_then(|_| self.flush())
            .map_err(|e| anyhow::anyhow!("Failed to write to stdout: {}", e))
    }

    pub fn writeln(&mut self, data: &str) -> Result<()> {
        self.write_str(data)?;
        self.write_str("\n")
    }

    fn exit_on_broken_pipe<T>(result: io::Result<T>) -> io::Result<T> {
        match result {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SignalPipe.exit(),
            other => other,
        }
    }
}

impl Write for SafeStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::exit_on_broken_pipe(self.stdout.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Self::exit_on_broken_pipe(self.stdout.flush())
    }
}

impl Default for SafeStdout {
    fn default() -> Self {
        Self::new()
    }
}

/// Safe wrapper for writing to stderr
pub struct SafeStderr {
    stderr: io::Stderr,
}

impl SafeStderr {
    pub fn new() -> Self {
        Self {
            stderr: io::stderr(),
        }
    }

    /// Write a line to stderr; if even that fails there is nothing left to report to
    pub fn writeln(&mut self, data: &str) {
        if writeln!(self.stderr, "{}", data).is_err() {
            ExitCode::GeneralError.exit();
        }
    }
}

impl Default for SafeStderr {
    fn default() -> Self {
        Self::new()
    }
}
