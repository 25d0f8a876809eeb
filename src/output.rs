//! Output sinks for the finished summary.
//!
//! Stdout is required; the clipboard is best-effort and only ever warns.

use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write to stdout: {0}")]
    Stdout(#[from] io::Error),
    #[error("clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),
}

/// A destination for the summary text
pub trait Sink {
    fn name(&self) -> &'static str;

    /// Whether a failure of this sink aborts the run
    fn required(&self) -> bool;

    fn emit(&mut self, text: &str) -> Result<(), OutputError>;
}

/// Prints the summary to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn required(&self) -> bool {
        true
    }

    fn emit(&mut self, text: &str) -> Result<(), OutputError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Copies the summary to the system clipboard.
///
/// The clipboard handle is dropped once the text is set. On X11 and Wayland the
/// selection is owned by this process, so without a clipboard manager running
/// the copied text is gone once graderace exits.
#[derive(Debug, Default)]
pub struct ClipboardSink;

impl Sink for ClipboardSink {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn required(&self) -> bool {
        false
    }

    fn emit(&mut self, text: &str) -> Result<(), OutputError> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text)?;
        Ok(())
    }
}

/// Emit `text` to every sink in order.
///
/// Required sink failures are returned; optional sink failures are logged.
pub fn deliver(text: &str, sinks: &mut [Box<dyn Sink>]) -> Result<(), OutputError> {
    for sink in sinks.iter_mut() {
        match sink.emit(text) {
            Ok(()) => tracing::debug!(sink = sink.name(), "summary delivered"),
            Err(e) if !sink.required() => {
                tracing::warn!(sink = sink.name(), error = %e, "could not deliver summary");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// The sinks enabled by configuration: stdout, then the clipboard if wanted
pub fn default_sinks(clipboard: bool) -> Vec<Box<dyn Sink>> {
    let mut sinks: Vec<Box<dyn Sink>> = vec![Box::new(StdoutSink)];
    if clipboard {
        sinks.push(Box::new(ClipboardSink));
    }
    sinks
}
