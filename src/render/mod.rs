//! Rendering layer.
//!
//! Renderers here return plain data — rows, bars, tones — and know nothing
//! about widgets or stdout.  The TUI shell and the CLI subcommands bind the
//! same structures to ratatui widgets and plain text respectively, so every
//! property of the rendered output is testable without a terminal.

pub mod metrics;
pub mod results;

/// Severity tone attached to pills, bars, and the validation summary.
/// The shell maps these to terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Info,
}
