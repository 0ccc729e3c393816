//! Terminal presenter for build steps.
//!
//! Renders the step stream of a workflow with colored status symbols.
//! Colors are only applied when the stream supports them.

use crate::bundler::{Artifact, Level, Phase, Step};
use owo_colors::{OwoColorize, Stream};
use std::io::{self, Write};

pub mod symbols {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const INFO: &str = "•";
    pub const ARROW: &str = "→";
}

/// Colored output with verbosity control.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Renders one workflow step.
    ///
    /// Info steps are shown only in verbose mode; quiet mode hides all steps.
    pub fn step(&self, step: &Step) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut out = io::stdout().lock();
        match (step.level(), step.phase()) {
            (Level::Notify, Phase::Completed) => writeln!(
                out,
                "{} {}",
                symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
                step.label()
            ),
            (Level::Notify, _) => writeln!(
                out,
                "{} {}",
                symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.cyan()),
                step.label()
            ),
            (Level::Progress, _) => writeln!(
                out,
                "  {}",
                step.label().if_supports_color(Stream::Stdout, |s| s.dimmed())
            ),
            (Level::Info, _) if self.verbose => writeln!(
                out,
                "  {} {}",
                symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
                step.label()
            ),
            (Level::Info, _) => Ok(()),
        }
    }

    /// Prints a produced artifact with its checksum.
    pub fn artifact(&self, artifact: &Artifact) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(
            io::stdout().lock(),
            "  {} {} ({})\n    {}",
            artifact.kind.if_supports_color(Stream::Stdout, |s| s.bold()),
            artifact.path.display(),
            format_bytes(artifact.size),
            artifact
                .sha256
                .if_supports_color(Stream::Stdout, |s| s.dimmed())
        )
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(
            io::stdout().lock(),
            "{} {}",
            symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
            message.if_supports_color(Stream::Stdout, |s| s.bold())
        )
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(
            io::stderr().lock(),
            "{} {}",
            symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
            message.if_supports_color(Stream::Stderr, |s| s.yellow())
        )
    }

    /// Errors are printed even in quiet mode.
    pub fn error(&self, message: &str) -> io::Result<()> {
        writeln!(
            io::stderr().lock(),
            "{} {}",
            symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
            message.if_supports_color(Stream::Stderr, |s| s.red())
        )
    }

    /// Prints an indented line to stderr, alongside errors.
    pub fn hint(&self, message: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "  {}", message)
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
