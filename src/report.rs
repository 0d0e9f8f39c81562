//! User-facing progress and warning output.
//!
//! Verbosity is an explicit value threaded into build and query, never
//! process-global state.

/// How much progress output to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings only.
    Quiet,
    /// Progress summaries plus warnings.
    Normal,
    /// Per-file detail.
    Verbose,
}

/// Reporting sink for build/query progress.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    verbosity: Verbosity,
}

impl Reporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Progress line, shown at `Normal` and above.
    pub fn info(&self, msg: &str) {
        if self.verbosity >= Verbosity::Normal {
            println!("{}", msg);
        }
    }

    /// Per-file detail, shown only at `Verbose`.
    pub fn detail(&self, msg: &str) {
        if self.verbosity >= Verbosity::Verbose {
            println!("{}", msg);
        }
    }

    /// Warning on stderr, shown at every verbosity level.
    pub fn warn(&self, msg: &str) {
        eprintln!("Warning: {}", msg);
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(Verbosity::Normal)
    }
}
