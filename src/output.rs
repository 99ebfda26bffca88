//! User-facing diagnostics.
//!
//! Listed paths and audit records go to the sinks handed to the sweeper;
//! this module only styles the messages addressed to the operator, all of
//! which go to stderr so they never mix with listing output.

use crate::sweeper::SweepSummary;
use colored::*;

/// Styles operator-facing messages consistently.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::error("Failed to delete /tmp/app.log: permission denied");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Renders a one-line summary of a completed sweep.
    pub fn summary_line(summary: &SweepSummary) -> String {
        format!(
            "{} visited, {} matched, {} listed, {} archived ({} bytes), {} deleted",
            summary.visited,
            summary.matched,
            summary.listed,
            summary.archived,
            summary.bytes_archived,
            summary.deleted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let summary = SweepSummary {
            visited: 12,
            matched: 4,
            listed: 0,
            archived: 4,
            deleted: 4,
            bytes_archived: 2048,
        };
        assert_eq!(
            OutputFormatter::summary_line(&summary),
            "12 visited, 4 matched, 0 listed, 4 archived (2048 bytes), 4 deleted"
        );
    }
}
