// SPDX-License-Identifier: MIT
//
// The watch-style header line shown with --clear.
//
//   Every 2.0s (continuous): df -h    prod [ALT]  Mon Oct 06 14:03:11 UTC 2025 [0s|3ms|4.1MB]
//   └── left: source ──┘              └── right: custom, mode, timestamp, stats ──┘
//
// Left and right are separated by padding when both fit. When they don't,
// the left side gives way first, then the right side loses its start, so
// the timestamp and stats stay visible longest.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use pw_term::width::{string_width, truncate_start_to_width, truncate_to_width};

/// `Mon Oct 06 14:03:11 UTC 2025`
const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

/// What the input is, for the left side of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watching<'a> {
    /// A long-running command, sampled each cycle.
    Continuous(&'a str),
    /// A command re-run each cycle.
    Iterative(&'a str),
    Stdin,
}

/// Left side: what is being watched.
#[must_use]
pub fn left_text(watching: Watching<'_>, interval: Duration) -> String {
    let secs = interval.as_secs_f64();
    match watching {
        Watching::Continuous(cmd) if interval.is_zero() => format!("Continuous: {cmd}"),
        Watching::Continuous(cmd) => format!("Every {secs:.1}s (continuous): {cmd}"),
        Watching::Iterative(cmd) => format!("Every {secs:.1}s (iterative): {cmd}"),
        Watching::Stdin => "STDIN".to_owned(),
    }
}

/// Everything on the right of the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status<'a> {
    /// `--header` text.
    pub custom: &'a str,

    /// Alt view is showing.
    pub alt: bool,

    pub timestamp: String,

    /// Wall-clock time of the last command run.
    pub cmd_time: Option<Duration>,

    /// Rolling mean processing time, 0 when unknown.
    pub avg_ms: u64,

    /// Formatted resident memory.
    pub memory: Option<String>,
}

impl fmt::Display for Status<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.alt { " [ALT]" } else { "" };
        let label = format!("{}{tag}", self.custom);
        let label = label.trim();
        if !label.is_empty() {
            write!(f, "{label}  ")?;
        }
        write!(f, "{}", self.timestamp)?;

        let mut parts = Vec::new();
        if let Some(t) = self.cmd_time.filter(|t| !t.is_zero()) {
            parts.push(format!("{}s", t.as_secs_f64().round()));
        }
        if self.avg_ms > 0 || !parts.is_empty() {
            parts.push(format!("{}ms", self.avg_ms));
        }
        if let Some(mem) = &self.memory {
            parts.push(mem.clone());
        }
        if !parts.is_empty() {
            write!(f, " [{}]", parts.join("|"))?;
        }
        Ok(())
    }
}

/// Current time in [`TIMESTAMP_FORMAT`], local or UTC.
#[must_use]
pub fn timestamp(utc: bool) -> String {
    if utc {
        format_timestamp(&Utc::now())
    } else {
        format_timestamp(&Local::now())
    }
}

#[must_use]
pub fn format_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Fit `left` and `right` into `cols` columns.
#[must_use]
pub fn fit(left: &str, right: &str, cols: usize) -> String {
    let (lw, rw) = (string_width(left), string_width(right));
    if lw + 1 + rw <= cols {
        return format!("{left}{}{right}", " ".repeat(cols - lw - rw));
    }
    let left = truncate_to_width(left, cols.saturating_sub(rw + 1));
    let lw = string_width(left);
    let right = truncate_start_to_width(right, cols.saturating_sub(lw + 1));
    let gap = if cols > lw + string_width(right) { " " } else { "" };
    format!("{left}{gap}{right}")
}

/// [`fit`], optionally padded to the full width and drawn as a colored bar.
#[must_use]
pub fn header_line(left: &str, right: &str, cols: usize, colored: bool) -> String {
    let line = fit(left, right, cols);
    if !colored {
        return line;
    }
    let pad = cols.saturating_sub(string_width(&line));
    pw_term::ansi::header_bar(&format!("{line}{}", " ".repeat(pad)))
}
