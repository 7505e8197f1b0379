// SPDX-License-Identifier: MIT
//
// Command-line interface.
//
// Flags map onto three things: `EngineOptions` for the matching core, the
// input `Source`, and the driver `Settings` (interval, header, redraw).
// Parsing is clap's job, including `--iterative` excluding `--interval`.
// The numeric checks clap cannot express (finite, non-negative interval,
// positive timeouts) happen in the accessors below.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, ensure};
use clap::Parser;
use pw_engine::options::{EngineOptions, ViewMode, decode_escapes};

use crate::driver::Settings;

/// Seconds between cycles when reading stdin.
pub const STDIN_INTERVAL_SECS: f64 = 5.0;

/// Seconds between cycles when watching a command.
pub const CMD_INTERVAL_SECS: f64 = 2.0;

/// Default `--aux-sep`.
pub const AUX_SEP: &str = "###";

/// Log level argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    #[must_use]
    pub const fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// patwatch - count regex pattern hits per cycle and show the words they
/// captured
#[derive(Debug, Parser)]
#[command(name = "patwatch")]
#[command(author, version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Pattern catalog: ID, LINE_REGEX, [WORD_REGEX], [TEMPLATE], [PIPELINE]
    #[arg(short, long, value_name = "PATH")]
    pub patterns: PathBuf,

    /// Field separator in the catalog (escapes like \t are decoded)
    #[arg(long, value_name = "SEP", default_value = "\\t")]
    pub fs: String,

    /// Separator between words in uncolored rows
    #[arg(long, value_name = "SEP", default_value = " ", allow_hyphen_values = true)]
    pub sep: String,

    /// Separator joining several non-empty capture groups
    #[arg(long, value_name = "SEP", default_value = "", allow_hyphen_values = true)]
    pub cg_sep: String,

    /// Case-insensitive line and word regexes
    #[arg(long)]
    pub ignorecase: bool,

    /// Strip leading and trailing punctuation from words
    #[arg(long)]
    pub strip_punct: bool,

    /// Show words as colored chips (ignores --sep)
    #[arg(long)]
    pub color: bool,

    /// Start in the alternate (transformed) view
    #[arg(long)]
    pub alt_view: bool,

    /// Shell command to watch; it runs continuously and is restarted when
    /// it ends (default: read stdin)
    #[arg(short, long, value_name = "CMD")]
    pub cmd: Option<String>,

    /// Re-run --cmd to completion every SECS seconds instead
    #[arg(
        long,
        value_name = "SECS",
        requires = "cmd",
        conflicts_with = "interval",
        allow_negative_numbers = true
    )]
    pub iterative: Option<f64>,

    /// Shell used to run --cmd and --auxcmd
    #[arg(long, value_name = "PATH", default_value = "/bin/sh")]
    pub shell: PathBuf,

    /// Seconds between cycles [default: 5 for stdin, 2 for --cmd]
    #[arg(short = 't', long, value_name = "SECS", allow_negative_numbers = true)]
    pub interval: Option<f64>,

    /// Process one cycle, print it, and exit
    #[arg(long)]
    pub once: bool,

    /// Kill a --cmd run after this many seconds, keeping its partial output
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Second shell command whose output is shown with each frame
    #[arg(short = 'a', long, value_name = "CMD")]
    pub auxcmd: Option<String>,

    /// Line(s) between the rows and the --auxcmd output (escapes decoded)
    #[arg(long, value_name = "SEP", default_value = AUX_SEP, allow_hyphen_values = true)]
    pub aux_sep: String,

    /// Timeout for --auxcmd [default: --timeout]
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub aux_timeout: Option<f64>,

    /// Show the --auxcmd output above the rows
    #[arg(long)]
    pub aux_before: bool,

    /// Redraw the full screen each cycle under a watch-style header
    #[arg(long)]
    pub clear: bool,

    /// Draw the header black on dark green
    #[arg(long)]
    pub color_header: bool,

    /// Header timestamp in UTC
    #[arg(long)]
    pub utc: bool,

    /// Custom text shown at the right of the header
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub header: String,

    /// Suppress warnings and command stderr
    #[arg(long)]
    pub no_warn: bool,

    /// Log level (overrides PATWATCH_LOG)
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,
}

impl Cli {
    /// Options for the matching and rendering core.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        let mut field_sep = decode_escapes(&self.fs);
        if field_sep.is_empty() {
            field_sep = "\t".to_owned();
        }
        EngineOptions {
            field_sep,
            word_sep: decode_escapes(&self.sep),
            group_sep: decode_escapes(&self.cg_sep),
            ignore_case: self.ignorecase,
            strip_punct: self.strip_punct,
            colorize: self.color,
            initial_view: if self.alt_view {
                ViewMode::Alt
            } else {
                ViewMode::Normal
            },
        }
    }

    /// Cycle interval: `--iterative` if given, else `--interval`, else a
    /// default by input mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is negative or not finite.
    pub fn interval(&self) -> anyhow::Result<Duration> {
        if let Some(secs) = self.iterative {
            return non_negative("--iterative", secs);
        }
        let default = if self.cmd.is_some() {
            CMD_INTERVAL_SECS
        } else {
            STDIN_INTERVAL_SECS
        };
        non_negative("--interval", self.interval.unwrap_or(default))
    }

    /// Command timeout, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero, negative, or not finite.
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout.map(|secs| positive("--timeout", secs)).transpose()
    }

    /// Timeout for `--auxcmd`, falling back to `--timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if either timeout is zero, negative, or not finite.
    pub fn aux_timeout(&self) -> anyhow::Result<Option<Duration>> {
        match self.aux_timeout {
            Some(secs) => positive("--aux-timeout", secs).map(Some),
            None => self.timeout(),
        }
    }

    /// `--aux-sep` with escapes decoded.
    #[must_use]
    pub fn aux_sep(&self) -> String {
        decode_escapes(&self.aux_sep)
    }

    /// Driver settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is invalid.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        Ok(Settings {
            interval: self.interval()?,
            once: self.once,
            clear: self.clear,
            color_header: self.color_header,
            utc: self.utc,
            header: self.header.clone(),
        })
    }
}

fn non_negative(flag: &str, secs: f64) -> anyhow::Result<Duration> {
    ensure!(secs >= 0.0, "{flag} must not be negative (got {secs})");
    Duration::try_from_secs_f64(secs).with_context(|| format!("invalid {flag} {secs}"))
}

fn positive(flag: &str, secs: f64) -> anyhow::Result<Duration> {
    ensure!(secs > 0.0, "{flag} must be positive (got {secs})");
    Duration::try_from_secs_f64(secs).with_context(|| format!("invalid {flag} {secs}"))
}
