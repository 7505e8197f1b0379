// SPDX-License-Identifier: MIT
//
// Stderr logger behind the `log` facade.
//
// The level comes from `--log-level`, else the PATWATCH_LOG environment
// variable (off|error|warn|info|debug|trace), else `warn`. `--no-warn`
// caps whatever was chosen at `error`. Filtering happens through
// `log::max_level`, so the logger itself is a unit struct.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

use crate::cli::LogLevelArg;

/// Environment variable consulted when no `--log-level` is given.
pub const ENV_VAR: &str = "PATWATCH_LOG";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let stderr = std::io::stderr();
        let mut lock = stderr.lock();
        let _ = writeln!(lock, "[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Pick the effective level.
#[must_use]
pub fn resolve_level(flag: Option<LogLevelArg>, env: Option<&str>, no_warn: bool) -> LevelFilter {
    let level = flag.map_or_else(
        || {
            env.and_then(|v| v.trim().parse::<LevelFilter>().ok())
                .unwrap_or(DEFAULT_LEVEL)
        },
        LogLevelArg::to_level_filter,
    );
    if no_warn {
        level.min(LevelFilter::Error)
    } else {
        level
    }
}

/// Install the logger. A second call keeps the first logger but still
/// updates the level.
pub fn init(flag: Option<LogLevelArg>, no_warn: bool) {
    let env = std::env::var(ENV_VAR).ok();
    let level = resolve_level(flag, env.as_deref(), no_warn);
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
