// SPDX-License-Identifier: MIT
//
// The cycle loop.
//
//   ┌─▶ next batch ─▶ Monitor::run_cycle ─▶ aux command ─▶ paint ─┐
//   │                                                            │
//   └──── wait(interval), handling keys ◀────────────────────────┘
//
// The wait ends early when there is something new to show: a stream
// closed, or a continuous command run finished.
//
// Keys are read only when the input is a command and stdin is a terminal;
// when stdin is the input, every byte on it is data. While keys are live
// the terminal is in cbreak mode, so Ctrl-C arrives as a key and the loop
// exits through the normal path that restores the terminal.
//
//   a        toggle Normal / Alt view
//   c        toggle color-debug (with --color)
//   + / -    interval ± 5 s, never below 1 s
//   q, ^C    quit
//
// Without --clear each frame is appended to the output. With --clear the
// screen is cleared once, then every frame repaints from the top under the
// header, clearing each line's tail and everything below the last row.

use std::io::{self, Write};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use pw_engine::{Frame, Monitor};
use pw_term::ansi;
use pw_term::reader::{Key, KeyReader};
use pw_term::terminal::{self, CbreakGuard};

use crate::header::{self, Status};
use crate::source::{AuxBlock, AuxCommand, Source};
use crate::stats::{self, RollingMean};

/// Step for `+` / `-`.
pub const INTERVAL_STEP: Duration = Duration::from_secs(5);

/// `-` never goes below this.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest wait between cycles, so `-t 0` does not spin.
const MIN_TICK: Duration = Duration::from_millis(100);

/// Driver-level settings from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    pub interval: Duration,
    pub once: bool,
    pub clear: bool,
    pub color_header: bool,
    pub utc: bool,
    pub header: String,
}

/// What a keypress asks of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Repaint,
    Ignore,
}

/// Apply `key` to the monitor and the interval.
pub fn on_key(key: Key, monitor: &Monitor, interval: &mut Duration) -> KeyAction {
    match key {
        Key::CtrlC | Key::Char('q') => KeyAction::Quit,
        Key::Char('a') => {
            let mode = monitor.toggle_view();
            log::debug!("view: {mode}");
            KeyAction::Repaint
        }
        Key::Char('c') if monitor.options().colorize => {
            monitor.toggle_color_debug();
            KeyAction::Repaint
        }
        Key::Char('+') => {
            *interval += INTERVAL_STEP;
            KeyAction::Repaint
        }
        Key::Char('-') => match interval.checked_sub(INTERVAL_STEP) {
            Some(shorter) if shorter >= MIN_INTERVAL => {
                *interval = shorter;
                KeyAction::Repaint
            }
            _ => KeyAction::Ignore,
        },
        _ => KeyAction::Ignore,
    }
}

/// Write one frame.
///
/// With a `header`, the frame repaints the screen from the top; `first`
/// also clears it. The legend line is written only when `legend` is set.
/// An `aux` block goes right under the header or after the last row.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn compose(
    w: &mut impl Write,
    frame: &Frame,
    header: Option<&str>,
    first: bool,
    legend: bool,
    aux: Option<&AuxBlock>,
) -> io::Result<()> {
    let full_screen = header.is_some();
    let (aux_before, aux_after) = match aux {
        Some(block) if block.before => (block.lines.as_slice(), &[][..]),
        Some(block) => (&[][..], block.lines.as_slice()),
        None => (&[][..], &[][..]),
    };
    if let Some(header) = header {
        if first {
            ansi::clear_screen(w)?;
        }
        ansi::cursor_home(w)?;
        write_line(w, header, full_screen)?;
    }
    for line in aux_before {
        write_line(w, line, full_screen)?;
    }
    if legend && !frame.legend.is_empty() {
        write_line(w, &frame.legend, full_screen)?;
    }
    for row in &frame.rows {
        write_line(w, row, full_screen)?;
    }
    for line in aux_after {
        write_line(w, line, full_screen)?;
    }
    if full_screen {
        ansi::clear_below(w)?;
    }
    Ok(())
}

fn write_line(w: &mut impl Write, text: &str, clear_tail: bool) -> io::Result<()> {
    w.write_all(text.as_bytes())?;
    if clear_tail {
        ansi::clear_line_right(w)?;
    }
    w.write_all(b"\n")
}

enum Flow {
    Continue,
    Quit,
}

/// Owns the monitor and the input and runs cycles until told to stop.
pub struct Driver {
    monitor: Monitor,
    source: Source,
    settings: Settings,
    timing: RollingMean,
    cmd_time: Option<Duration>,
    painted: bool,
    aux: Option<AuxCommand>,
    aux_block: Option<AuxBlock>,
}

impl Driver {
    #[must_use]
    pub fn new(monitor: Monitor, source: Source, settings: Settings) -> Self {
        Self {
            monitor,
            source,
            settings,
            timing: RollingMean::new(),
            cmd_time: None,
            painted: false,
            aux: None,
            aux_block: None,
        }
    }

    /// Run `aux` after every cycle and show its output with the frame.
    #[must_use]
    pub fn with_aux(mut self, aux: AuxCommand) -> Self {
        self.aux = Some(aux);
        self
    }

    /// Run until quit, end of input, or after one cycle with `--once`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up or stdout cannot
    /// be written.
    pub fn run(&mut self) -> anyhow::Result<()> {
        if self.settings.once {
            let batch = self.source.final_batch();
            self.cycle(&batch.lines, batch.elapsed)?;
            return Ok(());
        }

        let interactive = self.source.cmd().is_some() && terminal::is_tty();
        let mut guard = if interactive {
            Some(CbreakGuard::enter()?)
        } else {
            None
        };
        let mut keys = if interactive {
            Some(KeyReader::spawn()?)
        } else {
            None
        };

        let result = self.run_loop(keys.as_ref().map(|(_, rx)| rx));

        if let Some((reader, _)) = keys.as_mut() {
            reader.stop();
        }
        if let Some(g) = guard.as_mut() {
            g.leave()?;
        }
        result
    }

    fn run_loop(&mut self, keys: Option<&Receiver<Key>>) -> anyhow::Result<()> {
        loop {
            let batch = self.source.next_batch();
            self.cycle(&batch.lines, batch.elapsed)?;
            if batch.eof {
                return Ok(());
            }
            if let Flow::Quit = self.wait(keys)? {
                return Ok(());
            }
        }
    }

    fn cycle(&mut self, lines: &[String], elapsed: Option<Duration>) -> io::Result<()> {
        let started = Instant::now();
        self.monitor.run_cycle(lines.iter().map(String::as_str));
        self.timing.record(started.elapsed());
        self.cmd_time = elapsed;
        self.aux_block = self.aux.as_ref().map(AuxCommand::run);
        self.paint()
    }

    /// Wait out the interval, reacting to keys as they arrive.
    fn wait(&mut self, keys: Option<&Receiver<Key>>) -> io::Result<Flow> {
        let deadline = Instant::now() + self.settings.interval.max(MIN_TICK);
        let Some(rx) = keys else {
            self.source.wait(self.settings.interval.max(MIN_TICK));
            return Ok(Flow::Continue);
        };
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Flow::Continue);
            }
            match rx.recv_timeout(remaining.min(MIN_TICK)) {
                Ok(key) => match on_key(key, &self.monitor, &mut self.settings.interval) {
                    KeyAction::Quit => return Ok(Flow::Quit),
                    KeyAction::Repaint => self.paint()?,
                    KeyAction::Ignore => {}
                },
                Err(RecvTimeoutError::Timeout) => {
                    if self.source.wait(Duration::ZERO) {
                        return Ok(Flow::Continue);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.source.wait(remaining);
                    return Ok(Flow::Continue);
                }
            }
        }
    }

    fn paint(&mut self) -> io::Result<()> {
        let cols = usize::from(terminal::size_or_default().cols);
        let frame = self.monitor.render(cols);
        let header = self.settings.clear.then(|| self.header_line(cols));

        let stdout = io::stdout();
        let mut out = stdout.lock();
        compose(
            &mut out,
            &frame,
            header.as_deref(),
            !self.painted,
            self.monitor.options().colorize,
            self.aux_block.as_ref(),
        )?;
        out.flush()?;
        self.painted = true;
        Ok(())
    }

    fn header_line(&self, cols: usize) -> String {
        let left = header::left_text(self.source.watching(), self.settings.interval);
        let status = Status {
            custom: &self.settings.header,
            alt: self.monitor.view().mode().is_alt(),
            timestamp: header::timestamp(self.settings.utc),
            cmd_time: self.cmd_time,
            avg_ms: self.timing.mean_ms(),
            memory: stats::resident_mb().map(stats::format_memory),
        };
        header::header_line(&left, &status.to_string(), cols, self.settings.color_header)
    }
}
