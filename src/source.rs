// SPDX-License-Identifier: MIT
//
// Where each cycle's input lines come from.
//
// Three sources:
//
//   Continuous  `<shell> -c CMD` runs in the background and each cycle sees
//               what the current run has printed so far. When the run ends
//               its output is shown once more and the command starts again
//               on the next cycle. Until a new run prints anything, the
//               previous run's output stands in.
//
//   Iterative   `<shell> -c CMD` is run to completion once per cycle. Its
//               stdout is the cycle's input.
//
//   Stream      A background thread reads lines from stdin (or any reader)
//               into a shared buffer. Each cycle sees everything received
//               so far. End of input is signaled over a channel so the
//               driver can stop waiting as soon as the stream closes.
//
// With a timeout a command run is killed when the time is up and whatever
// it printed so far is kept. Output is decoded lossily: one invalid UTF-8
// byte must not hide the rest of a command's output.

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::header::Watching;

/// How often a command with a timeout is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How often a continuous run is checked while the driver waits.
const RUN_POLL: Duration = Duration::from_millis(50);

/// After a continuous run exits, how long its stdout may stay open (held by
/// a background grandchild) before the run counts as over anyway.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// A continuous run keeps at most this many lines; past it, all but the
/// newest [`RUN_LINES_KEPT`] are dropped.
pub const RUN_LINE_CAP: usize = 1000;

/// Lines left after a continuous run overflows [`RUN_LINE_CAP`].
pub const RUN_LINES_KEPT: usize = 500;

type Lines = Arc<Mutex<Vec<String>>>;

/// One cycle's input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub lines: Vec<String>,

    /// No more input will ever arrive.
    pub eof: bool,

    /// How long the command took, for command sources. For a run still in
    /// progress, how long it has been running.
    pub elapsed: Option<Duration>,
}

// ─── Line collection ────────────────────────────────────────────────────────

/// Read `reader` to the end, pushing each line (without its terminator)
/// into `sink` as it arrives. With a `cap`, the sink is cut back to its
/// newest [`RUN_LINES_KEPT`] lines whenever it grows past `cap`.
fn collect_lines(reader: impl Read, sink: &Mutex<Vec<String>>, cap: Option<usize>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let mut lines = sink.lock();
                lines.push(String::from_utf8_lossy(&buf).into_owned());
                if cap.is_some_and(|cap| lines.len() > cap) {
                    let excess = lines.len().saturating_sub(RUN_LINES_KEPT);
                    lines.drain(..excess);
                }
            }
        }
    }
}

fn spawn_collector<R: Read + Send + 'static>(
    name: &str,
    reader: R,
    sink: Lines,
    cap: Option<usize>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.into())
        .spawn(move || collect_lines(reader, &sink, cap))
}

// ─── Command ────────────────────────────────────────────────────────────────

/// Result of one command run.
#[derive(Debug)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    pub elapsed: Duration,

    /// `None` if the process could not be reaped after a kill.
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
}

/// A started `<shell> -c CMD` and the threads reading its output.
struct Spawned {
    child: Child,
    out: Lines,
    err: Lines,
    stdout: Option<JoinHandle<()>>,
    stderr: Option<JoinHandle<()>>,
}

impl Spawned {
    /// Whether stdout has reached end of file.
    fn drained(&self) -> bool {
        self.stdout.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Join the readers. With `only_finished`, readers still blocked (a
    /// grandchild may hold the pipe) are left detached.
    fn join_readers(&mut self, only_finished: bool) {
        for slot in [&mut self.stdout, &mut self.stderr] {
            if only_finished && !slot.as_ref().is_some_and(JoinHandle::is_finished) {
                continue;
            }
            if let Some(reader) = slot.take() {
                let _ = reader.join();
            }
        }
    }
}

/// `<shell> -c CMD`.
#[derive(Debug, Clone)]
pub struct CommandSource {
    shell: PathBuf,
    cmd: String,
    timeout: Option<Duration>,
    quiet: bool,
}

impl CommandSource {
    /// `quiet` discards the command's stderr and its exit warnings.
    #[must_use]
    pub fn new(
        shell: impl Into<PathBuf>,
        cmd: impl Into<String>,
        timeout: Option<Duration>,
        quiet: bool,
    ) -> Self {
        Self {
            shell: shell.into(),
            cmd: cmd.into(),
            timeout,
            quiet,
        }
    }

    #[must_use]
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    #[must_use]
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    fn spawn(&self, cap: Option<usize>) -> io::Result<Spawned> {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(&self.cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if self.quiet {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .spawn()?;

        let out: Lines = Arc::default();
        let err: Lines = Arc::default();
        let stdout = match child.stdout.take() {
            Some(pipe) => Some(spawn_collector("cmd-stdout", pipe, Arc::clone(&out), cap)?),
            None => None,
        };
        let stderr = match child.stderr.take() {
            Some(pipe) => Some(spawn_collector("cmd-stderr", pipe, Arc::clone(&err), None)?),
            None => None,
        };
        Ok(Spawned {
            child,
            out,
            err,
            stdout,
            stderr,
        })
    }

    /// Log the command's stderr and how it ended.
    fn report(&self, err: &Lines, status: Option<ExitStatus>, timed_out: bool, elapsed: Duration) {
        if self.quiet {
            return;
        }
        for line in err.lock().iter().filter(|l| !l.trim().is_empty()) {
            log::warn!("{}: {line}", self.cmd);
        }
        if timed_out {
            log::warn!("command timed out after {:.1}s: {}", elapsed.as_secs_f64(), self.cmd);
        } else if let Some(status) = status.filter(|s| !s.success()) {
            log::warn!("command {status}: {}", self.cmd);
        }
    }

    /// Run the command once, to completion or timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be spawned or waited on.
    pub fn run(&self) -> io::Result<CommandOutput> {
        let started = Instant::now();
        let mut spawned = self.spawn(None)?;

        let (status, timed_out) = wait_with_timeout(&mut spawned.child, self.timeout)?;
        let elapsed = started.elapsed();

        // After a kill, a grandchild may still hold the pipes open. Keep
        // what has arrived and leave the readers detached.
        spawned.join_readers(timed_out);
        self.report(&spawned.err, status, timed_out, elapsed);

        let lines = std::mem::take(&mut *spawned.out.lock());
        Ok(CommandOutput {
            lines,
            elapsed,
            status,
            timed_out,
        })
    }

    /// [`run`](Self::run) as a batch. A command that cannot be run yields
    /// an empty batch and an error in the log.
    fn batch(&self) -> Batch {
        match self.run() {
            Ok(out) => Batch {
                lines: out.lines,
                eof: false,
                elapsed: Some(out.elapsed),
            },
            Err(e) => {
                self.spawn_failed(&e);
                Batch::default()
            }
        }
    }

    fn spawn_failed(&self, e: &io::Error) {
        log::error!("cannot run '{}' with {}: {e}", self.cmd, self.shell.display());
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> io::Result<(Option<ExitStatus>, bool)> {
    let Some(limit) = timeout else {
        return child.wait().map(|s| (Some(s), false));
    };
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((Some(status), false));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            return Ok((child.wait().ok(), true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// ─── Continuous ─────────────────────────────────────────────────────────────

/// One background run of a continuous command.
struct Run {
    spawned: Spawned,
    started: Instant,
    deadline: Option<Instant>,
    exited_at: Option<Instant>,
    status: Option<ExitStatus>,
    timed_out: bool,
    over: bool,
}

impl Run {
    fn start(command: &CommandSource) -> io::Result<Self> {
        let spawned = command.spawn(Some(RUN_LINE_CAP))?;
        let started = Instant::now();
        Ok(Self {
            spawned,
            started,
            deadline: command.timeout.map(|limit| started + limit),
            exited_at: None,
            status: None,
            timed_out: false,
            over: false,
        })
    }

    /// Check on the process. Returns whether the run is over: stdout closed
    /// after exit, the drain grace ran out, or the timeout killed it. Once
    /// over, always over.
    fn poll(&mut self) -> bool {
        if self.over {
            return true;
        }
        let now = Instant::now();
        if self.exited_at.is_none() {
            match self.spawned.child.try_wait() {
                Ok(Some(status)) => {
                    self.status = Some(status);
                    self.exited_at = Some(now);
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("cannot check on command: {e}");
                    self.exited_at = Some(now);
                }
            }
        }
        if let Some(at) = self.exited_at {
            self.over = self.spawned.drained() || now.duration_since(at) >= DRAIN_GRACE;
        } else if self.deadline.is_some_and(|d| now >= d) {
            self.kill();
            self.timed_out = true;
        }
        self.over
    }

    fn kill(&mut self) {
        let _ = self.spawned.child.kill();
        self.status = self.spawned.child.wait().ok();
        self.over = true;
    }

    /// Sleep up to `d`, waking early when the run ends.
    fn sleep(&mut self, d: Duration) -> bool {
        let until = Instant::now() + d;
        loop {
            if self.poll() {
                return true;
            }
            let left = until.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            thread::sleep(left.min(RUN_POLL));
        }
    }

    fn lines(&self) -> Vec<String> {
        self.spawned.out.lock().clone()
    }
}

impl Drop for Run {
    fn drop(&mut self) {
        if !self.over {
            self.kill();
        }
    }
}

/// `<shell> -c CMD` kept running in the background and started again each
/// time it ends.
pub struct ContinuousSource {
    command: CommandSource,
    run: Option<Run>,

    /// Output of the last run that ended.
    last: Vec<String>,
}

impl ContinuousSource {
    #[must_use]
    pub const fn new(command: CommandSource) -> Self {
        Self {
            command,
            run: None,
            last: Vec::new(),
        }
    }

    #[must_use]
    pub fn cmd(&self) -> &str {
        self.command.cmd()
    }

    /// The current run, starting one if none is in progress.
    fn current(&mut self) -> Option<Run> {
        if let Some(run) = self.run.take() {
            return Some(run);
        }
        match Run::start(&self.command) {
            Ok(run) => {
                log::debug!("started: {}", self.command.cmd());
                Some(run)
            }
            Err(e) => {
                self.command.spawn_failed(&e);
                None
            }
        }
    }

    /// What the current run has printed so far, or its full output once it
    /// has ended. The next call after an ended run starts a new one.
    pub fn next_batch(&mut self) -> Batch {
        let Some(mut run) = self.current() else {
            return Batch {
                lines: self.last.clone(),
                ..Batch::default()
            };
        };
        if run.poll() {
            return self.finish(run);
        }
        let mut lines = run.lines();
        if lines.is_empty() {
            lines.clone_from(&self.last);
        }
        let elapsed = run.started.elapsed();
        self.run = Some(run);
        Batch {
            lines,
            eof: false,
            elapsed: Some(elapsed),
        }
    }

    /// Let the current run end (or time out) and return its full output.
    pub fn final_batch(&mut self) -> Batch {
        let Some(mut run) = self.current() else {
            return Batch::default();
        };
        while !run.sleep(Duration::from_secs(3600)) {}
        self.finish(run)
    }

    /// Sleep up to `d`. Returns early, with `true`, when the current run
    /// ends.
    pub fn wait(&mut self, d: Duration) -> bool {
        match self.run.as_mut() {
            Some(run) => run.sleep(d),
            None => {
                thread::sleep(d);
                false
            }
        }
    }

    fn finish(&mut self, mut run: Run) -> Batch {
        let elapsed = run.started.elapsed();
        run.spawned.join_readers(true);
        self.command
            .report(&run.spawned.err, run.status, run.timed_out, elapsed);
        let lines = std::mem::take(&mut *run.spawned.out.lock());
        self.last.clone_from(&lines);
        Batch {
            lines,
            eof: false,
            elapsed: Some(elapsed),
        }
    }
}

// ─── Stream ─────────────────────────────────────────────────────────────────

/// Lines accumulated from a long-lived reader.
pub struct StreamSource {
    lines: Lines,
    eof: Arc<AtomicBool>,
    eof_rx: Receiver<()>,
}

impl StreamSource {
    /// Read standard input in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader thread cannot be spawned.
    pub fn stdin() -> io::Result<Self> {
        Self::spawn(io::stdin())
    }

    /// Read `reader` in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader thread cannot be spawned.
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> io::Result<Self> {
        let lines: Lines = Arc::default();
        let eof = Arc::new(AtomicBool::new(false));
        let (tx, eof_rx) = mpsc::channel();

        let sink = Arc::clone(&lines);
        let flag = Arc::clone(&eof);
        thread::Builder::new()
            .name("input-reader".into())
            .spawn(move || {
                collect_lines(reader, &sink, None);
                flag.store(true, Ordering::Release);
                let _ = tx.send(());
            })?;

        Ok(Self { lines, eof, eof_rx })
    }

    /// Whether the reader has hit end of input.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof.load(Ordering::Acquire)
    }

    /// Everything received so far.
    ///
    /// The EOF flag is read before the lines, so a batch marked `eof`
    /// always holds the complete input.
    #[must_use]
    pub fn batch(&self) -> Batch {
        let eof = self.is_eof();
        Batch {
            lines: self.lines.lock().clone(),
            eof,
            elapsed: None,
        }
    }

    /// Sleep up to `d`, waking early at end of input. Returns whether
    /// input has ended.
    pub fn wait(&self, d: Duration) -> bool {
        if self.is_eof() {
            return true;
        }
        match self.eof_rx.recv_timeout(d) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Block until end of input.
    pub fn wait_eof(&self) {
        while !self.wait(Duration::from_secs(3600)) {}
    }
}

// ─── Aux ────────────────────────────────────────────────────────────────────

/// What `--auxcmd` adds to a frame: the separator lines, then the
/// command's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxBlock {
    pub lines: Vec<String>,

    /// Shown above the rows instead of below.
    pub before: bool,
}

/// A second command run once per cycle, its output shown with the frame
/// but never matched.
#[derive(Debug, Clone)]
pub struct AuxCommand {
    command: CommandSource,
    sep: String,
    before: bool,
}

impl AuxCommand {
    /// `sep` is printed between the rows and the output, already decoded.
    /// A trailing newline on it is implied.
    #[must_use]
    pub fn new(command: CommandSource, sep: impl Into<String>, before: bool) -> Self {
        Self {
            command,
            sep: sep.into(),
            before,
        }
    }

    /// Run the command and assemble its block. A command that cannot be
    /// run contributes only the separator and an empty line.
    #[must_use]
    pub fn run(&self) -> AuxBlock {
        let output = match self.command.run() {
            Ok(out) => out.lines,
            Err(e) => {
                self.command.spawn_failed(&e);
                Vec::new()
            }
        };
        self.block(output)
    }

    fn block(&self, output: Vec<String>) -> AuxBlock {
        let sep = self.sep.strip_suffix('\n').unwrap_or(&self.sep);
        let mut lines: Vec<String> = sep.split('\n').map(str::to_owned).collect();
        if output.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(output);
        }
        AuxBlock {
            lines,
            before: self.before,
        }
    }
}

// ─── Source ─────────────────────────────────────────────────────────────────

pub enum Source {
    Continuous(ContinuousSource),
    Iterative(CommandSource),
    Stream(StreamSource),
}

impl Source {
    /// The command being watched, if any.
    #[must_use]
    pub fn cmd(&self) -> Option<&str> {
        match self {
            Self::Continuous(c) => Some(c.cmd()),
            Self::Iterative(c) => Some(c.cmd()),
            Self::Stream(_) => None,
        }
    }

    /// What the header names as being watched.
    #[must_use]
    pub fn watching(&self) -> Watching<'_> {
        match self {
            Self::Continuous(c) => Watching::Continuous(c.cmd()),
            Self::Iterative(c) => Watching::Iterative(c.cmd()),
            Self::Stream(_) => Watching::Stdin,
        }
    }

    /// Input for the next cycle. A command that cannot be run yields an
    /// empty batch and an error in the log.
    pub fn next_batch(&mut self) -> Batch {
        match self {
            Self::Continuous(c) => c.next_batch(),
            Self::Iterative(c) => c.batch(),
            Self::Stream(s) => s.batch(),
        }
    }

    /// Input for a single `--once` cycle: a stream is read to the end and
    /// a continuous command is left to finish.
    pub fn final_batch(&mut self) -> Batch {
        match self {
            Self::Continuous(c) => c.final_batch(),
            Self::Iterative(c) => c.batch(),
            Self::Stream(s) => {
                s.wait_eof();
                s.batch()
            }
        }
    }

    /// Sleep up to `d` between cycles. Returns `true` when it woke early
    /// because there is something new to show: a stream ended or a
    /// continuous run finished.
    pub fn wait(&mut self, d: Duration) -> bool {
        match self {
            Self::Continuous(c) => c.wait(d),
            Self::Iterative(_) => {
                thread::sleep(d);
                false
            }
            Self::Stream(s) => s.wait(d),
        }
    }
}
