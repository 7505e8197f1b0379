// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Background key reader.
//
// A dedicated thread polls stdin and forwards decoded keypresses through a
// channel, so the cycle driver can wait on `recv_timeout()` for "next key or
// next refresh, whichever comes first".
//
// Shutdown: the thread uses `poll()` with a short timeout on stdin's file
// descriptor and checks an `AtomicBool` stop flag between polls, so it never
// sits in a blocking `read()` when asked to exit.
//
// Only single-byte keys matter to the watcher. Escape sequences (arrows,
// function keys) decode to `Key::Other` and are ignored by the driver.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

const READ_BUF_SIZE: usize = 64;

/// How often the reader thread checks the stop flag (milliseconds).
const POLL_TIMEOUT_MS: i32 = 50;

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Ctrl-C (ETX). Arrives as a byte because cbreak mode disables ISIG.
    CtrlC,
    /// Anything else: control bytes, escape sequences, invalid UTF-8.
    Other,
}

/// Decode a chunk of raw stdin bytes into keys.
///
/// An ESC byte swallows the rest of the chunk: a terminal delivers an
/// escape sequence in one write, and none of them are bound.
///
/// # Examples
///
/// ```
/// use pw_term::reader::{decode, Key};
///
/// assert_eq!(decode(b"a+"), vec![Key::Char('a'), Key::Char('+')]);
/// assert_eq!(decode(b"\x03"), vec![Key::CtrlC]);
/// ```
#[must_use]
pub fn decode(bytes: &[u8]) -> Vec<Key> {
    let mut keys = Vec::with_capacity(bytes.len());
    let text = String::from_utf8_lossy(bytes);
    for ch in text.chars() {
        match ch {
            '\x03' => keys.push(Key::CtrlC),
            '\x1b' => {
                keys.push(Key::Other);
                break;
            }
            c if c.is_control() || c == char::REPLACEMENT_CHARACTER => keys.push(Key::Other),
            c => keys.push(Key::Char(c)),
        }
    }
    keys
}

/// Background key reader thread.
///
/// The thread runs until [`stop`](Self::stop) is called, the
/// `KeyReader` is dropped, or stdin reaches EOF.
pub struct KeyReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl KeyReader {
    /// Spawn the background reader thread.
    ///
    /// Returns the reader handle and a channel receiver for keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot spawn a new thread.
    pub fn spawn() -> io::Result<(Self, Receiver<Key>)> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("key-reader".into())
            .spawn(move || {
                Self::reader_loop(&tx, &stop_flag);
            })?;

        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        ))
    }

    /// Signal the reader thread to stop and wait for it to exit.
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    #[cfg(unix)]
    fn reader_loop(tx: &Sender<Key>, stop: &AtomicBool) {
        use std::os::unix::io::AsRawFd;

        let stdin_fd = io::stdin().as_raw_fd();
        let mut buf = [0u8; READ_BUF_SIZE];

        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }

            let ready = unsafe {
                let mut pfd = libc::pollfd {
                    fd: stdin_fd,
                    events: libc::POLLIN,
                    revents: 0,
                };
                libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
            };

            if ready <= 0 {
                continue;
            }

            let n = unsafe { libc::read(stdin_fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n <= 0 {
                break;
            }

            #[allow(clippy::cast_sign_loss)] // n > 0 guaranteed above.
            let chunk = &buf[..n as usize];

            for key in decode(chunk) {
                if tx.send(key).is_err() {
                    return;
                }
            }
        }
    }

    #[cfg(not(unix))]
    fn reader_loop(tx: &Sender<Key>, stop: &AtomicBool) {
        use std::io::Read;

        let stdin = std::io::stdin();
        let mut buf = [0u8; READ_BUF_SIZE];

        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }

            match stdin.lock().read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    for key in decode(&buf[..n]) {
                        if tx.send(key).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
