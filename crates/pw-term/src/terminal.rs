// SPDX-License-Identifier: MIT
//
// Terminal control: size query, TTY detection, cbreak input mode.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control. Each unsafe block is
// minimal.
#![allow(unsafe_code)]
//
// The watcher does not take over the screen the way a full-screen editor
// does. Output stays line-oriented (OPOST is left on, so "\n" still means
// CR LF) and there is no alternate screen. What it needs from the terminal
// is single-key input without echo: cbreak mode. ICANON and ECHO go off,
// ISIG stays off too so Ctrl-C arrives as a byte the driver can treat as a
// clean quit instead of a signal that skips cleanup.
//
// The panic hook writes a small restore sequence straight to fd 1 and puts
// the saved termios back, then delegates to the original handler so the
// message lands on a usable terminal.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Size assumed when stdout is not a terminal.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

impl Default for Size {
    fn default() -> Self {
        Self::FALLBACK
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)` on stdout.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// [`get_size`], falling back to [`Size::FALLBACK`].
#[must_use]
pub fn size_or_default() -> Size {
    get_size().unwrap_or_default()
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the original termios for panic recovery.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Reset SGR attributes and show the cursor.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h";

static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write [`EMERGENCY_RESTORE`] directly to stdout's file descriptor,
/// bypassing the `io::stdout()` lock.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Cbreak Guard ───────────────────────────────────────────────────────────

/// RAII guard for cbreak input mode.
///
/// While alive, stdin delivers single keypresses without echo and the
/// cursor is hidden. Dropping the guard restores the saved termios and
/// shows the cursor again. When stdin is not a terminal the guard is
/// inert.
///
/// # Example
///
/// ```no_run
/// use pw_term::terminal::CbreakGuard;
///
/// let guard = CbreakGuard::enter()?;
/// // ... read keys, paint frames ...
/// drop(guard);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct CbreakGuard {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    active: bool,
}

impl CbreakGuard {
    /// Switch stdin to cbreak mode and hide the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if termios cannot be read or written, or if the
    /// cursor-hide sequence cannot be flushed.
    pub fn enter() -> io::Result<Self> {
        let mut guard = Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        };

        if !is_tty() {
            return Ok(guard);
        }

        install_panic_hook();
        guard.enable_cbreak()?;
        guard.active = true;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::cursor_hide(&mut lock)?;
        lock.flush()?;

        Ok(guard)
    }

    /// Whether cbreak mode is actually in effect.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Restore the terminal. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the restore sequence or termios write fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::reset(&mut lock)?;
        ansi::cursor_show(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_cbreak()?;
        self.active = false;
        Ok(())
    }

    #[cfg(unix)]
    fn enable_cbreak(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            termios.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG);
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSADRAIN, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_cbreak(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_cbreak(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSADRAIN, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_cbreak(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for CbreakGuard {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
