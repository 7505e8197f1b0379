//! The shared owner of cycle state.
//!
//! A [`Monitor`] holds the catalog, the options, and behind one lock the
//! latest complete [`Accumulator`] together with the [`ViewState`] and the
//! [`ColorAllocator`]. A cycle accumulates into a private accumulator with
//! no lock held and swaps the finished result in, so a render always sees
//! one whole cycle and never a partial one.
//!
//! ```text
//!  input thread            key thread
//!       │                       │
//!  run_cycle(lines)        toggle_view()
//!       │  accumulate            │
//!       │  (unlocked)            │
//!       ▼                        ▼
//!   ┌──────────── Mutex<Shared> ────────────┐
//!   │ snapshot   view   allocator           │
//!   └───────────────────────────────────────┘
//!                    │
//!               render(cols) → Frame
//! ```

use parking_lot::Mutex;
use pw_theme::ColorAllocator;

use crate::catalog::Catalog;
use crate::options::{EngineOptions, ViewMode};
use crate::state::Accumulator;
use crate::view::{self, Frame, ViewState};

struct Shared {
    snapshot: Accumulator,
    view: ViewState,
    allocator: ColorAllocator,
    cycles: u64,
}

/// Counts from the latest completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleStats {
    /// Input lines processed.
    pub lines: usize,

    /// Pattern matches, summed over all patterns.
    pub matches: usize,

    /// Cycles completed since the monitor was created.
    pub cycles: u64,
}

/// Catalog plus the latest cycle snapshot, safe to share between threads.
pub struct Monitor {
    catalog: Catalog,
    opts: EngineOptions,
    shared: Mutex<Shared>,
}

impl Monitor {
    #[must_use]
    pub fn new(catalog: Catalog, opts: EngineOptions) -> Self {
        Self::with_allocator(catalog, opts, ColorAllocator::default())
    }

    /// Monitor drawing colors from `allocator`.
    #[must_use]
    pub fn with_allocator(catalog: Catalog, opts: EngineOptions, allocator: ColorAllocator) -> Self {
        let shared = Shared {
            snapshot: Accumulator::new(&catalog),
            view: ViewState::new(opts.initial_view),
            allocator,
            cycles: 0,
        };
        Self {
            catalog,
            opts,
            shared: Mutex::new(shared),
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.opts
    }

    /// Process one cycle's lines and publish the result.
    ///
    /// Matching runs without the lock; only the final swap excludes
    /// renders.
    pub fn run_cycle<'l>(&self, lines: impl IntoIterator<Item = &'l str>) -> CycleStats {
        let acc = Accumulator::from_lines(&self.catalog, lines, &self.opts);
        let lines = acc.lines();
        let matches = acc.states().iter().map(|s| s.count()).sum();

        let cycles = {
            let mut shared = self.shared.lock();
            shared.snapshot = acc;
            shared.cycles += 1;
            shared.cycles
        };
        log::debug!("cycle {cycles}: {lines} lines, {matches} matches");
        CycleStats {
            lines,
            matches,
            cycles,
        }
    }

    /// Flip Normal/Alt. Nothing is re-matched.
    pub fn toggle_view(&self) -> ViewMode {
        self.shared.lock().view.toggle()
    }

    /// Flip color-debug.
    pub fn toggle_color_debug(&self) -> bool {
        self.shared.lock().view.toggle_color_debug()
    }

    #[must_use]
    pub fn view(&self) -> ViewState {
        self.shared.lock().view
    }

    /// Copy of the latest complete cycle.
    #[must_use]
    pub fn snapshot(&self) -> Accumulator {
        self.shared.lock().snapshot.clone()
    }

    /// Render the latest cycle for a terminal `cols` wide.
    #[must_use]
    pub fn render(&self, cols: usize) -> Frame {
        let mut guard = self.shared.lock();
        let Shared {
            snapshot,
            view,
            allocator,
            ..
        } = &mut *guard;
        view::render_frame(snapshot.states(), *view, &self.opts, cols, allocator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    const CATALOG: &str = "\
# users and their upper-cased form
USER\tlogin\tuser=(\\w+)\t\tupper
ERR\tERROR
";

    fn monitor(opts: EngineOptions) -> Monitor {
        let catalog = Catalog::parse(CATALOG, &opts);
        Monitor::new(catalog, opts)
    }

    // ── Cycles ──────────────────────────────────────────────────────

    #[test]
    fn starts_empty() {
        let m = monitor(EngineOptions::default());
        let frame = m.render(80);
        assert_eq!(frame.rows, vec!["USER\t0\t", "ERR\t0\t"]);
        assert_eq!(frame.legend, "");
    }

    #[test]
    fn cycle_replaces_previous() {
        let m = monitor(EngineOptions::default());
        m.run_cycle(["login user=bob", "ERROR disk"]);
        let stats = m.run_cycle(["login user=amy"]);
        assert_eq!(
            stats,
            CycleStats {
                lines: 1,
                matches: 1,
                cycles: 2
            }
        );
        let frame = m.render(80);
        assert_eq!(frame.rows, vec!["USER\t1\tamy", "ERR\t0\t"]);
        assert_eq!(frame.legend, "amy");
    }

    #[test]
    fn initial_view_from_options() {
        let m = monitor(EngineOptions {
            initial_view: ViewMode::Alt,
            ..EngineOptions::default()
        });
        m.run_cycle(["login user=bob"]);
        assert_eq!(m.view().mode(), ViewMode::Alt);
        assert_eq!(m.render(80).rows[0], "USER\t1\tBOB");
    }

    // ── View toggling ───────────────────────────────────────────────

    #[test]
    fn scenario_e_double_toggle_is_identity() {
        let m = monitor(EngineOptions {
            colorize: true,
            ..EngineOptions::default()
        });
        m.run_cycle(["login user=bob", "login user=amy", "ERROR disk-full"]);
        let before = m.render(60);

        assert_eq!(m.toggle_view(), ViewMode::Alt);
        let alt = m.render(60);
        assert_ne!(alt, before);

        assert_eq!(m.toggle_view(), ViewMode::Normal);
        assert_eq!(m.render(60), before);
    }

    #[test]
    fn toggle_does_not_rematch() {
        let m = monitor(EngineOptions::default());
        m.run_cycle(["login user=bob"]);
        let snap = m.snapshot();
        m.toggle_view();
        assert_eq!(m.snapshot(), snap);
        assert_eq!(m.render(80).rows[0], "USER\t1\tBOB");
    }

    #[test]
    fn color_debug_toggle() {
        let m = monitor(EngineOptions::default());
        assert!(m.toggle_color_debug());
        assert!(m.view().color_debug());
        assert!(!m.toggle_color_debug());
    }

    // ── Concurrency ─────────────────────────────────────────────────

    #[test]
    fn renders_never_see_partial_cycles() {
        let m = Arc::new(monitor(EngineOptions::default()));
        let lines: Vec<String> = (0..200).map(|i| format!("login user=u{i}")).collect();

        let writer = {
            let m = Arc::clone(&m);
            thread::spawn(move || {
                for _ in 0..20 {
                    m.run_cycle(lines.iter().map(String::as_str));
                }
            })
        };

        for _ in 0..50 {
            let frame = m.render(200);
            let count = frame.rows[0].split('\t').nth(1).unwrap().to_owned();
            assert!(count == "0" || count == "200", "partial cycle: {count}");
            m.toggle_view();
        }
        writer.join().unwrap();
        assert_eq!(m.snapshot().lines(), 200);
    }
}
