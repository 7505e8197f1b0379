//! # pw-engine — Matching, transform, and layout core for patwatch
//!
//! One cycle of the watcher flows through these modules in order:
//!
//! - **[`catalog`]** — `PatternSpec` records parsed from a separator-delimited
//!   file; bad lines are skipped with a [`Diagnostic`](catalog::Diagnostic)
//! - **[`matcher`]** — line regex test, word extraction, `MatchContext`
//! - **[`template`]** — `\1`, `\g<name>` backreference substitution
//! - **[`pipeline`]** — `upper | first(3)` chains resolved to [`Func`] stages
//! - **[`state`]** — per-pattern `PatternState` and the cycle `Accumulator`
//! - **[`layout`]** — two-sided elision into a fixed column budget
//! - **[`view`]** — Normal/Alt projection into a [`Frame`]
//! - **[`monitor`]** — the lock between accumulating and rendering
//!
//! ```text
//! lines ──▶ matcher ──▶ pipeline ──▶ Accumulator ──swap──▶ Monitor
//!                                                            │
//!                                         toggle ──▶ ViewState
//!                                                            │
//!                                               render ──▶ Frame
//! ```
//!
//! Nothing here does I/O except [`Catalog::load`], and nothing in the cycle
//! path returns an error: bad input degrades to unchanged or empty output
//! plus a `log` diagnostic.

pub mod catalog;
pub mod error;
pub mod layout;
pub mod matcher;
pub mod monitor;
pub mod options;
pub mod pipeline;
pub mod state;
pub mod template;
pub mod view;

pub use catalog::{Catalog, PatternSpec};
pub use error::{CatalogError, StageError};
pub use matcher::{MatchContext, MatchResult};
pub use monitor::{CycleStats, Monitor};
pub use options::{EngineOptions, ViewMode};
pub use pipeline::{Func, Pipeline, apply_pipeline};
pub use state::{Accumulator, PatternState};
pub use view::{Frame, ViewState};
