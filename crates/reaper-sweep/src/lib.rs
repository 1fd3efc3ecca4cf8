//! reaper-sweep — one pass over every in-scope notebook instance.
//!
//! ```text
//! Reaper::run
//!   ├── enumerate::active_projects
//!   │   └── enumerate::locations_in_scope   (region allow-list)
//!   │       └── enumerate::instances
//!   │           ├── IdlePolicy::decide
//!   │           └── dispatch::stop          (only on Decision::Stop)
//!   └── SweepReport { results, summary }
//! ```
//!
//! The walk is strictly sequential. A failed listing empties that scope
//! and the walk moves on; a failed stop is recorded against the instance.
//! Only authentication failures abort the sweep.

pub mod dispatch;
pub mod enumerate;
pub mod error;
pub mod reaper;

pub use error::SweepError;
pub use reaper::{Reaper, SweepReport, SweepSummary};
