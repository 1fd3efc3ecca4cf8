//! reaper-core — shared vocabulary for idlereaper.
//!
//! Holds the domain types returned by the Google APIs (projects,
//! locations, notebook instances, stop outcomes), the `ReaperConfig`
//! assembled once at startup, and the `Clock` seam the sweep reads
//! "now" from.
//!
//! Nothing in this crate performs I/O besides reading an optional
//! TOML config file.

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Endpoints, NotebookTransport, ProjectScope, ReaperConfig, RegionMatch};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
