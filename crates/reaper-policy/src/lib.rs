//! reaper-policy — the idle-shutdown decision rules.
//!
//! Pure functions over one instance at a time: no I/O, no cross-instance
//! state. The sweep feeds each enumerated instance through
//! [`IdlePolicy::decide`] and each enumerated location through
//! [`RegionFilter::in_scope`].
//!
//! # Decision
//!
//! ```text
//! threshold = metadata[key] as non-negative integer   (else Skip: not opted in)
//! state     == ACTIVE                                 (else Skip: not active)
//! delta     = now - updateTime   (fractional seconds, "Z" read as +00:00)
//!
//! delta <  0          → Skip (clock skew; never stops, even with threshold 0)
//! delta <  threshold  → Skip (below threshold)
//! otherwise           → Stop
//! ```

pub mod idle;
pub mod region;
pub mod timestamp;

pub use idle::{Decision, IdlePolicy, SkipReason};
pub use region::RegionFilter;
pub use timestamp::{elapsed_seconds, normalize_utc_designator, parse_update_time};
