//! # slotpool
//!
//! Fixed-block memory pool allocator: one backing buffer carved into
//! equal-sized slots, with deterministic, low-overhead allocation for many
//! same-sized objects.
//!
//! The crate provides:
//! - Single-slot allocation and free over an address-ordered free list
//! - Contiguous-run allocation ("array" requests spanning several slots)
//! - An optional multi-level free index (skip acceleration) for sub-linear
//!   insertion and run removal on large pools
//! - Growable pools that transparently add a backing region on exhaustion
//! - A mutex-guarded facade for multi-threaded use and an RAII typed handle
//!
//! ## Quick start
//!
//! ```rust
//! use slotpool::{PoolConfig, SlotPool};
//!
//! # fn main() -> slotpool::PoolResult<()> {
//! let config = PoolConfig {
//!     capacity: 256,
//!     support_runs: true,
//!     ..Default::default()
//! };
//! let mut pool = SlotPool::for_type::<[u8; 32]>(config)?;
//!
//! let single = pool.allocate(32)?;
//! let run = pool.allocate(4 * 32)?; // four contiguous slots
//!
//! pool.free(run.as_ptr())?;
//! pool.free(single.as_ptr())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - Free slots are tracked by index into the backing regions, never by
//!   reinterpreting slot bytes as link records; see [`pool`]
//! - Errors are plain values via [`error::PoolError`]; exhaustion is the
//!   only retryable condition
//! - Structured logging goes through `tracing`; the library installs no
//!   subscriber

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Slot ids are u32 by design; widening/narrowing casts are reviewed per-site
#![allow(clippy::cast_possible_truncation)]
// Struct bool fields are configuration — splitting is over-engineering
#![allow(clippy::struct_excessive_bools)]

pub mod config;
pub mod error;
pub mod pool;
pub mod stats;
pub mod util;

pub use crate::config::{MAX_INDEX_LEVELS, PoolConfig};
pub use crate::error::{PoolError, PoolResult};
pub use crate::pool::{PoolBox, SharedSlotPool, SlotPool};
pub use crate::stats::StatsSnapshot;

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::config::PoolConfig;
    pub use crate::error::{PoolError, PoolResult};
    pub use crate::pool::{PoolBox, SharedSlotPool, SlotPool};
    pub use crate::stats::StatsSnapshot;
}
