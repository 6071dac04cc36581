//! Background Tasks Module
//!
//! Work that runs outside the caller's thread.
//!
//! # Tasks
//! - Expiry sweep: a dedicated thread per local store removing expired entries
//! - Async wrappers: cache calls submitted to tokio's blocking pool

mod async_cache;
mod sweeper;

pub use async_cache::AsyncCache;
pub use sweeper::{ExpirySweeper, Sweep, SHUTDOWN_GRACE};
