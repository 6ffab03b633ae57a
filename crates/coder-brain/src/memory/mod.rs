//! Two-tier agent memory.
//!
//! - [`working`]: [`WorkingMemory`], a fixed-capacity window of
//!   [`FileContext`] values currently in attention. Oldest entries are
//!   evicted first.
//! - [`long_term`]: [`LongTermMemory`], process-lifetime maps of file and
//!   module summaries plus an append-only decision log.
//!
//! Neither tier outlives the process.

pub mod long_term;
pub mod working;

pub use long_term::{Decision, LongTermMemory};
pub use working::{DEFAULT_WORKING_MEMORY_CAPACITY, FileContext, WorkingMemory};
