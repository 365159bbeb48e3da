//! Worker-runtime boundary: dedicated OS threads for long-running consume
//! loops.

pub mod worker_runtime;
