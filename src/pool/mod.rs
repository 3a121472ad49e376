//! Buffer pooling with workload-driven sizing.
//!
//! The pool watches the sizes of buffers returned to it and periodically
//! recalibrates how large fresh buffers start out and how large a buffer
//! may be before it is discarded instead of recycled.

mod calibrated;
mod histogram;

pub use calibrated::{get, pool, put, CalibratedPool, PoolStats, PooledBuffer};
