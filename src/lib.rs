//! Self-calibrating byte buffer pool.
//!
//! Recycles variable-length byte buffers to cut allocator pressure in
//! append-heavy workloads. The pool observes the distribution of buffer
//! sizes flowing through it and periodically recalibrates both the
//! capacity of fresh allocations and the largest buffer worth retaining.
//!
//! ```
//! let mut buf = bytepool::get();
//! buf.append(b"staged output");
//! assert_eq!(buf.len(), 13);
//! bytepool::put(buf);
//! ```

pub mod buffer;
pub mod pool;

pub use buffer::ByteBuffer;
pub use pool::{get, pool, put, CalibratedPool, PoolStats, PooledBuffer};
