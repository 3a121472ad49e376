//! Self-calibrating buffer pool.
//!
//! The pool recycles [`ByteBuffer`]s through a lock-free queue and keeps a
//! histogram of the lengths returned to it. Once a size class has absorbed
//! enough returns, a calibration pass recomputes how large fresh buffers
//! start out and how large a buffer may grow before recycling it stops
//! paying for itself.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;
use tracing::debug;

use super::histogram::{SizeHistogram, STEPS};
use crate::buffer::ByteBuffer;

/// Idle buffers kept per pool.
const CACHE_SLOTS: usize = 256;

/// Per-class return count that triggers a recalibration.
const CALIBRATE_CALLS_THRESHOLD: u64 = 42_000;

/// Share of observed returns the retention ceiling must cover.
const MAX_PERCENTILE: f64 = 0.95;

/// Global default pool.
static DEFAULT_POOL: OnceLock<CalibratedPool> = OnceLock::new();

/// Get the process-wide default pool.
pub fn pool() -> &'static CalibratedPool {
    DEFAULT_POOL.get_or_init(CalibratedPool::new)
}

/// Acquire a buffer from the default pool.
pub fn get() -> ByteBuffer {
    pool().get()
}

/// Release a buffer back to the default pool.
pub fn put(buf: ByteBuffer) {
    pool().put(buf)
}

/// Pool of reusable byte buffers that sizes itself to the workload.
///
/// `get`/`put` are lock-free. Every shared field is an independent atomic
/// cell, so a reader may observe the default size and the retention ceiling
/// from different calibration generations; both are advisory sizing hints,
/// never correctness-affecting.
pub struct CalibratedPool {
    /// Idle buffers awaiting reuse. Bounded; a full queue silently drops
    /// the incoming buffer.
    cache: ArrayQueue<ByteBuffer>,
    /// Length histogram feeding calibration.
    histogram: SizeHistogram,
    /// Capacity given to freshly allocated buffers. Zero until the first
    /// calibration completes.
    default_size: AtomicUsize,
    /// Buffers at or above this capacity are not recycled. Zero means
    /// retain everything.
    max_retained_size: AtomicUsize,
    /// Single-flight gate for calibration.
    calibrating: AtomicBool,
    /// Statistics: buffers served from the cache.
    hits: AtomicUsize,
    /// Statistics: buffers allocated fresh (cache miss).
    misses: AtomicUsize,
    /// Statistics: buffers recycled into the cache.
    returns: AtomicUsize,
    /// Statistics: buffers discarded (over the ceiling, or cache full).
    drops: AtomicUsize,
}

impl CalibratedPool {
    /// Create an empty pool. Sizing starts at zero: allocate on demand,
    /// retain everything, until the first calibration.
    pub fn new() -> Self {
        Self {
            cache: ArrayQueue::new(CACHE_SLOTS),
            histogram: SizeHistogram::new(),
            default_size: AtomicUsize::new(0),
            max_retained_size: AtomicUsize::new(0),
            calibrating: AtomicBool::new(false),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            returns: AtomicUsize::new(0),
            drops: AtomicUsize::new(0),
        }
    }

    /// Acquire a buffer.
    ///
    /// Serves an idle buffer when one is available (no ordering or
    /// size-aware selection), otherwise allocates one pre-sized to the
    /// current default. Returned buffers are always empty.
    #[inline]
    pub fn get(&self) -> ByteBuffer {
        if let Some(buf) = self.cache.pop() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            buf
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            ByteBuffer::with_capacity(self.default_size.load(Ordering::Relaxed))
        }
    }

    /// Release a buffer.
    ///
    /// Records the buffer's length in the histogram, recalibrating when a
    /// size class crosses the threshold, then either recycles the cleared
    /// buffer or discards it when its capacity reaches the retention
    /// ceiling.
    #[inline]
    pub fn put(&self, mut buf: ByteBuffer) {
        if self.histogram.record(buf.len()) > CALIBRATE_CALLS_THRESHOLD {
            self.calibrate();
        }

        let max = self.max_retained_size.load(Ordering::Relaxed);
        if max != 0 && buf.capacity() >= max {
            self.drops.fetch_add(1, Ordering::Relaxed);
            return;
        }

        buf.clear();
        if self.cache.push(buf).is_ok() {
            self.returns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Recompute sizing from the histogram.
    ///
    /// Single-flight: callers losing the gate return immediately and the
    /// next threshold breach retries. The winner drains the histogram,
    /// picks the modal size class as the new default, and walks the
    /// classes in descending frequency until 95% of observed returns are
    /// covered; the largest class touched becomes the retention ceiling.
    fn calibrate(&self) {
        if self
            .calibrating
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let counts = self.histogram.drain();
        let call_sum: u64 = counts.iter().sum();
        let mut classes: [(u64, usize); STEPS] =
            std::array::from_fn(|i| (counts[i], SizeHistogram::bucket_size(i)));
        classes.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let default_size = classes[0].1;
        let mut max_retained = default_size;

        let max_sum = (call_sum as f64 * MAX_PERCENTILE) as u64;
        let mut covered = 0u64;
        for &(calls, size) in &classes {
            if covered > max_sum {
                break;
            }
            covered += calls;
            if size > max_retained {
                max_retained = size;
            }
        }

        self.default_size.store(default_size, Ordering::Relaxed);
        self.max_retained_size.store(max_retained, Ordering::Relaxed);

        debug!(
            "calibrated pool: default_size={} max_retained_size={} from {} returns",
            default_size, max_retained, call_sum
        );

        self.calibrating.store(false, Ordering::Release);
    }

    /// Capacity currently given to freshly allocated buffers.
    #[inline]
    pub fn default_size(&self) -> usize {
        self.default_size.load(Ordering::Relaxed)
    }

    /// Capacity ceiling above which buffers are not recycled.
    #[inline]
    pub fn max_retained_size(&self) -> usize {
        self.max_retained_size.load(Ordering::Relaxed)
    }

    /// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }

    /// Current number of idle buffers.
    #[inline]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the pool holds no idle buffers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for CalibratedPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    /// Current idle buffers in the pool.
    pub size: usize,
    /// Buffers served from the pool (cache hits).
    pub hits: usize,
    /// Buffers allocated fresh (cache misses).
    pub misses: usize,
    /// Buffers recycled into the pool.
    pub returns: usize,
    /// Buffers discarded (over the retention ceiling, or pool full).
    pub drops: usize,
}

impl PoolStats {
    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Buffer borrowed from the default pool, returned on drop.
pub struct PooledBuffer {
    buf: Option<ByteBuffer>,
}

impl PooledBuffer {
    /// Acquire a buffer from the default pool.
    pub fn new() -> Self {
        Self {
            buf: Some(pool().get()),
        }
    }

    /// Take the buffer, preventing return to the pool.
    pub fn take(mut self) -> ByteBuffer {
        self.buf.take().unwrap()
    }
}

impl Default for PooledBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for PooledBuffer {
    type Target = ByteBuffer;

    fn deref(&self) -> &Self::Target {
        self.buf.as_ref().unwrap()
    }
}

impl std::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buf.as_mut().unwrap()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            pool().put(buf);
        }
    }
}
