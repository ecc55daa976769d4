//! Fixed-capacity circular (ring) buffer used by pass-through monitoring.
//!
//! The capture side pushes interleaved samples with
//! [`push_slice`](RingBuffer::push_slice); the monitor output callback pulls
//! them with [`pop_into`](RingBuffer::pop_into).  When the consumer falls
//! behind, new samples **overwrite** the oldest ones so monitoring latency
//! never grows beyond `capacity`.
//!
//! # Example
//!
//! ```rust
//! use auo::audio::RingBuffer;
//!
//! let mut buf = RingBuffer::new(4);
//! buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]); // 5 items → capacity 4 → oldest dropped
//! let mut out = [0.0; 3];
//! assert_eq!(buf.pop_into(&mut out), 3);
//! assert_eq!(out, [2.0, 3.0, 4.0]);
//! ```

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity circular buffer.
///
/// Generic over `T: Copy + Default`; the monitor path stores `f32`.
pub struct RingBuffer<T> {
    buf: Vec<T>,
    capacity: usize,
    /// Index of the *next* write position (wraps around `capacity`).
    write_pos: usize,
    /// Number of valid samples currently stored (≤ `capacity`).
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with the given `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: vec![T::default(); capacity],
            capacity,
            write_pos: 0,
            len: 0,
        }
    }

    /// Append `data`, overwriting the oldest samples on overflow.
    pub fn push_slice(&mut self, data: &[T]) {
        for &item in data {
            self.buf[self.write_pos] = item;
            self.write_pos = (self.write_pos + 1) % self.capacity;
            if self.len < self.capacity {
                self.len += 1;
            }
        }
    }

    /// Move up to `out.len()` of the oldest samples into `out`.
    ///
    /// Returns how many were written; the rest of `out` is untouched.
    pub fn pop_into(&mut self, out: &mut [T]) -> usize {
        let n = out.len().min(self.len);
        let read_pos = (self.write_pos + self.capacity - self.len) % self.capacity;
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.buf[(read_pos + i) % self.capacity];
        }
        self.len -= n;
        n
    }

    /// Discard all samples and reset the write position.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Number of valid samples currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
