//! Flattened, per-channel contiguous view of a [`SampleStore`].
//!
//! Playback and export need plain slices rather than a list of frames.
//! [`MaterializedBuffer`] derives a [`PcmBuffer`] from the store lazily: it
//! remembers how many frames it has already copied and only extends with the
//! frames appended since, starting over when the store was reset.
//!
//! The buffer is shared with the output device thread as an
//! `Arc<PcmBuffer>`; extending it while a previous snapshot is still being
//! played copies the data first (`Arc::make_mut`) so the playing snapshot is
//! never mutated.

use std::sync::Arc;

use super::SampleStore;

// ---------------------------------------------------------------------------
// PcmBuffer
// ---------------------------------------------------------------------------

/// Channel-major float samples plus their sample rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcmBuffer {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl PcmBuffer {
    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Convert a time in seconds to a sample offset on this buffer's grid,
    /// rounded to the nearest sample and clamped to `[0, len]`.
    pub fn sample_at(&self, secs: f64) -> usize {
        let raw = (secs * self.sample_rate as f64).round();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.len())
        }
    }
}

// ---------------------------------------------------------------------------
// MaterializedBuffer
// ---------------------------------------------------------------------------

/// Lazily (re)built [`PcmBuffer`] tracking one [`SampleStore`].
#[derive(Debug, Default)]
pub struct MaterializedBuffer {
    pcm: Arc<PcmBuffer>,
    generation: u64,
    frames_consumed: usize,
}

impl MaterializedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `store` holds samples this buffer has not copied
    /// yet, or belongs to a newer recording.
    pub fn is_stale(&self, store: &SampleStore) -> bool {
        self.generation != store.generation() || self.pcm.len() < store.total_samples()
    }

    /// Bring the buffer up to date with `store`.
    ///
    /// Returns `true` when anything had to be copied.
    pub fn ensure(&mut self, store: &SampleStore) -> bool {
        if !self.is_stale(store) {
            return false;
        }

        if self.generation != store.generation() {
            log::debug!(
                "materialize: store generation {} → {}, rebuilding",
                self.generation,
                store.generation()
            );
            self.pcm = Arc::new(PcmBuffer {
                channels: vec![Vec::with_capacity(store.total_samples()); store.channel_count()],
                sample_rate: store.sample_rate(),
            });
            self.generation = store.generation();
            self.frames_consumed = 0;
        }

        let pending = store.frames_from(self.frames_consumed);
        let pcm = Arc::make_mut(&mut self.pcm);
        pcm.sample_rate = store.sample_rate();
        if pcm.channels.len() != store.channel_count() {
            pcm.channels = vec![Vec::new(); store.channel_count()];
        }
        for frame in pending {
            for (dst, src) in pcm.channels.iter_mut().zip(frame.channels()) {
                dst.extend_from_slice(src);
            }
        }
        self.frames_consumed += pending.len();

        debug_assert_eq!(pcm.len(), store.total_samples());
        true
    }

    /// Number of samples per channel materialised so far.
    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    /// Shared handle to the current snapshot.
    pub fn shared(&self) -> Arc<PcmBuffer> {
        Arc::clone(&self.pcm)
    }

    /// Borrow the current snapshot.
    pub fn pcm(&self) -> &PcmBuffer {
        &self.pcm
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
