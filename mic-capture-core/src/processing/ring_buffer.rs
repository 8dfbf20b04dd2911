use parking_lot::Mutex;

use crate::models::error::NatMicError;

/// Default capacity in samples.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Thread-safe circular buffer of audio samples for one producer and one
/// consumer.
///
/// Writes never block and never fail: when the consumer falls behind, unread
/// samples are overwritten. Reads are only valid once `available_samples()`
/// reports enough data; the buffer does no signalling of its own.
///
/// Availability is tracked with two monotonically increasing 64-bit counters
/// that are only ever compared by difference.
#[derive(Debug)]
pub struct RingBuffer {
    inner: Mutex<Cursors>,
}

#[derive(Debug)]
struct Cursors {
    buffer: Vec<f32>,
    write_index: usize,
    read_index: usize,
    total_write_count: u64,
    total_read_count: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Cursors {
                buffer: vec![0.0; capacity],
                write_index: 0,
                read_index: 0,
                total_write_count: 0,
                total_read_count: 0,
            }),
        }
    }

    /// Copy `samples` in at the write cursor, wrapping at the end of storage.
    ///
    /// A block longer than the capacity keeps only its last `capacity` samples,
    /// placed where they would have landed had the whole block been written.
    pub fn write(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }

        let mut c = self.inner.lock();
        let capacity = c.buffer.len();
        let skipped = samples.len().saturating_sub(capacity);
        let start = (c.write_index + skipped) % capacity;
        c.copy_in(start, &samples[skipped..]);
        c.write_index = (c.write_index + samples.len()) % capacity;
        c.total_write_count += samples.len() as u64;
    }

    /// Copy `count` samples from the read cursor into `destination`.
    ///
    /// `destination` is resized only when its length differs from `count`, so a
    /// staging buffer reused across calls is allocated once.
    pub fn read(&self, destination: &mut Vec<f32>, count: usize) -> Result<(), NatMicError> {
        let mut c = self.inner.lock();
        let available = c.available();
        if (count as u64) > available {
            return Err(NatMicError::InsufficientSamples {
                requested: count,
                available,
            });
        }

        if destination.len() != count {
            destination.resize(count, 0.0);
        }
        let start = c.read_index;
        c.copy_out(start, destination);
        c.read_index = (c.read_index + count) % c.buffer.len();
        c.total_read_count += count as u64;
        Ok(())
    }

    /// Discard up to `count` unread samples. Returns how many were discarded.
    pub fn skip(&self, count: usize) -> usize {
        let mut c = self.inner.lock();
        let skipped = (count as u64).min(c.available()) as usize;
        c.read_index = (c.read_index + skipped) % c.buffer.len();
        c.total_read_count += skipped as u64;
        skipped
    }

    /// Samples written but not yet read.
    pub fn available_samples(&self) -> u64 {
        self.inner.lock().available()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().buffer.len()
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Cursors {
    fn available(&self) -> u64 {
        self.total_write_count - self.total_read_count
    }

    fn copy_in(&mut self, mut index: usize, mut samples: &[f32]) {
        while !samples.is_empty() {
            let n = samples.len().min(self.buffer.len() - index);
            self.buffer[index..index + n].copy_from_slice(&samples[..n]);
            samples = &samples[n..];
            index = (index + n) % self.buffer.len();
        }
    }

    fn copy_out(&self, mut index: usize, destination: &mut [f32]) {
        let mut filled = 0;
        while filled < destination.len() {
            let n = (destination.len() - filled).min(self.buffer.len() - index);
            destination[filled..filled + n].copy_from_slice(&self.buffer[index..index + n]);
            filled += n;
            index = (index + n) % self.buffer.len();
        }
    }
}
