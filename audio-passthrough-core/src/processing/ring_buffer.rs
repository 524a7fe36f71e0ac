use std::collections::TryReserveError;

/// Fixed-capacity circular byte buffer.
///
/// Not thread-safe on its own; `StreamQueue` wraps it in a
/// `parking_lot::Mutex` for cross-thread access.
///
/// Overflow behavior: a write stores only what fits and reports the count.
/// Unread bytes are never overwritten.
#[derive(Debug)]
pub struct ByteRing {
    buffer: Vec<u8>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
}

impl ByteRing {
    /// Reserve `capacity` bytes, reporting allocator refusal instead of aborting.
    pub fn try_new(capacity: usize) -> Result<Self, TryReserveError> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(capacity)?;
        buffer.resize(capacity, 0);
        Ok(Self {
            buffer,
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
        })
    }

    /// Append as much of `data` as fits. Returns the number of bytes stored.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.free());
        if count == 0 {
            return 0;
        }

        let first = count.min(self.capacity - self.write_index);
        self.buffer[self.write_index..self.write_index + first].copy_from_slice(&data[..first]);
        self.buffer[..count - first].copy_from_slice(&data[first..count]);

        self.write_index = (self.write_index + count) % self.capacity;
        self.available += count;
        count
    }

    /// Remove up to `out.len()` bytes into `out`. Returns the number of bytes read.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.available);
        if count == 0 {
            return 0;
        }

        let first = count.min(self.capacity - self.read_index);
        out[..first].copy_from_slice(&self.buffer[self.read_index..self.read_index + first]);
        out[first..count].copy_from_slice(&self.buffer[..count - first]);

        self.read_index = (self.read_index + count) % self.capacity;
        self.available -= count;
        count
    }

    /// Number of bytes currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    /// Number of bytes that can be written before the buffer is full.
    pub fn free(&self) -> usize {
        self.capacity - self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn is_full(&self) -> bool {
        self.available == self.capacity
    }

    /// Reset the buffer to empty state.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
