//! Single-producer single-consumer byte ring with a published watermark.
//!
//! The ring tracks three monotonically increasing 32-bit positions:
//!
//! - `produce_pos`: total bytes the producer has copied in, ever
//! - `consumable_pos`: total bytes the producer has declared complete
//! - `consume_pos`: total bytes the consumer has drained
//!
//! A record is written in pieces (level, timestamp, thread id, message
//! tokens), each advancing `produce_pos`. None of it is visible to the
//! consumer until the producer publishes the total length through
//! [`RingBuffer::advance_consumable`]. The consumer therefore never drains a
//! partial record.
//!
//! Positions wrap modulo 2^32; differences are taken with wrapping
//! subtraction and never exceed the capacity. The byte offset of a position
//! is `pos & (capacity - 1)`, so the capacity must be a power of two.

use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam::utils::CachePadded;

/// Default ring capacity: 1 MiB per producer thread.
pub const DEFAULT_RING_CAPACITY: usize = 1 << 20;

/// Lock-free SPSC byte queue.
///
/// Exactly one thread may call [`produce`](Self::produce) and
/// [`advance_consumable`](Self::advance_consumable); exactly one (other)
/// thread may call [`consume`](Self::consume). The read-only accessors are
/// safe from any thread.
pub struct RingBuffer {
    /// Backing bytes, length `capacity`.
    storage: Box<[UnsafeCell<u8>]>,

    /// Capacity in bytes, power of two.
    capacity: u32,

    /// Bytes written by the producer (release store on advance).
    produce_pos: CachePadded<AtomicU32>,

    /// Bytes published as complete records (release store on advance).
    consumable_pos: CachePadded<AtomicU32>,

    /// Bytes drained by the consumer (release store on advance).
    consume_pos: CachePadded<AtomicU32>,
}

// SAFETY: the storage cells are only written through `produce` (one thread)
// and read through `consume` (one thread), and every handoff between the two
// is ordered by a release store / acquire load pair on the position words.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Create a ring with the given capacity, rounded up to a power of two.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or exceeds 2 GiB (positions are 32-bit and
    /// their differences must stay below the capacity).
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be > 0");
        let capacity = capacity.next_power_of_two();
        assert!(
            capacity <= 1 << 31,
            "ring capacity must fit in 32-bit position arithmetic"
        );

        let storage = (0..capacity)
            .map(|_| UnsafeCell::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            storage,
            capacity: capacity as u32,
            produce_pos: CachePadded::new(AtomicU32::new(0)),
            consumable_pos: CachePadded::new(AtomicU32::new(0)),
            consume_pos: CachePadded::new(AtomicU32::new(0)),
        }
    }

    /// Create a ring with [`DEFAULT_RING_CAPACITY`].
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }

    /// Byte offset of a position into the storage.
    #[inline]
    fn offset_of(&self, pos: u32) -> usize {
        (pos & (self.capacity - 1)) as usize
    }

    /// Capacity in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.capacity
    }

    /// Bytes currently held (written but not yet drained).
    ///
    /// Acquire loads pair with the release stores of both sides, so a caller
    /// observing `used() >= k` also observes the k newest stored bytes.
    #[inline]
    pub fn used(&self) -> u32 {
        let produce = self.produce_pos.load(Ordering::Acquire);
        let consume = self.consume_pos.load(Ordering::Acquire);
        produce.wrapping_sub(consume)
    }

    /// Bytes of free space.
    #[inline]
    pub fn unused(&self) -> u32 {
        self.capacity - self.used()
    }

    /// Bytes of complete records available to the consumer.
    #[inline]
    pub fn consumable(&self) -> u32 {
        let consumable = self.consumable_pos.load(Ordering::Acquire);
        let consume = self.consume_pos.load(Ordering::Acquire);
        consumable.wrapping_sub(consume)
    }

    /// Copy `from` into the ring, blocking while space is insufficient.
    ///
    /// The length is clamped to the ring capacity, so a single call can
    /// never request more space than can ever become free. Back-pressure is
    /// a busy wait: the full-buffer condition is expected to be rare and
    /// short-lived, and the sink drains in large strides.
    ///
    /// Producer side only.
    pub fn produce(&self, from: &[u8]) {
        let n = (from.len() as u32).min(self.capacity);
        if n == 0 {
            return;
        }

        while self.unused() < n {
            std::hint::spin_loop();
        }

        let produce = self.produce_pos.load(Ordering::Relaxed);
        let offset = self.offset_of(produce);
        let to_end = (n as usize).min(self.capacity as usize - offset);

        // SAFETY: the producer owns [produce, produce + n) - the wait above
        // guarantees the consumer has drained past the wrapped range, and no
        // other thread produces.
        unsafe {
            let base = self.storage.as_ptr() as *mut u8;
            ptr::copy_nonoverlapping(from.as_ptr(), base.add(offset), to_end);
            ptr::copy_nonoverlapping(from.as_ptr().add(to_end), base, n as usize - to_end);
        }

        self.produce_pos
            .store(produce.wrapping_add(n), Ordering::Release);
    }

    /// Publish `n` produced bytes as one complete record.
    ///
    /// Producer side only.
    pub fn advance_consumable(&self, n: u32) {
        let consumable = self.consumable_pos.load(Ordering::Relaxed);
        self.consumable_pos
            .store(consumable.wrapping_add(n), Ordering::Release);
    }

    /// Drain up to `to.len()` published bytes into `to`, returning the count.
    ///
    /// Only whole published bytes move; unpublished produce-side bytes are
    /// never observed. Consumer side only.
    pub fn consume(&self, to: &mut [u8]) -> usize {
        let avail = self.consumable().min(to.len() as u32);
        if avail == 0 {
            return 0;
        }

        let consume = self.consume_pos.load(Ordering::Relaxed);
        let offset = self.offset_of(consume);
        let to_end = (avail as usize).min(self.capacity as usize - offset);

        // SAFETY: [consume, consume + avail) is published and unread; the
        // producer cannot overwrite it until consume_pos advances past it.
        unsafe {
            let base = self.storage.as_ptr() as *const u8;
            ptr::copy_nonoverlapping(base.add(offset), to.as_mut_ptr(), to_end);
            ptr::copy_nonoverlapping(base, to.as_mut_ptr().add(to_end), avail as usize - to_end);
        }

        self.consume_pos
            .store(consume.wrapping_add(avail), Ordering::Release);

        avail as usize
    }

    /// Reset every position to zero. Test helper; not safe while another
    /// thread is producing or consuming.
    pub fn reset(&self) {
        self.produce_pos.store(0, Ordering::Relaxed);
        self.consumable_pos.store(0, Ordering::Relaxed);
        self.consume_pos.store(0, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("used", &self.used())
            .field("consumable", &self.consumable())
            .finish()
    }
}

#[cfg(test)]
#[path = "ring_test.rs"]
mod ring_test;
