//! Lock-free SPSC byte ring shared between an interrupt handler and foreground code.
//!
//! # Overview
//! - Single producer, single consumer.
//! - Fixed capacity `N`; one slot is kept free so `head == tail` always means empty.
//!   The ring therefore holds at most `N - 1` bytes.
//! - When full, the producer drops the incoming byte (drop-newest). Stored bytes are never
//!   overwritten.
//!
//! # Ownership of the indices
//! Only the producer stores `head`; only the consumer stores `tail`. Each side reads the
//! other's index with `Acquire` and publishes its own with `Release`, so a byte written into a
//! slot is visible before the index that exposes it.
//!
//! `reset` stores both indices and is only sound while neither side is running, e.g. with the
//! owning line's interrupts masked.

use core::cell::UnsafeCell;

use crate::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity byte ring for one producer and one consumer.
pub struct RingBuffer<const N: usize> {
    head: AtomicUsize,
    tail: AtomicUsize,
    slots: [UnsafeCell<u8>; N],
}

unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    /// Usable capacity in bytes.
    pub const CAPACITY: usize = N - 1;

    pub const fn new() -> Self {
        assert!(N > 1);
        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            slots: [const { UnsafeCell::new(0) }; N],
        }
    }

    #[inline(always)]
    const fn advance(idx: usize) -> usize {
        (idx + 1) % N
    }

    /// Producer side. Returns false and leaves the ring untouched when full.
    #[inline]
    pub fn try_push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = Self::advance(head);
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }

        unsafe { *self.slots[head].get() = byte };
        self.head.store(next, Ordering::Release);
        true
    }

    /// Consumer side. Takes the oldest byte.
    #[inline]
    pub fn try_pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        let byte = unsafe { *self.slots[tail].get() };
        self.tail.store(Self::advance(tail), Ordering::Release);
        Some(byte)
    }

    /// Consumer side. Reads the oldest byte without taking it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        Some(unsafe { *self.slots[tail].get() })
    }

    /// Number of buffered bytes.
    #[inline]
    pub fn count(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (N + head - tail) % N
    }

    #[inline]
    pub fn free_slots(&self) -> usize {
        Self::CAPACITY - self.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        Self::advance(self.head.load(Ordering::Acquire)) == self.tail.load(Ordering::Acquire)
    }

    /// Rewind both indices to slot 0, discarding any buffered bytes.
    ///
    /// Neither the producer nor the consumer may run concurrently with this call.
    pub fn reset(&self) {
        self.head.store(0, Ordering::Release);
        self.tail.store(0, Ordering::Release);
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for RingBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &Self::CAPACITY)
            .field("count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;
    use std::vec::Vec;

    #[test]
    fn pop_empty_returns_none() {
        let ring = RingBuffer::<4>::new();
        assert_eq!(ring.try_pop(), None);
        assert_eq!(ring.peek(), None);
        assert!(ring.is_empty());
    }

    #[test]
    fn pops_in_push_order() {
        let ring = RingBuffer::<16>::new();
        let input = [3u8, 1, 4, 1, 5, 9, 2, 6];
        for b in input {
            assert!(ring.try_push(b));
        }

        let mut seen = Vec::new();
        while let Some(b) = ring.try_pop() {
            seen.push(b);
        }
        assert_eq!(&seen[..], &input[..]);
    }

    #[test]
    fn holds_one_less_than_n() {
        let ring = RingBuffer::<4>::new();
        assert!(ring.try_push(1));
        assert!(ring.try_push(2));
        assert!(ring.try_push(3));
        assert!(ring.is_full());
        assert_eq!(ring.count(), 3);

        assert!(!ring.try_push(4));
        assert_eq!(ring.count(), 3);
        assert_eq!(ring.free_slots(), 0);
    }

    #[test]
    fn full_ring_drops_newest() {
        let ring = RingBuffer::<4>::new();
        for b in [10, 11, 12, 13] {
            let _ = ring.try_push(b);
        }
        assert_eq!(ring.try_pop(), Some(10));
        assert_eq!(ring.try_pop(), Some(11));
        assert_eq!(ring.try_pop(), Some(12));
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn count_tracks_pushes_and_pops() {
        let ring = RingBuffer::<8>::new();
        for k in 1..=5u8 {
            assert!(ring.try_push(k));
            assert_eq!(ring.count(), k as usize);
        }
        let _ = ring.try_pop();
        assert_eq!(ring.count(), 4);
        assert_eq!(ring.free_slots(), 3);
    }

    #[test]
    fn count_survives_wraparound() {
        let ring = RingBuffer::<4>::new();
        for round in 0..10u8 {
            assert!(ring.try_push(round));
            assert!(ring.try_push(round.wrapping_add(100)));
            assert_eq!(ring.count(), 2);
            assert_eq!(ring.try_pop(), Some(round));
            assert_eq!(ring.try_pop(), Some(round.wrapping_add(100)));
            assert_eq!(ring.count(), 0);
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let ring = RingBuffer::<4>::new();
        assert!(ring.try_push(42));
        assert_eq!(ring.peek(), Some(42));
        assert_eq!(ring.peek(), Some(42));
        assert_eq!(ring.count(), 1);
        assert_eq!(ring.try_pop(), Some(42));
    }

    #[test]
    fn reset_empties_ring() {
        let ring = RingBuffer::<8>::new();
        for b in 0..5 {
            assert!(ring.try_push(b));
        }
        let _ = ring.try_pop();
        ring.reset();
        assert_eq!(ring.count(), 0);
        assert_eq!(ring.free_slots(), RingBuffer::<8>::CAPACITY);
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn spsc_across_threads_preserves_order() {
        static RING: RingBuffer<8> = RingBuffer::new();
        const TOTAL: usize = 10_000;

        let producer = std::thread::spawn(|| {
            for i in 0..TOTAL {
                let b = (i % 251) as u8;
                while !RING.try_push(b) {
                    std::hint::spin_loop();
                }
            }
        });

        let mut received = 0usize;
        while received < TOTAL {
            if let Some(b) = RING.try_pop() {
                assert_eq!(b, (received % 251) as u8);
                received += 1;
            }
        }
        producer.join().unwrap();
        assert!(RING.is_empty());
    }
}
