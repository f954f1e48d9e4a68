//! Bounded single-producer single-consumer tick channel.
//!
//! A wait-free ring over a power-of-two slot array. The producer and
//! consumer ends are split into separate handles so ownership enforces the
//! single-producer/single-consumer contract at compile time. When the ring
//! is full the incoming value is rejected (drop-newest backpressure).

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Ring<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: u64,
    capacity: u64,
    /// Next slot the producer will write. Only the producer advances this.
    head: CachePadded<AtomicU64>,
    /// Next slot the consumer will read. Only the consumer advances this.
    tail: CachePadded<AtomicU64>,
}

// The raw slots are only touched by the single producer (writes at head)
// and the single consumer (reads at tail), which never alias.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        let head = self.head.load(Ordering::Relaxed);
        let mut tail = self.tail.load(Ordering::Relaxed);
        while tail != head {
            let idx = (tail & self.mask) as usize;
            unsafe { (*self.slots[idx].get()).assume_init_drop() };
            tail = tail.wrapping_add(1);
        }
    }
}

/// Producing half of the channel.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

/// Consuming half of the channel.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

/// Creates a channel holding at most `capacity` in-flight values.
///
/// The slot array is rounded up to a power of two internally; the occupancy
/// limit stays at the requested capacity.
pub fn bounded<T: Send>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity > 0, "channel capacity must be positive");
    let slot_count = capacity.next_power_of_two();
    let slots = (0..slot_count)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();
    let ring = Arc::new(Ring {
        slots,
        mask: slot_count as u64 - 1,
        capacity: capacity as u64,
        head: CachePadded::new(AtomicU64::new(0)),
        tail: CachePadded::new(AtomicU64::new(0)),
    });
    (
        Producer { ring: ring.clone() },
        Consumer { ring },
    )
}

impl<T: Send> Producer<T> {
    /// Non-blocking enqueue. Returns the value back when the ring is full.
    pub fn try_enqueue(&mut self, value: T) -> Result<(), T> {
        let head = self.ring.head.load(Ordering::Relaxed);
        let tail = self.ring.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= self.ring.capacity {
            return Err(value);
        }
        let idx = (head & self.ring.mask) as usize;
        unsafe { (*self.ring.slots[idx].get()).write(value) };
        self.ring.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Number of values currently queued.
    pub fn len(&self) -> usize {
        let head = self.ring.head.load(Ordering::Relaxed);
        let tail = self.ring.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send> Consumer<T> {
    /// Non-blocking dequeue. Returns `None` when the ring is empty.
    pub fn try_dequeue(&mut self) -> Option<T> {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        let head = self.ring.head.load(Ordering::Acquire);
        if tail == head {
            return None;
        }
        let idx = (tail & self.ring.mask) as usize;
        let value = unsafe { (*self.ring.slots[idx].get()).assume_init_read() };
        self.ring.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(value)
    }
}
