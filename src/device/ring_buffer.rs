//! Bounded buffer of recent distance measurements.
//!
//! The distance unit appends one [`Measurement`] per tick; the uplink unit
//! walks the unsent entries, hands each to the outbound channel, and marks
//! it sent only once the hand-off succeeded.  When the backend is
//! unreachable for longer than the buffer covers, the oldest entries are
//! silently dropped.

use chrono::{DateTime, Local};
use heapless::Deque;

/// Upper bound for the configured capacity (backing storage is static).
pub const MAX_RING_CAPACITY: usize = 64;

/// A single distance reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    seq: u64,
    distance_m: f64,
    taken_at: DateTime<Local>,
    sent: bool,
}

impl Measurement {
    /// Position of this entry in the buffer's insertion order.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn taken_at(&self) -> DateTime<Local> {
        self.taken_at
    }

    /// Local timestamp with microseconds, no offset (`2024-05-01T17:03:12.123456`).
    pub fn datetime_iso(&self) -> String {
        self.taken_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }
}

/// Fixed-capacity FIFO of measurements, oldest first.
pub struct RingBuffer {
    entries: Deque<Measurement, MAX_RING_CAPACITY>,
    capacity: usize,
    next_seq: u64,
}

impl RingBuffer {
    /// `capacity` is clamped to `1..=MAX_RING_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Deque::new(),
            capacity: capacity.clamp(1, MAX_RING_CAPACITY),
            next_seq: 0,
        }
    }

    /// Append a reading, evicting the oldest entry when full.  Returns the
    /// new entry's sequence number.
    pub fn push(&mut self, distance_m: f64, taken_at: DateTime<Local>) -> u64 {
        if self.entries.len() >= self.capacity {
            let _ = self.entries.pop_front();
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let measurement = Measurement {
            seq,
            distance_m,
            taken_at,
            sent: false,
        };
        // Cannot fail: len < capacity <= MAX_RING_CAPACITY after the eviction.
        let _ = self.entries.push_back(measurement);
        seq
    }

    /// Unsent entries in insertion order.  The iterator is lazy and can be
    /// recreated at any time to start over.
    pub fn pending_unsent(&self) -> impl Iterator<Item = &Measurement> + '_ {
        self.entries.iter().filter(|m| !m.sent)
    }

    /// Flag entry `seq` as transmitted.  Returns `false` if it has been
    /// evicted in the meantime.  Marking is idempotent and never unset.
    pub fn mark_sent(&mut self, seq: u64) -> bool {
        match self.entries.iter_mut().find(|m| m.seq == seq) {
            Some(m) => {
                m.sent = true;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Measurement> + '_ {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&Measurement> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
