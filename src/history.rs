use heapless::Deque;

/// Depth of the base-position history. At a 10–40 ms cycle this covers well
/// past the barometer latency being compensated.
pub const HISTORY_DEPTH: usize = 32;

#[derive(Clone, Copy)]
struct HistorySample {
    timestamp_us: u32,
    position_cm: f32,
}

/// Ring buffer of timestamped base-position samples, oldest evicted first.
/// Lets a delayed barometer reading be compared against the position the
/// vehicle actually had when the sample was physically taken.
pub struct HistoryQueue {
    samples: Deque<HistorySample, HISTORY_DEPTH>,
}

impl HistoryQueue {
    pub fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Insertion order must match time order; the caller pushes once per
    /// estimator cycle.
    pub fn push(&mut self, timestamp_us: u32, position_cm: f32) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        let _ = self.samples.push_back(HistorySample {
            timestamp_us,
            position_cm,
        });
    }

    /// Newest sample taken at or before `timestamp_us`, if any. Wrapping
    /// comparison keeps this correct across the µs-counter rollover.
    pub fn value_at(&self, timestamp_us: u32) -> Option<f32> {
        let (front, back) = self.samples.as_slices();
        back.iter()
            .rev()
            .chain(front.iter().rev())
            .find(|s| timestamp_us.wrapping_sub(s.timestamp_us) as i32 >= 0)
            .map(|s| s.position_cm)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
