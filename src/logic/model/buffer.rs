//! History Buffer - bounded consumption history for the detector
//!
//! Holds the most recent consumption values (kW) in arrival order.
//! The tail of the buffer doubles as the training window and the
//! jump-suppression window.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// ============================================================================
// BUFFER
// ============================================================================

/// Fixed-capacity FIFO of consumption values
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, evicting the oldest once capacity is exceeded
    pub fn append(&mut self, value: f64) {
        self.values.push_back(value);

        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// The last `n` values (or fewer), oldest first
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let start = self.values.len().saturating_sub(n);
        self.values.range(start..).copied().collect()
    }

    /// Mean of the last `n` values, `None` until `n` values exist
    pub fn recent_mean(&self, n: usize) -> Option<f64> {
        if n == 0 || self.values.len() < n {
            return None;
        }

        let start = self.values.len() - n;
        let sum: f64 = self.values.range(start..).sum();
        Some(sum / n as f64)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Status relative to the size a full training window needs
    pub fn status(&self, window_size: usize) -> BufferStatus {
        let current = self.values.len();

        BufferStatus {
            current_size: current,
            capacity: self.capacity,
            window_size,
            is_ready: current >= window_size,
            fill_percent: if window_size > 0 {
                (current as f32 / window_size as f32 * 100.0).min(100.0)
            } else {
                0.0
            },
        }
    }
}

/// Buffer status information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferStatus {
    pub current_size: usize,
    pub capacity: usize,
    pub window_size: usize,
    pub is_ready: bool,
    pub fill_percent: f32,
}
