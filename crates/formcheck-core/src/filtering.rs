//! Streaming filters for denoising landmark-derived signals.

use std::collections::VecDeque;

use crate::types::Timestamp;

/// Fixed-window moving average over a ring buffer with a running sum
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window_size: usize,
    buffer: VecDeque<f64>,
    sum: f64,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
            sum: 0.0,
        }
    }

    /// Push a sample and return the current smoothed value
    pub fn update(&mut self, x: f64) -> f64 {
        if self.buffer.len() == self.window_size {
            if let Some(oldest) = self.buffer.pop_front() {
                self.sum -= oldest;
            }
        }
        self.buffer.push_back(x);
        self.sum += x;

        self.sum / self.buffer.len() as f64
    }

    /// Current smoothed value, `None` before the first sample
    pub fn value(&self) -> Option<f64> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.sum / self.buffer.len() as f64)
        }
    }

    pub fn filter_signal(&mut self, signal: &[f64]) -> Vec<f64> {
        self.reset();
        signal.iter().map(|&x| self.update(x)).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.window_size
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.sum = 0.0;
    }
}

/// First difference of a value over elapsed time between successive updates
#[derive(Debug, Clone, Default)]
pub struct VelocityCalculator {
    last: Option<(f64, Timestamp)>,
    velocity: f64,
}

impl VelocityCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a sample and return its rate of change in units per second.
    ///
    /// The first sample, and any sample whose timestamp does not advance,
    /// yields 0.
    pub fn update(&mut self, value: f64, timestamp: Timestamp) -> f64 {
        self.velocity = match self.last {
            Some((prev_value, prev_time)) => {
                let dt = timestamp.secs_since(prev_time);
                if dt <= 0.0 {
                    0.0
                } else {
                    (value - prev_value) / dt
                }
            }
            None => 0.0,
        };
        self.last = Some((value, timestamp));
        self.velocity
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_moving_average_window() {
        let mut ma = MovingAverage::new(3);
        assert!(ma.value().is_none());
        assert_eq!(ma.update(3.0), 3.0);
        assert_eq!(ma.update(6.0), 4.5);
        assert_eq!(ma.update(9.0), 6.0);
        assert!(ma.is_full());
        // Oldest sample (3.0) is evicted
        assert_eq!(ma.update(12.0), 9.0);
        assert_eq!(ma.len(), 3);
        assert_eq!(ma.value(), Some(9.0));
    }

    #[test]
    fn test_moving_average_reset() {
        let mut ma = MovingAverage::new(4);
        let first = ma.filter_signal(&[1.0, 2.0, 3.0]);
        ma.reset();
        assert!(ma.is_empty());
        let second = ma.filter_signal(&[1.0, 2.0, 3.0]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_window_behaves_as_passthrough() {
        let mut ma = MovingAverage::new(0);
        assert_eq!(ma.window_size(), 1);
        assert_eq!(ma.update(5.0), 5.0);
        assert_eq!(ma.update(7.0), 7.0);
    }

    #[test]
    fn test_velocity() {
        let mut v = VelocityCalculator::new();
        assert_eq!(v.update(10.0, Timestamp::from_millis(0)), 0.0);
        assert_abs_diff_eq!(v.update(13.0, Timestamp::from_millis(500)), 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v.update(12.0, Timestamp::from_millis(1000)), -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_velocity_equal_timestamps() {
        let mut v = VelocityCalculator::new();
        v.update(1.0, Timestamp::from_millis(100));
        assert_eq!(v.update(50.0, Timestamp::from_millis(100)), 0.0);
        assert_eq!(v.update(60.0, Timestamp::from_millis(90)), 0.0);
        v.reset();
        assert_eq!(v.velocity(), 0.0);
    }
}
