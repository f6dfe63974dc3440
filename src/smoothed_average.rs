use std::collections::VecDeque;

/// Fixed-window moving average used for frame latency telemetry
#[derive(Debug, Clone)]
pub struct SmoothedAverage {
    window_size: usize,
    buffer: VecDeque<f64>,
    sum: f64,
}

impl SmoothedAverage {
    /// Create an average over the last `window_size` samples (at least one)
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
            sum: 0.0,
        }
    }

    /// Add a sample, evicting the oldest one when the window is full
    pub fn add(&mut self, value: f64) {
        if self.buffer.len() >= self.window_size {
            if let Some(oldest) = self.buffer.pop_front() {
                self.sum -= oldest;
            }
        }
        self.buffer.push_back(value);
        self.sum += value;
    }

    /// Average of the samples currently in the window, 0.0 when empty
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.sum / self.buffer.len() as f64
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothed_average() {
        let mut average = SmoothedAverage::new(3);
        assert_eq!(average.average(), 0.0);

        average.add(10.0);
        assert_eq!(average.average(), 10.0);

        average.add(20.0);
        assert_eq!(average.average(), 15.0);

        average.add(30.0);
        assert_eq!(average.average(), 20.0);

        // Window is full, oldest value should be dropped
        average.add(40.0);
        assert_eq!(average.average(), 30.0);
        assert_eq!(average.len(), 3);
    }

    #[test]
    fn test_zero_window_holds_one_sample() {
        let mut average = SmoothedAverage::new(0);
        average.add(5.0);
        average.add(7.0);
        assert_eq!(average.window_size(), 1);
        assert_eq!(average.average(), 7.0);
    }

    #[test]
    fn test_reset() {
        let mut average = SmoothedAverage::new(4);
        average.add(1.0);
        average.add(2.0);
        average.reset();
        assert!(average.is_empty());
        assert_eq!(average.average(), 0.0);
    }
}
