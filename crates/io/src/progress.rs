//!
//! A utility to print progress information for procedures of which the total
//! amount of work is not known in advance, such as a state space exploration.
//! Messages are printed at most once per interval.
//!

use std::marker::PhantomData;
use std::time::Duration;
use std::time::Instant;

/// A time-based progress tracker that prints messages at regular intervals.
pub struct TimeProgress<F: Fn(T), T> {
    interval: Duration,
    last_update: Instant,
    message: F,
    _marker: PhantomData<T>,
}

impl<F: Fn(T), T> TimeProgress<F, T> {
    /// Create a new time-based progress tracker with a given interval in seconds.
    pub fn new(message: F, interval_seconds: u64) -> TimeProgress<F, T> {
        TimeProgress {
            message,
            interval: Duration::from_secs(interval_seconds),
            last_update: Instant::now(),
            _marker: PhantomData,
        }
    }

    /// Prints the message for the given object when the interval has passed
    /// since the last message.
    pub fn print(&mut self, object: T) {
        let now = Instant::now();
        if now.duration_since(self.last_update) >= self.interval {
            (self.message)(object);
            self.last_update = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_time_progress_interval() {
        let printed = Cell::new(0);
        let mut progress = TimeProgress::new(|_: usize| printed.set(printed.get() + 1), 0);

        // With a zero interval every call prints.
        progress.print(1);
        progress.print(2);
        assert_eq!(printed.get(), 2);

        let mut progress = TimeProgress::new(|_: usize| printed.set(printed.get() + 1), 3600);
        progress.print(3);
        assert_eq!(printed.get(), 2);
    }
}
