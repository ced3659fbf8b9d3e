use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use log::info;
use log::warn;

/// Keeps track of the time spent in the named phases of a tool, for example
/// reading the input and the determinization itself.
#[derive(Default)]
pub struct Timing {
    results: Rc<RefCell<Vec<(String, f32)>>>,
}

/// Measures the time between its creation and the call to `finish()`. Finish
/// should be called explicitly, a timer that is dropped before that is not
/// registered.
pub struct Timer {
    name: String,
    start: Instant,
    results: Rc<RefCell<Vec<(String, f32)>>>,
    registered: bool,
}

/// The measurements of a single phase, which can be timed multiple times.
#[derive(Default)]
struct PhaseSummary {
    total: f32,
    max: f32,
    count: usize,
}

impl Timing {
    /// Creates a new timing object to track timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new timer with the given name.
    pub fn start(&self, name: &str) -> Timer {
        Timer {
            name: name.to_string(),
            start: Instant::now(),
            results: self.results.clone(),
            registered: false,
        }
    }

    /// Groups the finished timers by name, ordered by name.
    fn summarise(&self) -> BTreeMap<String, PhaseSummary> {
        let mut phases: BTreeMap<String, PhaseSummary> = BTreeMap::new();
        for (name, time) in self.results.borrow().iter() {
            let phase = phases.entry(name.clone()).or_default();
            phase.total += *time;
            phase.max = phase.max.max(*time);
            phase.count += 1;
        }

        phases
    }

    /// Prints the time spent in every phase to stderr.
    pub fn print(&self) {
        for (name, phase) in self.summarise() {
            if phase.count == 1 {
                eprintln!("Time {}: {:.3}s", name, phase.total);
            } else {
                eprintln!(
                    "Time {}: {:.3}s, max: {:.3}s, n: {}",
                    name, phase.total, phase.max, phase.count
                );
            }
        }
    }
}

impl Timer {
    /// Finishes the timer and registers the result.
    pub fn finish(&mut self) {
        let time = self.start.elapsed().as_secs_f64();
        info!("Time {}: {:.3}s", self.name, time);

        self.results.borrow_mut().push((self.name.clone(), time as f32));
        self.registered = true
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.registered {
            warn!("Timer {} was dropped before 'finish()'", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_groups_phases() {
        let timing = Timing::new();

        for _ in 0..3 {
            timing.start("transition").finish();
        }
        timing.start("read").finish();

        let phases = timing.summarise();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases["transition"].count, 3);
        assert_eq!(phases["read"].count, 1);
    }
}
