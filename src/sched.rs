use std::time::Duration;

/// The repeating tick timer, owned by the host. The engine only arms and
/// cancels it; firing a tick means the host calls [`crate::Engine::tick`].
pub trait Scheduler {
    /// Arm the repeating tick, replacing any previous schedule.
    fn start(&mut self, interval: Duration);

    /// Cancel the repeating tick. Idempotent.
    fn cancel(&mut self);

    fn is_active(&self) -> bool;
}

/// Scheduler that records state and lets the host fire ticks itself. Used by
/// tests and by the headless CLI, which paces ticks with a sleep.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    interval: Option<Duration>,
    starts: u32,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// How many times the schedule was (re)armed; restarts bump this.
    pub fn times_started(&self) -> u32 {
        self.starts
    }
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, interval: Duration) {
        self.interval = Some(interval);
        self.starts += 1;
    }

    fn cancel(&mut self) {
        self.interval = None;
    }

    fn is_active(&self) -> bool {
        self.interval.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_replaces_and_counts() {
        let mut s = ManualScheduler::new();
        assert!(!s.is_active());
        s.start(Duration::from_millis(100));
        s.start(Duration::from_millis(50));
        assert_eq!(s.interval(), Some(Duration::from_millis(50)));
        assert_eq!(s.times_started(), 2);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = ManualScheduler::new();
        s.start(Duration::from_millis(100));
        s.cancel();
        s.cancel();
        assert!(!s.is_active());
    }
}
