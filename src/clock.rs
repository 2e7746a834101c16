use std::time::Duration;

use crate::dataset::TimeWindow;

pub const DEFAULT_TICKS_PER_SECOND: u32 = 10;

/// Clamp range for the speed multiplier (virtual seconds per real second).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 10_000_000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockConfig {
    pub ticks_per_second: u32,
    pub speed_range: SpeedRange,
    /// Initial speed multiplier; 3600 replays an hour per real second.
    pub initial_speed: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            speed_range: SpeedRange::default(),
            initial_speed: 3600.0,
        }
    }
}

/// Outcome of advancing the clock by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Advanced,
    /// The virtual time crossed the window end; playback must stop (and may
    /// loop back to the start).
    Finished,
}

/// Maps real elapsed time onto a virtual timestamp. The clock holds logical
/// state only; the repeating timer lives behind [`crate::sched::Scheduler`]
/// so hosts and tests control when ticks actually fire.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    config: ClockConfig,
    virtual_time_ms: f64,
    speed: f64,
    fade_real_seconds: f64,
    running: bool,
}

impl PlaybackClock {
    pub fn new(config: ClockConfig) -> Self {
        let speed = config
            .initial_speed
            .clamp(config.speed_range.min, config.speed_range.max);
        Self {
            config,
            virtual_time_ms: 0.0,
            speed,
            fade_real_seconds: 0.0,
            running: false,
        }
    }

    pub fn virtual_time_ms(&self) -> f64 {
        self.virtual_time_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.config.ticks_per_second
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.config.ticks_per_second))
    }

    /// Virtual milliseconds each tick advances by.
    pub fn step_per_tick_ms(&self) -> f64 {
        self.speed * 1000.0 / f64::from(self.config.ticks_per_second)
    }

    /// Fade window in virtual ms. Fade is expressed to the user in real
    /// seconds and must scale with playback speed, not wall-clock time.
    pub fn fade_duration_ms(&self) -> f64 {
        self.fade_real_seconds * 1000.0 * self.speed
    }

    pub fn fade_real_seconds(&self) -> f64 {
        self.fade_real_seconds
    }

    pub fn set_fade_seconds(&mut self, seconds: f64) {
        self.fade_real_seconds = seconds.max(0.0);
    }

    pub fn set_speed(&mut self, multiplier: f64) {
        self.speed = multiplier.clamp(self.config.speed_range.min, self.config.speed_range.max);
    }

    pub fn multiply_speed(&mut self, factor: f64) {
        self.set_speed(self.speed * factor);
    }

    /// Enter the running state. Resets to the window start when the current
    /// position is outside `[start, end)`.
    pub fn start(&mut self, window: TimeWindow) {
        let start = window.start_ms as f64;
        let end = window.end_ms as f64;
        if self.virtual_time_ms < start || self.virtual_time_ms >= end {
            self.virtual_time_ms = start;
        }
        self.running = true;
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn advance(&mut self, window: TimeWindow) -> Tick {
        self.virtual_time_ms += self.step_per_tick_ms();
        if self.virtual_time_ms > window.end_ms as f64 {
            Tick::Finished
        } else {
            Tick::Advanced
        }
    }

    pub fn seek_to(&mut self, time_ms: f64, window: TimeWindow) {
        self.virtual_time_ms = time_ms.clamp(window.start_ms as f64, window.end_ms as f64);
    }

    /// `fraction` in `[0, 1]` maps linearly onto the window.
    pub fn seek_fraction(&mut self, fraction: f64, window: TimeWindow) {
        let f = fraction.clamp(0.0, 1.0);
        let t = window.start_ms as f64 + window.span_ms() as f64 * f;
        self.seek_to(t, window);
    }

    /// Offset by `n` seconds of real playback time at the current speed.
    pub fn seek_step(&mut self, n: f64, window: TimeWindow) {
        let offset = n * f64::from(self.config.ticks_per_second) * self.step_per_tick_ms();
        self.seek_to(self.virtual_time_ms + offset, window);
    }

    /// Normalized position within the window, for scrub controls.
    pub fn fraction(&self, window: TimeWindow) -> f64 {
        let span = window.span_ms() as f64;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.virtual_time_ms - window.start_ms as f64) / span).clamp(0.0, 1.0)
    }

    /// Back to the cleared state: stopped, with every event in the future.
    pub fn reset(&mut self) {
        self.virtual_time_ms = 0.0;
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> TimeWindow {
        TimeWindow::new(10_000, 20_000)
    }

    fn clock(speed: f64) -> PlaybackClock {
        let mut c = PlaybackClock::new(ClockConfig::default());
        c.set_speed(speed);
        c
    }

    #[test]
    fn step_is_speed_scaled() {
        // 2 virtual seconds per real second at 10 ticks/s => 200 ms per tick
        assert_eq!(clock(2.0).step_per_tick_ms(), 200.0);
    }

    #[test]
    fn start_resets_when_outside_window() {
        let mut c = clock(1.0);
        c.start(window());
        assert_eq!(c.virtual_time_ms(), 10_000.0);
        assert!(c.is_running());

        c.stop();
        c.seek_to(15_000.0, window());
        c.start(window());
        assert_eq!(c.virtual_time_ms(), 15_000.0);

        // exactly at end counts as outside [start, end)
        c.stop();
        c.seek_to(20_000.0, window());
        c.start(window());
        assert_eq!(c.virtual_time_ms(), 10_000.0);
    }

    #[test]
    fn advance_reports_finished_only_past_end() {
        let mut c = clock(1.0);
        c.start(window());
        c.seek_to(19_900.0, window());
        // step = 100 ms; landing exactly on end is not finished
        assert_eq!(c.advance(window()), Tick::Advanced);
        assert_eq!(c.virtual_time_ms(), 20_000.0);
        assert_eq!(c.advance(window()), Tick::Finished);
    }

    #[test]
    fn seek_clamps_to_window() {
        let mut c = clock(1.0);
        c.seek_to(window().start_ms as f64 - 1000.0, window());
        assert_eq!(c.virtual_time_ms(), 10_000.0);
        c.seek_to(window().end_ms as f64 + 1000.0, window());
        assert_eq!(c.virtual_time_ms(), 20_000.0);
    }

    #[test]
    fn seek_fraction_maps_linearly() {
        let mut c = clock(1.0);
        c.seek_fraction(0.5, window());
        assert_eq!(c.virtual_time_ms(), 15_000.0);
        c.seek_fraction(2.0, window());
        assert_eq!(c.virtual_time_ms(), 20_000.0);
        assert_eq!(c.fraction(window()), 1.0);
    }

    #[test]
    fn seek_step_is_real_playback_seconds() {
        let mut c = clock(2.0);
        c.seek_to(10_000.0, window());
        // 1 real second at speed 2 => 2000 virtual ms
        c.seek_step(1.0, window());
        assert_eq!(c.virtual_time_ms(), 12_000.0);
        c.seek_step(-0.5, window());
        assert_eq!(c.virtual_time_ms(), 11_000.0);
    }

    #[test]
    fn speed_is_clamped() {
        let mut c = clock(1.0);
        c.set_speed(0.0001);
        assert_eq!(c.speed(), 0.1);
        c.set_speed(1e12);
        assert_eq!(c.speed(), 10_000_000.0);
        c.set_speed(100.0);
        c.multiply_speed(10.0);
        assert_eq!(c.speed(), 1000.0);
    }

    #[test]
    fn fade_scales_with_speed() {
        let mut c = clock(100.0);
        c.set_fade_seconds(2.0);
        assert_eq!(c.fade_duration_ms(), 200_000.0);
        c.set_speed(10.0);
        assert_eq!(c.fade_duration_ms(), 20_000.0);
        c.set_fade_seconds(-3.0);
        assert_eq!(c.fade_duration_ms(), 0.0);
    }

    #[test]
    fn tick_interval_matches_rate() {
        let c = clock(1.0);
        assert_eq!(c.tick_interval(), Duration::from_millis(100));
    }
}
