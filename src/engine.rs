use kurbo::Rect;

use crate::{
    clock::{ClockConfig, PlaybackClock, Tick},
    dataset::{self, Dataset},
    error::QuakeResult,
    frame::{self, DisplayState, FrameParams, MagFilter},
    geo::{Projector, marker_buffer_extent},
    geojson::FeatureCollection,
    layer::DisplayLayer,
    sched::Scheduler,
    source::SourceKind,
    status::StatusLog,
    style::{MarkerParams, StyleCache},
    timefmt::fmt_utc_ms,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineConfig {
    pub clock: ClockConfig,
    pub marker: MarkerParams,
}

/// Ticket for one load attempt. A completion carrying a stale ticket is
/// discarded, so a late response can never repopulate the engine after the
/// user moved on to a different source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadGeneration(u64);

/// One replay engine instance: dataset, clock, style cache and per-event
/// display state. No process-wide state; create as many as needed.
///
/// Collaborators are passed in at the call sites that need them: the display
/// layer for anything that renders, the scheduler for anything that starts
/// or stops the repeating tick.
#[derive(Debug)]
pub struct Engine {
    clock: PlaybackClock,
    dataset: Option<Dataset>,
    states: Vec<DisplayState>,
    styles: StyleCache,
    marker: MarkerParams,
    filter: MagFilter,
    cull_extent: Option<Rect>,
    loop_enabled: bool,
    status: StatusLog,
    load_gen: u64,
    needs_full_render: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            clock: PlaybackClock::new(config.clock),
            dataset: None,
            states: Vec::new(),
            styles: StyleCache::new(),
            marker: config.marker,
            filter: MagFilter::default(),
            cull_extent: None,
            loop_enabled: false,
            status: StatusLog::new(),
            load_gen: 0,
            needs_full_render: false,
        }
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn drain_status(&mut self) -> Vec<crate::status::StatusEntry> {
        self.status.take()
    }

    pub fn display_state(&self, index: usize) -> Option<&DisplayState> {
        self.states.get(index)
    }

    pub fn visible_count(&self) -> usize {
        self.states.iter().filter(|s| s.visible()).count()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_running()
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    pub fn style_cache_len(&self) -> usize {
        self.styles.len()
    }

    // ---- load lifecycle ------------------------------------------------

    /// Stop playback, clear prior state and hand out a fresh generation.
    /// Exactly one in-flight load's completion should later be committed
    /// with this ticket.
    pub fn begin_load(
        &mut self,
        sched: &mut dyn Scheduler,
        layer: &mut dyn DisplayLayer,
    ) -> LoadGeneration {
        self.stop(sched);
        self.clear(layer);
        self.load_gen += 1;
        LoadGeneration(self.load_gen)
    }

    /// Commit a completed load. Returns whether a dataset was installed.
    /// Any failure clears the engine so it never operates on a partially
    /// ingested dataset.
    #[tracing::instrument(skip_all, fields(source = %source.label()))]
    pub fn commit_load(
        &mut self,
        generation: LoadGeneration,
        payload: QuakeResult<FeatureCollection>,
        source: &SourceKind,
        projector: &dyn Projector,
        layer: &mut dyn DisplayLayer,
    ) -> bool {
        if generation.0 != self.load_gen {
            self.status
                .warn(format!("stale response for {} discarded", source.label()));
            return false;
        }
        let raw = match payload {
            Ok(raw) => raw,
            Err(err) => {
                self.status
                    .error(format!("failed to load {}: {err}", source.label()));
                self.clear(layer);
                return false;
            }
        };
        match dataset::ingest(raw, source, projector, &mut self.status) {
            Ok(ds) => {
                let end_ms = ds.window.end_ms as f64;
                let window = ds.window;
                self.states = vec![DisplayState::default(); ds.len()];
                self.dataset = Some(ds);
                // jump to the end so the whole dataset shows at once
                self.clock.seek_to(end_ms, window);
                self.refresh(layer);
                true
            }
            Err(err) => {
                self.status.error(err.to_string());
                self.clear(layer);
                false
            }
        }
    }

    /// Back to the empty state. Safe to call at any time, including before
    /// the first load.
    pub fn clear(&mut self, layer: &mut dyn DisplayLayer) {
        self.dataset = None;
        self.states.clear();
        self.styles.clear();
        self.clock.reset();
        layer.clear();
    }

    // ---- playback ------------------------------------------------------

    pub fn start(&mut self, sched: &mut dyn Scheduler) {
        let Some(window) = self.dataset.as_ref().map(|d| d.window) else {
            self.status.info("no data loaded");
            return;
        };
        if self.clock.is_running() {
            self.status.info("already playing");
            return;
        }
        self.clock.start(window);
        self.needs_full_render = true;
        sched.start(self.clock.tick_interval());
        self.status.info(format!(
            "playing from {} at {}x",
            fmt_utc_ms(self.clock.virtual_time_ms() as i64),
            self.clock.speed()
        ));
    }

    pub fn stop(&mut self, sched: &mut dyn Scheduler) {
        sched.cancel();
        self.clock.stop();
    }

    pub fn toggle(&mut self, sched: &mut dyn Scheduler) {
        if self.clock.is_running() {
            self.stop(sched);
        } else {
            self.start(sched);
        }
    }

    /// Stop and rewind to the window start, re-rendering the first frame.
    pub fn reset(&mut self, sched: &mut dyn Scheduler, layer: &mut dyn DisplayLayer) {
        self.stop(sched);
        if let Some(window) = self.dataset.as_ref().map(|d| d.window) {
            self.clock.seek_to(window.start_ms as f64, window);
            self.refresh(layer);
        }
    }

    /// One animation tick: render the current frame, then advance the
    /// clock. Crossing the window end stops playback, or restarts it from
    /// the top when looping.
    pub fn tick(&mut self, sched: &mut dyn Scheduler, layer: &mut dyn DisplayLayer) {
        let Some(window) = self.dataset.as_ref().map(|d| d.window) else {
            return;
        };
        if !self.clock.is_running() {
            return;
        }
        if self.needs_full_render {
            self.needs_full_render = false;
            self.full_recompute(layer);
        } else {
            self.refresh(layer);
        }
        if self.clock.advance(window) == Tick::Finished {
            self.status.info("done");
            self.stop(sched);
            if self.loop_enabled {
                self.start(sched);
            }
        }
    }

    // ---- seeking -------------------------------------------------------

    pub fn seek_to(&mut self, time_ms: f64, sched: &mut dyn Scheduler, layer: &mut dyn DisplayLayer) {
        let Some(window) = self.dataset.as_ref().map(|d| d.window) else {
            return;
        };
        let was_playing = self.clock.is_running();
        self.stop(sched);
        self.clock.seek_to(time_ms, window);
        if was_playing {
            // restart so the timer phase resets
            self.start(sched);
        } else {
            self.refresh(layer);
        }
    }

    pub fn seek_fraction(
        &mut self,
        fraction: f64,
        sched: &mut dyn Scheduler,
        layer: &mut dyn DisplayLayer,
    ) {
        let Some(window) = self.dataset.as_ref().map(|d| d.window) else {
            return;
        };
        let f = fraction.clamp(0.0, 1.0);
        self.seek_to(
            window.start_ms as f64 + window.span_ms() as f64 * f,
            sched,
            layer,
        );
    }

    /// Step by `n` seconds of real playback time at the current speed.
    pub fn seek_step(&mut self, n: f64, sched: &mut dyn Scheduler, layer: &mut dyn DisplayLayer) {
        let offset =
            n * f64::from(self.clock.ticks_per_second()) * self.clock.step_per_tick_ms();
        self.seek_to(self.clock.virtual_time_ms() + offset, sched, layer);
    }

    // ---- parameters ----------------------------------------------------

    pub fn set_speed(&mut self, multiplier: f64, sched: &mut dyn Scheduler, layer: &mut dyn DisplayLayer) {
        self.clock.set_speed(multiplier);
        self.restart_if_running(sched, layer);
    }

    pub fn multiply_speed(&mut self, factor: f64, sched: &mut dyn Scheduler, layer: &mut dyn DisplayLayer) {
        self.clock.multiply_speed(factor);
        self.restart_if_running(sched, layer);
    }

    pub fn set_fade_seconds(&mut self, seconds: f64, layer: &mut dyn DisplayLayer) {
        self.clock.set_fade_seconds(seconds);
        self.refresh(layer);
    }

    pub fn set_mag_filter(&mut self, filter: MagFilter, layer: &mut dyn DisplayLayer) {
        self.filter = filter;
        self.refresh(layer);
    }

    /// Changing marker appearance invalidates every cached style.
    pub fn set_marker_params(&mut self, params: MarkerParams, layer: &mut dyn DisplayLayer) {
        self.marker = params;
        self.full_recompute(layer);
    }

    /// Update the cull extent from the viewport. `None` disables extent
    /// culling. While stopped, re-renders so pan/zoom stays in sync.
    pub fn set_viewport(
        &mut self,
        extent: Option<Rect>,
        resolution: f64,
        layer: &mut dyn DisplayLayer,
    ) {
        self.cull_extent = extent.map(|e| marker_buffer_extent(e, resolution));
        if !self.clock.is_running() {
            self.refresh(layer);
        }
    }

    fn restart_if_running(&mut self, sched: &mut dyn Scheduler, layer: &mut dyn DisplayLayer) {
        if self.clock.is_running() {
            self.stop(sched);
            self.start(sched);
        } else {
            self.refresh(layer);
        }
    }

    // ---- rendering -----------------------------------------------------

    /// Recompute every event's display state for the current virtual time
    /// and reconcile the display layer: remove the newly hidden, add the
    /// newly visible, restyle only where the style key changed.
    pub fn refresh(&mut self, layer: &mut dyn DisplayLayer) {
        let Some(dataset) = self.dataset.as_ref() else {
            return;
        };
        let params = FrameParams {
            virtual_time_ms: self.clock.virtual_time_ms(),
            fade_duration_ms: self.clock.fade_duration_ms(),
            filter: self.filter,
            marker: &self.marker,
            cull_extent: self.cull_extent,
        };
        for (i, event) in dataset.events.iter().enumerate() {
            let prev = self.states[i].style_key;
            let state = frame::compute_state(event, prev, &params);
            self.states[i] = state;
            match state.style_key {
                None => {
                    if layer.contains(i) {
                        layer.remove(i);
                    }
                }
                Some(key) => {
                    if !layer.contains(i) {
                        let style = self.styles.get_or_build(key, &self.marker);
                        layer.add(i, event.projected, style);
                    } else if state.prev_style_key != Some(key) {
                        let style = self.styles.get_or_build(key, &self.marker);
                        layer.set_style(i, style);
                    }
                }
            }
        }
    }

    /// Drop every cached style and displayed marker, then re-render. Used
    /// whenever cached styles may be stale.
    pub fn full_recompute(&mut self, layer: &mut dyn DisplayLayer) {
        if self.dataset.is_none() {
            return;
        }
        self.styles.clear();
        layer.clear();
        self.refresh(layer);
    }
}
