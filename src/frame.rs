use kurbo::Rect;

use crate::{
    dataset::Event,
    style::{MarkerParams, StyleKey},
};

/// Inclusive magnitude display filter; `None` on either side means "off".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MagFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MagFilter {
    pub fn contains(&self, mag: f64) -> bool {
        self.min.is_none_or(|m| mag >= m) && self.max.is_none_or(|m| mag <= m)
    }
}

/// Everything a frame computation depends on. Same inputs, same states:
/// recomputing a frame is idempotent.
#[derive(Clone, Copy, Debug)]
pub struct FrameParams<'a> {
    pub virtual_time_ms: f64,
    /// Fade window in virtual ms; 0 disables fading.
    pub fade_duration_ms: f64,
    pub filter: MagFilter,
    pub marker: &'a MarkerParams,
    /// Buffered viewport extent; present only when extent culling is on.
    pub cull_extent: Option<Rect>,
}

/// Per-event display state, recomputed every frame tick.
/// `style_key` is `None` exactly when the event must not be displayed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayState {
    pub style_key: Option<StyleKey>,
    pub prev_style_key: Option<StyleKey>,
    pub fade_alpha: f64,
    pub radius: f64,
    pub stroke_width: u32,
}

impl DisplayState {
    pub fn visible(&self) -> bool {
        self.style_key.is_some()
    }
}

/// Time-decay opacity, quantized to the nearest 1/32 to bound the number of
/// distinct style objects.
pub fn fade_alpha(event_time_ms: i64, virtual_time_ms: f64, fade_duration_ms: f64) -> f64 {
    if fade_duration_ms <= 0.0 {
        return 1.0;
    }
    let age = virtual_time_ms - event_time_ms as f64;
    let alpha = if age >= fade_duration_ms {
        0.0
    } else {
        ((fade_duration_ms - age) / fade_duration_ms).min(1.0)
    };
    (alpha * 32.0).round() / 32.0
}

/// Marker radius, optionally magnitude-scaled. The scale factor is rounded
/// to one decimal to limit the number of distinct radii.
pub fn scaled_radius(marker: &MarkerParams, magnitude: f64) -> f64 {
    let mut r = marker.base_radius;
    if marker.mag_scaling_enabled() && magnitude > 1.0 {
        r *= (magnitude.powf(marker.mag_scale_exponent) * 10.0).round() / 10.0;
    }
    r
}

/// Derive the display state for one event at the current virtual time.
pub fn compute_state(event: &Event, prev: Option<StyleKey>, params: &FrameParams<'_>) -> DisplayState {
    let alpha = fade_alpha(event.time_ms, params.virtual_time_ms, params.fade_duration_ms);

    let hidden = alpha == 0.0
        || event.time_ms as f64 > params.virtual_time_ms
        || !params.filter.contains(event.magnitude)
        || params
            .cull_extent
            .is_some_and(|extent| !extent.contains(event.projected));

    if hidden {
        return DisplayState {
            style_key: None,
            prev_style_key: prev,
            fade_alpha: alpha,
            radius: 0.0,
            stroke_width: params.marker.stroke_width,
        };
    }

    let radius = scaled_radius(params.marker, event.magnitude);
    DisplayState {
        style_key: Some(StyleKey::new(radius, params.marker.stroke_width, alpha)),
        prev_style_key: prev,
        fade_alpha: alpha,
        radius,
        stroke_width: params.marker.stroke_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn event(time_ms: i64, mag: f64) -> Event {
        Event {
            id: None,
            lon: 0.0,
            lat: 0.0,
            magnitude: mag,
            time_ms,
            projected: Point::new(0.0, 0.0),
        }
    }

    fn params(marker: &MarkerParams, vt: f64, fade: f64) -> FrameParams<'_> {
        FrameParams {
            virtual_time_ms: vt,
            fade_duration_ms: fade,
            filter: MagFilter::default(),
            marker,
            cull_extent: None,
        }
    }

    #[test]
    fn fade_off_is_always_opaque() {
        assert_eq!(fade_alpha(0, 1e12, 0.0), 1.0);
    }

    #[test]
    fn fade_scenario_500ms() {
        // event at t=1000, fade window 500 virtual ms
        assert_eq!(fade_alpha(1000, 1000.0, 500.0), 1.0);
        assert_eq!(fade_alpha(1000, 1250.0, 500.0), 0.5);
        assert_eq!(fade_alpha(1000, 1500.0, 500.0), 0.0);
    }

    #[test]
    fn fade_is_monotone_non_increasing() {
        let mut last = f64::INFINITY;
        let mut t = 1000.0;
        while t <= 1600.0 {
            let a = fade_alpha(1000, t, 500.0);
            assert!(a <= last);
            last = a;
            t += 10.0;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn fade_quantizes_to_32_levels() {
        let a = fade_alpha(0, 3.0, 1000.0);
        assert_eq!(a * 32.0, (a * 32.0).round());
        assert_eq!(a, 1.0); // 0.997 rounds up to the top level
    }

    #[test]
    fn event_at_current_time_is_visible() {
        let marker = MarkerParams::default();
        let st = compute_state(&event(1000, 2.0), None, &params(&marker, 1000.0, 0.0));
        assert!(st.visible());
    }

    #[test]
    fn future_event_is_hidden() {
        let marker = MarkerParams::default();
        let st = compute_state(&event(1001, 2.0), None, &params(&marker, 1000.0, 0.0));
        assert!(!st.visible());
        assert_eq!(st.style_key, None);
    }

    #[test]
    fn faded_out_event_is_hidden() {
        let marker = MarkerParams::default();
        let st = compute_state(&event(0, 2.0), None, &params(&marker, 2000.0, 500.0));
        assert!(!st.visible());
        assert_eq!(st.fade_alpha, 0.0);
    }

    #[test]
    fn mag_filter_bounds_are_inclusive() {
        let marker = MarkerParams::default();
        let mut p = params(&marker, 1000.0, 0.0);
        p.filter = MagFilter {
            min: Some(2.0),
            max: Some(5.0),
        };
        assert!(compute_state(&event(0, 2.0), None, &p).visible());
        assert!(compute_state(&event(0, 5.0), None, &p).visible());
        assert!(!compute_state(&event(0, 1.999), None, &p).visible());
        assert!(!compute_state(&event(0, 5.001), None, &p).visible());
    }

    #[test]
    fn extent_cull_hides_outside_points() {
        let marker = MarkerParams::default();
        let mut p = params(&marker, 1000.0, 0.0);
        p.cull_extent = Some(Rect::new(10.0, 10.0, 20.0, 20.0));
        assert!(!compute_state(&event(0, 2.0), None, &p).visible());
        let mut inside = event(0, 2.0);
        inside.projected = Point::new(15.0, 15.0);
        assert!(compute_state(&inside, None, &p).visible());
    }

    #[test]
    fn radius_scaling_skips_small_magnitudes() {
        let marker = MarkerParams {
            mag_scale_exponent: 2.0,
            ..MarkerParams::default()
        };
        assert_eq!(scaled_radius(&marker, 1.0), 3.0);
        assert_eq!(scaled_radius(&marker, 0.5), 3.0);
        // 3^2 = 9.0, factor rounded to one decimal
        assert_eq!(scaled_radius(&marker, 3.0), 27.0);
        let off = MarkerParams::default();
        assert_eq!(scaled_radius(&off, 3.0), 3.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let marker = MarkerParams::default();
        let p = params(&marker, 1200.0, 500.0);
        let ev = event(1000, 2.0);
        let a = compute_state(&ev, None, &p);
        let b = compute_state(&ev, a.style_key, &p);
        assert_eq!(a.style_key, b.style_key);
        assert_eq!(a.fade_alpha, b.fade_alpha);
        assert_eq!(a.radius, b.radius);
    }

    #[test]
    fn visibility_scenario_three_events() {
        let marker = MarkerParams::default();
        let events = [event(0, 1.0), event(1000, 3.0), event(2000, 5.0)];
        let p = params(&marker, 1000.0, 0.0);
        let visible: Vec<bool> = events
            .iter()
            .map(|e| compute_state(e, None, &p).visible())
            .collect();
        assert_eq!(visible, vec![true, true, false]);

        let p = params(&marker, 2000.0, 0.0);
        let visible: Vec<bool> = events
            .iter()
            .map(|e| compute_state(e, None, &p).visible())
            .collect();
        assert_eq!(visible, vec![true, true, true]);
    }
}
