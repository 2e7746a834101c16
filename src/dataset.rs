use kurbo::Point;

use crate::{
    error::{QuakeError, QuakeResult},
    geo::Projector,
    geojson::FeatureCollection,
    source::{SourceKind, feed_window_days},
    status::StatusLog,
    timefmt::fmt_utc_ms,
};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Inclusive replay window, epoch ms. Always covers every ingested event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn span_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// One ingested event. Immutable after ingestion; per-frame display state
/// lives with the engine, not here.
#[derive(Clone, Debug)]
pub struct Event {
    pub id: Option<String>,
    pub lon: f64,
    pub lat: f64,
    pub magnitude: f64,
    pub time_ms: i64,
    /// Display coordinates, projected once at ingest.
    pub projected: Point,
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub events: Vec<Event>,
    pub window: TimeWindow,
    pub idx_earliest: usize,
    pub idx_latest: usize,
    pub idx_mag_min: usize,
    pub idx_mag_max: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn mag_min(&self) -> f64 {
        self.events[self.idx_mag_min].magnitude
    }

    pub fn mag_max(&self) -> f64 {
        self.events[self.idx_mag_max].magnitude
    }

    pub fn earliest_ms(&self) -> i64 {
        self.events[self.idx_earliest].time_ms
    }

    pub fn latest_ms(&self) -> i64 {
        self.events[self.idx_latest].time_ms
    }
}

/// One-time ingestion: validate the payload, normalize dialect differences,
/// project coordinates, scan for extremes and resolve the replay window.
///
/// Warnings and progress land in `status`; a returned error means the caller
/// must clear any engine state so nothing operates on a partial dataset.
#[tracing::instrument(skip_all, fields(source = %source.label()))]
pub fn ingest(
    raw: FeatureCollection,
    source: &SourceKind,
    projector: &dyn Projector,
    status: &mut StatusLog,
) -> QuakeResult<Dataset> {
    let Some(metadata) = raw.metadata else {
        return Err(QuakeError::ingest("data does not appear to be valid"));
    };
    let Some(features) = raw.features else {
        return Err(QuakeError::ingest("data does not appear to be valid"));
    };
    if features.is_empty() {
        // same behavior either way, the message just names the cause
        return Err(if source.is_query() {
            QuakeError::ingest("query returned 0 earthquakes")
        } else {
            QuakeError::ingest("data contains 0 earthquakes")
        });
    }
    if raw.kind.as_deref() != Some("FeatureCollection") {
        status.warn("data.type is not FeatureCollection");
    }
    if let Some(declared) = metadata.declared_count() {
        if declared != features.len() as u64 {
            status.warn(format!(
                "metadata count {declared} != features length {}",
                features.len()
            ));
        }
    }

    let mut events = Vec::with_capacity(features.len());
    let mut idx_earliest = 0usize;
    let mut idx_latest = 0usize;
    let mut idx_mag_min = 0usize;
    let mut idx_mag_max = 0usize;
    for (i, feature) in features.into_iter().enumerate() {
        if feature.geometry.coordinates.len() < 2 {
            return Err(QuakeError::ingest(format!(
                "feature {i} has no usable coordinates"
            )));
        }
        let lon = feature.geometry.coordinates[0];
        let lat = feature.geometry.coordinates[1];
        let time_ms = feature.properties.time.to_epoch_ms()?;
        let event = Event {
            id: feature.id,
            lon,
            lat,
            magnitude: feature.properties.mag,
            time_ms,
            projected: projector.project(lon, lat),
        };
        // strict comparisons: first-seen index wins ties
        if events
            .get(idx_earliest)
            .is_some_and(|e: &Event| e.time_ms > event.time_ms)
        {
            idx_earliest = i;
        }
        if events.get(idx_latest).is_some_and(|e| e.time_ms < event.time_ms) {
            idx_latest = i;
        }
        if events
            .get(idx_mag_min)
            .is_some_and(|e| e.magnitude > event.magnitude)
        {
            idx_mag_min = i;
        }
        if events
            .get(idx_mag_max)
            .is_some_and(|e| e.magnitude < event.magnitude)
        {
            idx_mag_max = i;
        }
        events.push(event);
    }

    status.info(format!(
        "Loaded {} quakes from {} M {} - {}",
        events.len(),
        source.label(),
        events[idx_mag_min].magnitude,
        events[idx_mag_max].magnitude
    ));

    if let Some(limit) = source.result_limit() {
        if events.len() as u64 == u64::from(limit) {
            status.warn("max results limit hit");
        }
    }

    let earliest_ms = events[idx_earliest].time_ms;
    let latest_ms = events[idx_latest].time_ms;
    let window = resolve_window(source, &metadata, earliest_ms, latest_ms, status);

    status.info(format!(
        "Date range {} - {}",
        fmt_utc_ms(window.start_ms),
        fmt_utc_ms(window.end_ms)
    ));

    Ok(Dataset {
        events,
        window,
        idx_earliest,
        idx_latest,
        idx_mag_min,
        idx_mag_max,
    })
}

/// Window policy: declared window first (widened over any stray event), then
/// feed-suffix heuristic, then the event span itself.
fn resolve_window(
    source: &SourceKind,
    metadata: &crate::geojson::Metadata,
    earliest_ms: i64,
    latest_ms: i64,
    status: &mut StatusLog,
) -> TimeWindow {
    let mut declared = source.declared_window();

    if declared.is_none() {
        if let SourceKind::Feed { .. } = source {
            let days = metadata.url.as_deref().and_then(feed_window_days);
            if let (Some(days), Some(generated)) = (days, metadata.generated) {
                declared = Some(TimeWindow::new(generated - days * DAY_MS, generated));
            }
        }
    }

    match declared {
        None => {
            if !source.is_user_supplied() {
                status.warn("failed to detect start/end, using event times");
            }
            let end_ms = if earliest_ms == latest_ms {
                // keep the span non-degenerate
                latest_ms + 1000
            } else {
                latest_ms
            };
            TimeWindow::new(earliest_ms, end_ms)
        }
        Some(mut window) => {
            if earliest_ms < window.start_ms {
                window.start_ms = earliest_ms;
                status.warn(format!(
                    "adjusted start to first event {}",
                    fmt_utc_ms(earliest_ms)
                ));
            }
            if latest_ms > window.end_ms {
                window.end_ms = latest_ms;
                status.warn(format!(
                    "adjusted end to last event {}",
                    fmt_utc_ms(latest_ms)
                ));
            }
            window
        }
    }
}
