//! Quakeplay replays earthquake event data in temporal order.
//!
//! The crate ingests GeoJSON-like event feeds into a [`Dataset`], drives a
//! virtual clock ([`PlaybackClock`]) at a configurable speed multiplier, and
//! each tick reconciles per-event marker styles against a [`DisplayLayer`].
//! Map rendering, DOM controls and HTTP fetching are external collaborators
//! behind the [`Projector`], [`DisplayLayer`] and [`Scheduler`] traits.

#![forbid(unsafe_code)]

pub mod clock;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod frame;
pub mod geo;
pub mod geojson;
pub mod layer;
pub mod permalink;
pub mod query;
pub mod sched;
pub mod source;
pub mod status;
pub mod style;
pub mod timefmt;

pub use clock::{ClockConfig, PlaybackClock, SpeedRange, Tick};
pub use dataset::{Dataset, Event, TimeWindow};
pub use engine::{Engine, EngineConfig, LoadGeneration};
pub use error::{QuakeError, QuakeResult};
pub use frame::{DisplayState, MagFilter};
pub use geo::{Projector, WebMercator};
pub use geojson::FeatureCollection;
pub use layer::{DisplayLayer, MemoryLayer};
pub use sched::{ManualScheduler, Scheduler};
pub use source::SourceKind;
pub use status::{Severity, StatusEntry, StatusLog};
pub use style::{MarkerParams, MarkerStyle, Rgba, StyleCache, StyleKey};
