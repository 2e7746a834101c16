use crate::dataset::TimeWindow;

/// Where a payload came from, and the fields that only that kind carries.
/// Query kinds know their requested window and result limit; feeds may carry
/// a fixed window; user-supplied data carries nothing but a label.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SourceKind {
    Feed {
        url: String,
        #[serde(default)]
        window: Option<TimeWindow>,
    },
    UsgsQuery {
        window: TimeWindow,
        limit: u32,
    },
    EmscQuery {
        window: TimeWindow,
        limit: u32,
    },
    UserUrl {
        url: String,
    },
    UserFile {
        name: String,
    },
}

impl SourceKind {
    pub fn declared_window(&self) -> Option<TimeWindow> {
        match self {
            Self::Feed { window, .. } => *window,
            Self::UsgsQuery { window, .. } | Self::EmscQuery { window, .. } => Some(*window),
            Self::UserUrl { .. } | Self::UserFile { .. } => None,
        }
    }

    pub fn result_limit(&self) -> Option<u32> {
        match self {
            Self::UsgsQuery { limit, .. } | Self::EmscQuery { limit, .. } => Some(*limit),
            _ => None,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::UsgsQuery { .. } | Self::EmscQuery { .. })
    }

    /// User-supplied data carries no metadata; window-detection fallbacks
    /// skip their warning for these.
    pub fn is_user_supplied(&self) -> bool {
        matches!(self, Self::UserUrl { .. } | Self::UserFile { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Feed { url, .. } | Self::UserUrl { url } => url,
            Self::UsgsQuery { .. } => "usgs-query",
            Self::EmscQuery { .. } => "emsc-query",
            Self::UserFile { name } => name,
        }
    }
}

/// Days implied by the summary-feed naming convention.
pub fn feed_window_days(url: &str) -> Option<i64> {
    if url.ends_with("_week.geojson") {
        Some(7)
    } else if url.ends_with("_day.geojson") {
        Some(1)
    } else if url.ends_with("_month.geojson") {
        Some(30)
    } else {
        None
    }
}

/// A built-in feed with a stable id usable in permalinks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub url: &'static str,
    /// Fixed window for snapshot feeds whose url carries no span suffix.
    pub window: Option<TimeWindow>,
    pub view: Option<&'static str>,
    pub is_default: bool,
}

impl SourceEntry {
    pub fn to_kind(&self) -> SourceKind {
        SourceKind::Feed {
            url: self.url.to_string(),
            window: self.window,
        }
    }
}

/// Initial map position associated with some snapshot feeds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewPreset {
    pub id: &'static str,
    pub lon: f64,
    pub lat: f64,
    pub zoom: u8,
}

pub const VIEW_PRESETS: &[ViewPreset] = &[
    ViewPreset {
        id: "lomaprieta",
        lon: -121.87,
        lat: 37.16,
        zoom: 10,
    },
    ViewPreset {
        id: "california",
        lon: -118.76,
        lat: 37.20,
        zoom: 5,
    },
    ViewPreset {
        id: "ridgecrest",
        lon: -117.6,
        lat: 35.77,
        zoom: 8,
    },
];

pub fn builtin_sources() -> Vec<SourceEntry> {
    vec![
        SourceEntry {
            id: "loma-1d-all",
            title: "All Loma Prieta, 24h from Oct 17 1989, 4PM",
            url: "/assets/json/lomaprieta-19891017-1600-all_day.geojson.json",
            // 1989-10-17T23:00:00Z .. 1989-10-18T23:00:00Z
            window: Some(TimeWindow::new(624_668_400_000, 624_754_800_000)),
            view: Some("lomaprieta"),
            is_default: false,
        },
        SourceEntry {
            id: "loma-1w-10",
            title: "M1.0+ Loma Prieta, Week from Oct 17 1989",
            url: "/assets/json/lomaprieta-19891017-1.0_week.geojson.json",
            // 1989-10-17T07:00:00Z .. 1989-10-24T06:59:00Z
            window: Some(TimeWindow::new(624_610_800_000, 625_215_540_000)),
            view: Some("lomaprieta"),
            is_default: false,
        },
        SourceEntry {
            id: "ridgecrest-7d-25",
            title: "M2.5+ Ridgecrest Week from July 4",
            url: "/assets/json/20190711-0000-2.5_week.geojson.json",
            window: None,
            view: Some("ridgecrest"),
            is_default: false,
        },
        SourceEntry {
            id: "ridgecrest-7d-10",
            title: "M1.0+ Ridgecrest Week from July 4",
            url: "/assets/json/20190711-0000-1.0_week.geojson.json",
            window: None,
            view: Some("ridgecrest"),
            is_default: false,
        },
        SourceEntry {
            id: "usgs-feed-1d-45",
            title: "M4.5+ Earthquakes Past Day",
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_day.geojson",
            window: None,
            view: None,
            is_default: false,
        },
        SourceEntry {
            id: "usgs-feed-1d-25",
            title: "M2.5+ Earthquakes Past Day",
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_day.geojson",
            window: None,
            view: None,
            is_default: false,
        },
        SourceEntry {
            id: "usgs-feed-1w-45",
            title: "M4.5+ Earthquakes Past Week",
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_week.geojson",
            window: None,
            view: None,
            is_default: false,
        },
        SourceEntry {
            id: "usgs-feed-1w-25",
            title: "M2.5+ Earthquakes Past Week",
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_week.geojson",
            window: None,
            view: None,
            is_default: true,
        },
        SourceEntry {
            id: "usgs-feed-1m-25",
            title: "M2.5+ Earthquakes Past Month",
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_month.geojson",
            window: None,
            view: None,
            is_default: false,
        },
    ]
}

pub fn find_source(id: &str) -> Option<SourceEntry> {
    builtin_sources().into_iter().find(|s| s.id == id)
}

pub fn default_source() -> SourceEntry {
    let sources = builtin_sources();
    sources
        .iter()
        .find(|s| s.is_default)
        .cloned()
        .unwrap_or_else(|| sources[0].clone())
}

pub fn view_preset(id: &str) -> Option<ViewPreset> {
    VIEW_PRESETS.iter().copied().find(|v| v.id == id)
}
