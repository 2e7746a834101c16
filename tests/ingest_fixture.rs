use quakeplay::{
    StatusLog, TimeWindow, WebMercator,
    dataset::ingest,
    geojson::parse_feature_collection,
    source::SourceKind,
};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[test]
fn usgs_week_feed_fixture_ingests() {
    let raw = parse_feature_collection(include_str!("data/sample_feed.json")).unwrap();
    let source = SourceKind::Feed {
        url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_week.geojson"
            .to_string(),
        window: None,
    };
    let mut status = StatusLog::new();
    let ds = ingest(raw, &source, &WebMercator, &mut status).unwrap();

    assert_eq!(ds.len(), 3);
    // window derived from metadata url suffix + generated timestamp
    assert_eq!(
        ds.window,
        TimeWindow::new(1_562_857_345_000 - WEEK_MS, 1_562_857_345_000)
    );
    for e in &ds.events {
        assert!(ds.window.start_ms <= e.time_ms && e.time_ms <= ds.window.end_ms);
    }
    assert_eq!(ds.events[ds.idx_mag_max].magnitude, 7.1);
    assert_eq!(ds.events[ds.idx_mag_min].magnitude, 2.8);
    assert_eq!(ds.idx_earliest, 1);
    assert_eq!(ds.idx_latest, 2);
    assert_eq!(ds.events[0].id.as_deref(), Some("ci38457511"));
    // no warnings expected from a consistent feed
    assert!(!status.has_errors());
}

#[test]
fn emsc_fixture_normalizes_iso_times_and_total_count() {
    let raw = parse_feature_collection(include_str!("data/emsc_query.json")).unwrap();
    // declared query window wider than the events
    let window = TimeWindow::new(1_563_062_400_000, 1_563_148_800_000);
    let source = SourceKind::EmscQuery {
        window,
        limit: 1000,
    };
    let mut status = StatusLog::new();
    let ds = ingest(raw, &source, &WebMercator, &mut status).unwrap();

    assert_eq!(ds.len(), 2);
    assert_eq!(ds.events[0].time_ms, 1_563_089_195_000);
    assert_eq!(ds.window, window);
    // totalCount matched the feature count, so no mismatch warning
    assert!(
        !status
            .entries()
            .iter()
            .any(|e| e.message.contains("metadata count"))
    );
}

#[test]
fn emsc_fixture_widens_narrow_declared_window() {
    let raw = parse_feature_collection(include_str!("data/emsc_query.json")).unwrap();
    // declared window ends before the last event at 09:14:02
    let source = SourceKind::EmscQuery {
        window: TimeWindow::new(1_563_062_400_000, 1_563_089_195_000),
        limit: 1000,
    };
    let mut status = StatusLog::new();
    let ds = ingest(raw, &source, &WebMercator, &mut status).unwrap();

    assert_eq!(ds.window.end_ms, 1_563_095_642_000);
    assert!(
        status
            .entries()
            .iter()
            .any(|e| e.message.contains("adjusted end"))
    );
}
