use crate::error::{QuakeError, QuakeResult};

/// Decoded feed payload, before indexing. Fields the validation step needs to
/// report as missing (rather than fail deserialization on) are optional here.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub features: Option<Vec<Feature>>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub count: Option<u64>,
    /// EMSC supplies the total under a different name.
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<u64>,
    /// Feed generation timestamp, epoch ms.
    #[serde(default)]
    pub generated: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Metadata {
    /// Declared record count, normalized across feed dialects.
    pub fn declared_count(&self) -> Option<u64> {
        self.total_count.or(self.count)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// `[lon, lat]` or `[lon, lat, depth]`.
    pub coordinates: Vec<f64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Properties {
    pub time: TimeValue,
    pub mag: f64,
    #[serde(default)]
    pub place: Option<String>,
}

/// USGS gives epoch milliseconds; EMSC gives ISO-8601 strings like
/// `2019-07-14T07:26:35.0Z`. Both normalize to epoch ms before indexing.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    EpochMs(i64),
    Iso(String),
}

impl TimeValue {
    pub fn to_epoch_ms(&self) -> QuakeResult<i64> {
        match self {
            Self::EpochMs(ms) => Ok(*ms),
            Self::Iso(s) => chrono::DateTime::parse_from_rfc3339(s)
                .map(|d| d.timestamp_millis())
                .map_err(|e| QuakeError::ingest(format!("failed to parse time '{s}': {e}"))),
        }
    }
}

/// Decode feed text. A parse failure reports the same way as a failed fetch.
pub fn parse_feature_collection(text: &str) -> QuakeResult<FeatureCollection> {
    serde_json::from_str(text)
        .map_err(|e| QuakeError::serde(format!("data does not appear to be valid: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_usgs_shape() {
        let text = r#"{
            "type": "FeatureCollection",
            "metadata": {"generated": 1000, "count": 1, "url": "https://example/2.5_week.geojson"},
            "features": [{
                "type": "Feature",
                "id": "ci12345",
                "geometry": {"type": "Point", "coordinates": [-117.6, 35.77, 8.2]},
                "properties": {"time": 1562800000000, "mag": 4.5, "place": "Ridgecrest"}
            }]
        }"#;
        let fc = parse_feature_collection(text).unwrap();
        assert_eq!(fc.kind.as_deref(), Some("FeatureCollection"));
        let features = fc.features.unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].properties.time.to_epoch_ms().unwrap(), 1_562_800_000_000);
        assert_eq!(features[0].geometry.coordinates[0], -117.6);
    }

    #[test]
    fn normalizes_emsc_iso_time_and_total_count() {
        let text = r#"{
            "type": "FeatureCollection",
            "metadata": {"totalCount": 2},
            "features": [{
                "geometry": {"coordinates": [25.3, 38.9]},
                "properties": {"time": "2019-07-14T07:26:35.0Z", "mag": 3.1}
            }]
        }"#;
        let fc = parse_feature_collection(text).unwrap();
        assert_eq!(fc.metadata.as_ref().unwrap().declared_count(), Some(2));
        let t = fc.features.unwrap()[0].properties.time.to_epoch_ms().unwrap();
        assert_eq!(t, 1_563_089_195_000);
    }

    #[test]
    fn bad_iso_time_is_an_ingest_error() {
        let v = TimeValue::Iso("yesterday-ish".to_string());
        assert!(matches!(v.to_epoch_ms(), Err(QuakeError::Ingest(_))));
    }

    #[test]
    fn garbage_is_a_serde_error() {
        assert!(matches!(
            parse_feature_collection("not json"),
            Err(QuakeError::Serde(_))
        ));
    }

    #[test]
    fn missing_sections_deserialize_as_none() {
        let fc = parse_feature_collection(r#"{"type": "FeatureCollection"}"#).unwrap();
        assert!(fc.metadata.is_none());
        assert!(fc.features.is_none());
    }
}
