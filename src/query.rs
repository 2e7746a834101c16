use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::{
    dataset::TimeWindow,
    error::{QuakeError, QuakeResult},
};

pub const USGS_QUERY_BASE: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query.geojson?";
pub const EMSC_QUERY_BASE: &str =
    "https://www.seismicportal.eu/fdsnws/event/1/query?format=json&nodata=404&";

pub const MIN_RESULT_LIMIT: u32 = 1;
pub const MAX_RESULT_LIMIT: u32 = 20_000;
const MIN_MAGNITUDE_FLOOR: f64 = -2.0;
const MIN_MAGNITUDE_CEIL: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Catalog {
    Usgs,
    Emsc,
}

impl Catalog {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Usgs => USGS_QUERY_BASE,
            Self::Emsc => EMSC_QUERY_BASE,
        }
    }
}

/// Spatial filter for a catalog query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QueryBounds {
    None,
    Bbox {
        north: f64,
        south: f64,
        east: f64,
        west: f64,
    },
    RadiusKm {
        lat: f64,
        lon: f64,
        km: f64,
    },
    RadiusDeg {
        lat: f64,
        lon: f64,
        deg: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderBy {
    Time,
    TimeAsc,
    Magnitude,
    MagnitudeAsc,
}

impl OrderBy {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::TimeAsc => "time-asc",
            Self::Magnitude => "magnitude",
            Self::MagnitudeAsc => "magnitude-asc",
        }
    }
}

/// A bounding query against an external event catalog. Validation failures
/// block the request with a message; nothing here panics.
#[derive(Clone, Debug)]
pub struct CatalogQuery {
    pub catalog: Catalog,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_magnitude: f64,
    pub max_magnitude: Option<f64>,
    pub bounds: QueryBounds,
    pub limit: u32,
    pub order: OrderBy,
}

impl CatalogQuery {
    pub fn validate(&self) -> QuakeResult<()> {
        if self.end <= self.start {
            return Err(QuakeError::query(format!(
                "end time {} not after start time {}",
                self.end.to_rfc3339(),
                self.start.to_rfc3339()
            )));
        }
        if !(MIN_MAGNITUDE_FLOOR..=MIN_MAGNITUDE_CEIL).contains(&self.min_magnitude) {
            return Err(QuakeError::query(format!(
                "invalid min mag {}",
                self.min_magnitude
            )));
        }
        if let Some(max) = self.max_magnitude {
            if max < self.min_magnitude {
                return Err(QuakeError::query(format!(
                    "invalid max mag {max} < min {}",
                    self.min_magnitude
                )));
            }
        }
        if !(MIN_RESULT_LIMIT..=MAX_RESULT_LIMIT).contains(&self.limit) {
            return Err(QuakeError::query(format!(
                "invalid limit count {}",
                self.limit
            )));
        }
        // EMSC does not support km-radius filters.
        if self.catalog == Catalog::Emsc && matches!(self.bounds, QueryBounds::RadiusKm { .. }) {
            return Err(QuakeError::query("emsc catalog does not support km radius"));
        }
        Ok(())
    }

    /// Requested window, for widening checks against the returned events.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start.timestamp_millis(), self.end.timestamp_millis())
    }

    pub fn to_url(&self) -> QuakeResult<String> {
        self.validate()?;
        let mut url = String::from(self.catalog.base_url());
        url.push_str("starttime=");
        url.push_str(&self.start.to_rfc3339_opts(SecondsFormat::Millis, true));
        url.push_str("&endtime=");
        url.push_str(&self.end.to_rfc3339_opts(SecondsFormat::Millis, true));
        url.push_str(&format!("&minmagnitude={}", self.min_magnitude));
        if let Some(max) = self.max_magnitude {
            url.push_str(&format!("&maxmagnitude={max}"));
        }
        match self.bounds {
            QueryBounds::None => {}
            QueryBounds::Bbox {
                north,
                south,
                east,
                west,
            } => {
                // a box crossing the antimeridian shifts its west edge down
                let mut min_lng = west;
                if min_lng > east {
                    min_lng -= 360.0;
                }
                url.push_str(&format!(
                    "&minlongitude={min_lng}&maxlatitude={north}&maxlongitude={east}&minlatitude={south}"
                ));
            }
            QueryBounds::RadiusKm { lat, lon, km } => {
                url.push_str(&format!("&latitude={lat}&longitude={lon}&maxradiuskm={km}"));
            }
            QueryBounds::RadiusDeg { lat, lon, deg } => {
                url.push_str(&format!("&latitude={lat}&longitude={lon}&maxradius={deg}"));
            }
        }
        url.push_str(&format!("&limit={}", self.limit));
        url.push_str(&format!("&orderby={}", self.order.as_param()));
        Ok(url)
    }
}

/// Parse a UTC instant from the forms a user types: `YYYY-MM-DD`
/// (midnight), `YYYY-MM-DDTHH:MM`, or full RFC 3339.
pub fn parse_utc_datetime(s: &str) -> QuakeResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(QuakeError::query(format!("failed to parse date '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_query() -> CatalogQuery {
        CatalogQuery {
            catalog: Catalog::Usgs,
            start: parse_utc_datetime("1989-10-17T23:00").unwrap(),
            end: parse_utc_datetime("1989-10-18T23:00").unwrap(),
            min_magnitude: 0.0,
            max_magnitude: None,
            bounds: QueryBounds::None,
            limit: 20_000,
            order: OrderBy::Time,
        }
    }

    #[test]
    fn url_has_expected_params() {
        let url = basic_query().to_url().unwrap();
        assert!(url.starts_with(USGS_QUERY_BASE));
        assert!(url.contains("starttime=1989-10-17T23:00:00.000Z"));
        assert!(url.contains("endtime=1989-10-18T23:00:00.000Z"));
        assert!(url.contains("&minmagnitude=0"));
        assert!(url.contains("&limit=20000"));
        assert!(url.ends_with("&orderby=time"));
    }

    #[test]
    fn bbox_crossing_antimeridian_shifts_west() {
        let mut q = basic_query();
        q.bounds = QueryBounds::Bbox {
            north: 40.0,
            south: 30.0,
            east: -170.0,
            west: 170.0,
        };
        let url = q.to_url().unwrap();
        assert!(url.contains("minlongitude=-190"));
        assert!(url.contains("maxlongitude=-170"));
    }

    #[test]
    fn limit_out_of_range_is_rejected() {
        let mut q = basic_query();
        q.limit = 0;
        assert!(q.to_url().is_err());
        q.limit = 20_001;
        assert!(q.to_url().is_err());
    }

    #[test]
    fn max_below_min_is_rejected() {
        let mut q = basic_query();
        q.min_magnitude = 4.0;
        q.max_magnitude = Some(2.0);
        assert!(matches!(q.validate(), Err(QuakeError::Query(_))));
    }

    #[test]
    fn min_mag_outside_catalog_range_is_rejected() {
        let mut q = basic_query();
        q.min_magnitude = 11.0;
        assert!(q.validate().is_err());
    }

    #[test]
    fn end_not_after_start_is_rejected() {
        let mut q = basic_query();
        q.end = q.start;
        assert!(q.validate().is_err());
    }

    #[test]
    fn emsc_rejects_km_radius() {
        let mut q = basic_query();
        q.catalog = Catalog::Emsc;
        q.bounds = QueryBounds::RadiusKm {
            lat: 35.0,
            lon: -117.0,
            km: 200.0,
        };
        assert!(q.validate().is_err());
        q.bounds = QueryBounds::RadiusDeg {
            lat: 35.0,
            lon: -117.0,
            deg: 2.0,
        };
        assert!(q.validate().is_ok());
        assert!(q.to_url().unwrap().starts_with(EMSC_QUERY_BASE));
    }

    #[test]
    fn date_forms_parse() {
        assert!(parse_utc_datetime("2019-07-04").is_ok());
        assert!(parse_utc_datetime("2019-07-04T17:33").is_ok());
        assert!(parse_utc_datetime("2019-07-04T17:33:49.000Z").is_ok());
        assert!(parse_utc_datetime("July 4th").is_err());
    }

    #[test]
    fn query_window_matches_times() {
        let q = basic_query();
        let w = q.window();
        assert_eq!(w.end_ms - w.start_ms, 86_400_000);
    }
}
