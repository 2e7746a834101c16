use kurbo::{Point, Rect};

/// Pixel buffer added around the viewport so slightly off-screen markers
/// still render while panning.
pub const MARKER_BUFFER_PX: f64 = 250.0;

/// Reprojection of geographic coordinates into display coordinates is owned
/// by the map collaborator; the engine only stores the result per event.
pub trait Projector {
    fn project(&self, lon: f64, lat: f64) -> Point;
}

/// Spherical Web-Mercator (EPSG:3857), the projection used by the usual tile
/// layers. Good enough for marker placement and extent tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebMercator;

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MAX_LATITUDE_DEG: f64 = 85.051_128_779_806_6;

impl Projector for WebMercator {
    fn project(&self, lon: f64, lat: f64) -> Point {
        let lat = lat.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG);
        let x = EARTH_RADIUS_M * lon.to_radians();
        let y = EARTH_RADIUS_M
            * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
                .tan()
                .ln();
        Point::new(x, y)
    }
}

/// Wrap a longitude into [-180, 180) when the map repeats across worlds.
pub fn wrap_lon(value: f64) -> f64 {
    let worlds = ((value + 180.0) / 360.0).floor();
    value - worlds * 360.0
}

/// Viewport extent grown by [`MARKER_BUFFER_PX`] at the given resolution
/// (projected units per pixel).
pub fn marker_buffer_extent(extent: Rect, resolution: f64) -> Rect {
    let pad = MARKER_BUFFER_PX * resolution;
    extent.inflate(pad, pad)
}
