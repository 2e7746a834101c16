use std::collections::HashMap;

use crate::error::{QuakeError, QuakeResult};

/// Marker color; alpha stays fractional so it can be scaled by fade.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` (leading `#` optional) with alpha 1.
    pub fn from_hex(s: &str) -> QuakeResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(QuakeError::validation(format!("failed to parse color '{s}'")));
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| QuakeError::validation(format!("failed to parse color '{s}': {e}")))
        };
        Ok(Self {
            r: parse(0..2)?,
            g: parse(2..4)?,
            b: parse(4..6)?,
            a: 1.0,
        })
    }

    pub fn scale_alpha(self, factor: f64) -> Self {
        Self {
            a: self.a * factor,
            ..self
        }
    }
}

/// Global marker appearance. Changing any of these invalidates every cached
/// style, so the engine answers with a full re-render.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerParams {
    pub base_radius: f64,
    pub stroke_width: u32,
    /// Magnitude scaling is enabled at exponent >= 1.
    pub mag_scale_exponent: f64,
    pub fill: Rgba,
    pub stroke: Rgba,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            base_radius: 3.0,
            stroke_width: 1,
            mag_scale_exponent: 0.0,
            fill: Rgba::new(204, 0, 0, 0.4),
            stroke: Rgba::new(204, 0, 0, 0.9),
        }
    }
}

impl MarkerParams {
    pub fn mag_scaling_enabled(&self) -> bool {
        self.mag_scale_exponent >= 1.0
    }
}

/// Quantized visual signature. Equal keys guarantee visually identical
/// styles; the quantization (tenth-pixel radius, 33 alpha levels) bounds how
/// many distinct style objects a replay can create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleKey {
    radius_x10: u32,
    stroke_width: u32,
    alpha_x32: u8,
}

impl StyleKey {
    pub fn new(radius: f64, stroke_width: u32, fade_alpha: f64) -> Self {
        Self {
            radius_x10: (radius.max(0.0) * 10.0).round() as u32,
            stroke_width,
            alpha_x32: (fade_alpha.clamp(0.0, 1.0) * 32.0).round() as u8,
        }
    }

    pub fn radius(&self) -> f64 {
        f64::from(self.radius_x10) / 10.0
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    pub fn fade_alpha(&self) -> f64 {
        f64::from(self.alpha_x32) / 32.0
    }
}

/// Concrete circle-marker style handed to the display layer.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub stroke_width: u32,
    pub fill: Rgba,
    pub stroke: Rgba,
}

impl MarkerStyle {
    /// Built from the key alone plus the global colors; one key maps to
    /// exactly one style.
    fn build(key: StyleKey, params: &MarkerParams) -> Self {
        let alpha = key.fade_alpha();
        Self {
            radius: key.radius(),
            stroke_width: key.stroke_width(),
            fill: params.fill.scale_alpha(alpha),
            stroke: params.stroke.scale_alpha(alpha),
        }
    }
}

/// Lazily populated style-object cache. Cleared whenever a global visual
/// parameter changes; otherwise bounded by the finite set of quantized keys.
#[derive(Debug, Default)]
pub struct StyleCache {
    entries: HashMap<StyleKey, MarkerStyle>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, key: StyleKey, params: &MarkerParams) -> &MarkerStyle {
        self.entries
            .entry(key)
            .or_insert_with(|| MarkerStyle::build(key, params))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
