//! Spherical mercator projection onto the unit square, `x` growing east and `y` south.

use std::f64::consts::PI;

pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Distance in pixels between two projected points at `zoom` for tiles `extent` pixels wide.
pub fn pixel_distance(a: (f64, f64), b: (f64, f64), zoom: u8, extent: f64) -> f64 {
    let scale = extent * f64::from(1u32 << zoom);
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt() * scale
}
