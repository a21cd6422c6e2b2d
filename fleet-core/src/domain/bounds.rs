use geo::{BoundingRect, Coord, MultiPoint, Point};
use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// `west > east` denotes a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Smallest box covering every `(longitude, latitude)` pair, `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let points: MultiPoint<f64> = points
            .into_iter()
            .filter(|(lon, lat)| lon.is_finite() && lat.is_finite())
            .map(Point::from)
            .collect();

        points.bounding_rect().map(|rect| {
            let Coord { x: west, y: south } = rect.min();
            let Coord { x: east, y: north } = rect.max();
            Self::new(west, south, east, north)
        })
    }

    /// Smallest box covering both, taking the shorter way around the antimeridian.
    pub fn union(&self, other: &GeoBounds) -> GeoBounds {
        let south = self.south.min(other.south);
        let north = self.north.max(other.north);

        // Span of `b` when walking east from the west edge of `a`.
        let eastward = |a: &GeoBounds, b: &GeoBounds| {
            a.lon_span()
                .max((b.west - a.west).rem_euclid(360.0) + b.lon_span())
        };
        let (west, span) = [
            (self.west, eastward(self, other)),
            (other.west, eastward(other, self)),
        ]
        .into_iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((self.west, self.lon_span()));

        if span >= 360.0 {
            return Self::new(-180.0, south, 180.0, north);
        }
        let east = west + span;
        let east = if east > 180.0 { east - 360.0 } else { east };
        Self::new(west, south, east, north)
    }

    /// Longitudinal extent in degrees, crossing the antimeridian where `west > east`.
    fn lon_span(&self) -> f64 {
        let span = self.east - self.west;
        if span >= 360.0 {
            360.0
        } else if span >= 0.0 {
            span
        } else {
            span + 360.0
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        if latitude < self.south || latitude > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            longitude >= self.west || longitude <= self.east
        } else {
            longitude >= self.west && longitude <= self.east
        }
    }

    pub fn center(&self) -> (f64, f64) {
        let lon = if self.crosses_antimeridian() {
            let mid = (self.west + self.east + 360.0) / 2.0;
            if mid > 180.0 { mid - 360.0 } else { mid }
        } else {
            (self.west + self.east) / 2.0
        };
        (lon, (self.south + self.north) / 2.0)
    }
}
