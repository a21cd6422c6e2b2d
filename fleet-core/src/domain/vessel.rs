use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{EncounteringVessel, Mmsi, PositionUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

/// The reconciled state of a single vessel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    pub mmsi: Mmsi,
    pub vessel_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub cog: f64,
    pub sog: f64,
    pub name: String,
    /// Time of the last position observation.
    pub timestamp: DateTime<Utc>,
    pub length: Option<f64>,
    /// Highest risk among the live encounters.
    pub cri: Option<f64>,
    /// Highest risk among the predicted encounters.
    pub future_cri: Option<f64>,
    pub forecast: Vec<ForecastPoint>,
    pub encountering_vessels: Vec<EncounteringVessel>,
}

impl Vessel {
    /// Creates a vessel from its first position report, which has to carry a timestamp.
    pub fn from_position(update: PositionUpdate) -> Option<Self> {
        let PositionUpdate {
            mmsi,
            vessel_type,
            latitude,
            longitude,
            cog,
            sog,
            name,
            timestamp,
            length,
        } = update;

        Some(Self {
            mmsi,
            vessel_type: vessel_type.unwrap_or_default(),
            latitude,
            longitude,
            cog: cog.unwrap_or_default(),
            sog: sog.unwrap_or_default(),
            name: name.unwrap_or_default(),
            timestamp: timestamp?,
            length,
            cri: None,
            future_cri: None,
            forecast: Vec::new(),
            encountering_vessels: Vec::new(),
        })
    }

    /// Overwrites every field the update carries and keeps the rest.
    pub fn merge_position(&mut self, update: PositionUpdate, forecast_tolerance: Duration) {
        self.latitude = update.latitude;
        self.longitude = update.longitude;
        if let Some(v) = update.vessel_type {
            self.vessel_type = v;
        }
        if let Some(v) = update.cog {
            self.cog = v;
        }
        if let Some(v) = update.sog {
            self.sog = v;
        }
        if let Some(v) = update.name {
            self.name = v;
        }
        if let Some(v) = update.length {
            self.length = Some(v);
        }
        if let Some(v) = update.timestamp {
            self.timestamp = v;
            self.prune_forecast(forecast_tolerance);
        }
    }

    pub fn set_forecast(&mut self, points: Vec<ForecastPoint>, tolerance: Duration) {
        self.forecast = points;
        self.prune_forecast(tolerance);
    }

    /// Drops forecast points older than `timestamp - tolerance`.
    pub fn prune_forecast(&mut self, tolerance: Duration) {
        let oldest = self.timestamp - tolerance;
        self.forecast.retain(|p| p.timestamp >= oldest);
    }

    /// Replaces every entry of the given kind (future or current) with `entries`, entries of
    /// the other kind are kept. A partner appearing more than once keeps its last entry.
    pub fn replace_encounters(&mut self, is_future_cri: bool, entries: Vec<EncounteringVessel>) {
        self.encountering_vessels
            .retain(|e| e.is_future_cri != is_future_cri);

        for entry in entries {
            if let Some(pos) = self
                .encountering_vessels
                .iter()
                .position(|e| e.is_future_cri == is_future_cri && e.mmsi == entry.mmsi)
            {
                self.encountering_vessels.remove(pos);
            }
            self.encountering_vessels.push(entry);
        }

        self.refresh_cri();
    }

    fn refresh_cri(&mut self) {
        self.cri = self.encounters(false).map(|e| e.cri).reduce(f64::max);
        self.future_cri = self
            .encounters(true)
            .map(|e| e.future_cri.unwrap_or(e.cri))
            .reduce(f64::max);
    }

    /// Highest risk over every encountering entry, current or future, 0 without encounters.
    pub fn max_cri(&self) -> f64 {
        self.encountering_vessels
            .iter()
            .flat_map(|e| [Some(e.cri), e.future_cri])
            .flatten()
            .fold(0.0, f64::max)
    }

    pub fn min_cri(&self) -> Option<f64> {
        self.encountering_vessels
            .iter()
            .flat_map(|e| [Some(e.cri), e.future_cri])
            .flatten()
            .reduce(f64::min)
    }

    /// `(longitude, latitude)`
    pub fn position(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }

    /// The current position followed by every forecast point, as `(longitude, latitude)`.
    pub fn track(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        std::iter::once(self.position()).chain(
            self.forecast
                .iter()
                .map(|p| (p.longitude, p.latitude)),
        )
    }

    pub fn has_forecast(&self) -> bool {
        !self.forecast.is_empty()
    }

    pub fn encounters(&self, is_future_cri: bool) -> impl Iterator<Item = &EncounteringVessel> {
        self.encountering_vessels
            .iter()
            .filter(move |e| e.is_future_cri == is_future_cri)
    }
}

#[cfg(feature = "test")]
mod test {
    use super::*;

    impl Vessel {
        pub fn test_default(mmsi: Mmsi, timestamp: DateTime<Utc>) -> Self {
            Self {
                mmsi,
                vessel_type: "Class A".into(),
                latitude: 56.0,
                longitude: 9.0,
                cog: 90.0,
                sog: 10.0,
                name: "test_vessel".into(),
                timestamp,
                length: None,
                cri: None,
                future_cri: None,
                forecast: Vec::new(),
                encountering_vessels: Vec::new(),
            }
        }
    }
}
