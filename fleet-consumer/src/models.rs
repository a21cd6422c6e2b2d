use chrono::{DateTime, NaiveDateTime, Utc};
use fleet_core::Mmsi;
use serde::{Deserialize, Serialize};

/// A named event as delivered by the push channel, `data` holds the JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub name: String,
    pub data: String,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Upstream versions disagree on whether numbers are sent as JSON numbers or as strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Loose {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl Loose {
    /// The finite numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Loose::Integer(v) => Some(*v as f64),
            Loose::Float(v) => Some(*v),
            Loose::Text(v) => v.trim().parse().ok(),
        }
        .filter(|v: &f64| v.is_finite())
    }

    pub fn to_mmsi(&self) -> Option<Mmsi> {
        match self {
            Loose::Integer(v) => Some(Mmsi::from(*v)),
            Loose::Float(v) if v.fract() == 0.0 && *v >= 0.0 && *v < u64::MAX as f64 => {
                Some(Mmsi::from(*v as u64))
            }
            Loose::Float(_) => None,
            Loose::Text(v) => v.parse().ok(),
        }
    }
}

impl From<f64> for Loose {
    fn from(value: f64) -> Self {
        Loose::Float(value)
    }
}

impl From<u64> for Loose {
    fn from(value: u64) -> Self {
        Loose::Integer(value)
    }
}

impl From<&str> for Loose {
    fn from(value: &str) -> Self {
        Loose::Text(value.to_owned())
    }
}

/// Parses the timestamp forms seen upstream, naive forms are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
    ];

    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .map(|ts| ts.and_utc())
}

/// One record of an `ais` payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawPosition {
    #[serde(alias = "MMSI")]
    pub mmsi: Option<Loose>,
    #[serde(
        rename = "type of mobile",
        alias = "Type of mobile",
        alias = "vesselType",
        alias = "vessel_type"
    )]
    pub vessel_type: Option<String>,
    #[serde(alias = "Latitude")]
    pub latitude: Option<Loose>,
    #[serde(alias = "Longitude")]
    pub longitude: Option<Loose>,
    #[serde(alias = "COG")]
    pub cog: Option<Loose>,
    #[serde(alias = "SOG")]
    pub sog: Option<Loose>,
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(alias = "Length")]
    pub length: Option<Loose>,
}

/// One point of a `prediction` payload, several points of a vessel are spread over the array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawForecastPoint {
    #[serde(alias = "MMSI")]
    pub mmsi: Option<Loose>,
    #[serde(alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(alias = "Latitude")]
    pub latitude: Option<Loose>,
    #[serde(alias = "Longitude")]
    pub longitude: Option<Loose>,
}

/// One flat record of a `cri` or `future_cri` payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawEncounter {
    pub vessel_1: Option<Loose>,
    pub vessel_2: Option<Loose>,
    pub vessel_1_latitude: Option<Loose>,
    pub vessel_1_longitude: Option<Loose>,
    pub vessel_1_cog: Option<Loose>,
    pub vessel_1_sog: Option<Loose>,
    pub vessel_1_length: Option<Loose>,
    pub vessel_2_latitude: Option<Loose>,
    pub vessel_2_longitude: Option<Loose>,
    pub vessel_2_cog: Option<Loose>,
    pub vessel_2_sog: Option<Loose>,
    pub vessel_2_length: Option<Loose>,
    #[serde(alias = "euclidian_dist")]
    pub distance: Option<Loose>,
    pub rel_movement_direction: Option<Loose>,
    pub azimuth_target_to_own: Option<Loose>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<Loose>,
    #[serde(rename = "ves_cri", alias = "cri")]
    pub cri: Option<Loose>,
    pub future_cri: Option<Loose>,
}
