use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{ForecastPoint, Mmsi, VesselEncounter};

/// The named event kinds emitted by the upstream push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Ais,
    Prediction,
    Cri,
    FutureCri,
}

/// Whether an encounter batch describes live or predicted encounters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum EncounterVariant {
    Current,
    Future,
}

impl EncounterVariant {
    pub fn is_future(&self) -> bool {
        matches!(self, EncounterVariant::Future)
    }
}

impl EventKind {
    pub fn encounter_variant(&self) -> Option<EncounterVariant> {
        match self {
            EventKind::Cri => Some(EncounterVariant::Current),
            EventKind::FutureCri => Some(EncounterVariant::Future),
            EventKind::Ais | EventKind::Prediction => None,
        }
    }
}

/// A partial position report, `None` fields are left untouched on merge.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub mmsi: Mmsi,
    pub vessel_type: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub cog: Option<f64>,
    pub sog: Option<f64>,
    pub name: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastUpdate {
    pub mmsi: Mmsi,
    pub points: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateBatch {
    Position(Vec<PositionUpdate>),
    Forecast(Vec<ForecastUpdate>),
    Encounter {
        variant: EncounterVariant,
        encounters: Vec<VesselEncounter>,
    },
}

impl UpdateBatch {
    pub fn kind(&self) -> EventKind {
        match self {
            UpdateBatch::Position(_) => EventKind::Ais,
            UpdateBatch::Forecast(_) => EventKind::Prediction,
            UpdateBatch::Encounter {
                variant: EncounterVariant::Current,
                ..
            } => EventKind::Cri,
            UpdateBatch::Encounter {
                variant: EncounterVariant::Future,
                ..
            } => EventKind::FutureCri,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            UpdateBatch::Position(v) => v.len(),
            UpdateBatch::Forecast(v) => v.len(),
            UpdateBatch::Encounter { encounters, .. } => encounters.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The outcome of decoding one raw event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBatch {
    pub batch: UpdateBatch,
    /// Records dropped as malformed while decoding.
    pub skipped: usize,
}

/// Batches coalesced over one commit interval, applied to the store as a single step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMessage {
    pub batches: Vec<DecodedBatch>,
}

impl UpdateMessage {
    pub fn is_empty(&self) -> bool {
        self.batches.iter().all(|b| b.batch.is_empty())
    }

    pub fn num_updates(&self) -> usize {
        self.batches.iter().map(|b| b.batch.len()).sum()
    }
}

impl From<UpdateBatch> for UpdateMessage {
    fn from(batch: UpdateBatch) -> Self {
        Self {
            batches: vec![DecodedBatch { batch, skipped: 0 }],
        }
    }
}

#[cfg(feature = "test")]
mod test {
    use super::*;

    impl PositionUpdate {
        pub fn test_default(mmsi: Mmsi, timestamp: DateTime<Utc>) -> Self {
            Self {
                mmsi,
                vessel_type: Some("Class A".into()),
                latitude: 56.0,
                longitude: 9.0,
                cog: Some(90.0),
                sog: Some(10.0),
                name: Some("test_vessel".into()),
                timestamp: Some(timestamp),
                length: None,
            }
        }
    }
}
