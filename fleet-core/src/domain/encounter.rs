use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EncounterVariant, Mmsi};

/// A directed view of a [VesselEncounter] held by one of its parties, pointing at the other.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounteringVessel {
    pub mmsi: Mmsi,
    pub cri: f64,
    pub future_cri: Option<f64>,
    pub is_future_cri: bool,
}

/// Snapshot of one party of an encounter as the risk model saw it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EncounteringPairVessel {
    pub mmsi: Mmsi,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cog: Option<f64>,
    pub sog: Option<f64>,
    pub length: Option<f64>,
}

/// A raw pairwise encounter event.
///
/// `cri` and `future_cri` are both optional on the wire, the decoder guarantees that the
/// risk matching the batch [EncounterVariant] is present and within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VesselEncounter {
    pub vessel_1: EncounteringPairVessel,
    pub vessel_2: EncounteringPairVessel,
    pub distance: Option<f64>,
    pub rel_movement_direction: Option<f64>,
    pub azimuth_target_to_own: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub cri: Option<f64>,
    pub future_cri: Option<f64>,
}

impl VesselEncounter {
    pub fn risk(&self, variant: EncounterVariant) -> Option<f64> {
        match variant {
            EncounterVariant::Current => self.cri,
            EncounterVariant::Future => self.future_cri,
        }
    }

    /// The two directed entries of this encounter, the first one belongs to `vessel_1` and
    /// points at `vessel_2`.
    ///
    /// Returns `None` when the risk for `variant` is absent.
    pub fn directed(
        &self,
        variant: EncounterVariant,
    ) -> Option<(EncounteringVessel, EncounteringVessel)> {
        let risk = self.risk(variant)?;
        let (cri, future_cri) = match variant {
            EncounterVariant::Current => (risk, self.future_cri),
            EncounterVariant::Future => (risk, Some(risk)),
        };
        let entry = |other: &EncounteringPairVessel| EncounteringVessel {
            mmsi: other.mmsi.clone(),
            cri,
            future_cri,
            is_future_cri: variant.is_future(),
        };

        Some((entry(&self.vessel_2), entry(&self.vessel_1)))
    }
}

#[cfg(feature = "test")]
mod test {
    use super::*;

    impl EncounteringPairVessel {
        pub fn test_default(mmsi: Mmsi) -> Self {
            Self {
                mmsi,
                latitude: Some(56.0),
                longitude: Some(9.0),
                cog: Some(90.0),
                sog: Some(10.0),
                length: Some(120.0),
            }
        }
    }

    impl VesselEncounter {
        pub fn test_default(vessel_1: Mmsi, vessel_2: Mmsi, cri: f64) -> Self {
            Self {
                vessel_1: EncounteringPairVessel::test_default(vessel_1),
                vessel_2: EncounteringPairVessel::test_default(vessel_2),
                distance: Some(0.4),
                rel_movement_direction: Some(180.0),
                azimuth_target_to_own: Some(45.0),
                start_time: None,
                end_time: None,
                duration: Some(600.0),
                cri: Some(cri),
                future_cri: None,
            }
        }

        pub fn test_future(vessel_1: Mmsi, vessel_2: Mmsi, future_cri: f64) -> Self {
            Self {
                cri: None,
                future_cri: Some(future_cri),
                ..Self::test_default(vessel_1, vessel_2, 0.0)
            }
        }
    }
}
