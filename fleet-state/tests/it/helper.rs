use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use fleet_cluster::ClusterOptions;
use fleet_core::{
    EncounterVariant, ForecastPoint, ForecastUpdate, Mmsi, PositionUpdate, UpdateBatch,
    UpdateMessage, Vessel, VesselEncounter,
};
use fleet_state::{FleetView, ReconcilePolicy, StoreMetrics, VesselStore};
use lazy_static::{initialize, lazy_static};
use tracing_subscriber::FmtSubscriber;

lazy_static! {
    static ref TRACING: () = tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(tracing::Level::DEBUG)
            .finish(),
    )
    .unwrap();
}

pub const VIEW_MAX_ZOOM: u8 = 18;

pub struct TestHelper {
    pub store: VesselStore,
    pub view: FleetView,
}

impl TestHelper {
    pub fn new() -> Self {
        Self::with_policy(ReconcilePolicy::default())
    }

    pub fn with_policy(policy: ReconcilePolicy) -> Self {
        initialize(&TRACING);
        let store = VesselStore::new(policy);
        let view =
            FleetView::new(store.subscribe(), ClusterOptions::default(), VIEW_MAX_ZOOM).unwrap();
        Self { store, view }
    }

    pub fn apply(&mut self, batch: UpdateBatch) -> StoreMetrics {
        self.store.apply(UpdateMessage::from(batch))
    }

    pub fn vessel(&self, mmsi: u64) -> Arc<Vessel> {
        self.store
            .snapshot()
            .get(&Mmsi::from(mmsi))
            .cloned()
            .unwrap_or_else(|| panic!("vessel {mmsi} is not in the store"))
    }

    pub fn add_vessels(&mut self, mmsis: &[u64]) {
        self.apply(UpdateBatch::Position(
            mmsis.iter().map(|m| position(*m)).collect(),
        ));
    }
}

impl Default for TestHelper {
    fn default() -> Self {
        Self::new()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 12, 8, 30, 0).unwrap()
}

pub fn position(mmsi: u64) -> PositionUpdate {
    PositionUpdate::test_default(Mmsi::from(mmsi), t0())
}

pub fn position_at(mmsi: u64, longitude: f64, latitude: f64) -> PositionUpdate {
    PositionUpdate {
        longitude,
        latitude,
        ..position(mmsi)
    }
}

pub fn forecast(mmsi: u64, points: &[(i64, f64, f64)]) -> UpdateBatch {
    UpdateBatch::Forecast(vec![ForecastUpdate {
        mmsi: Mmsi::from(mmsi),
        points: points
            .iter()
            .map(|(minutes, longitude, latitude)| ForecastPoint {
                timestamp: t0() + Duration::minutes(*minutes),
                latitude: *latitude,
                longitude: *longitude,
            })
            .collect(),
    }])
}

pub fn current(pairs: &[(u64, u64, f64)]) -> UpdateBatch {
    UpdateBatch::Encounter {
        variant: EncounterVariant::Current,
        encounters: pairs
            .iter()
            .map(|(a, b, cri)| VesselEncounter::test_default(Mmsi::from(*a), Mmsi::from(*b), *cri))
            .collect(),
    }
}

pub fn future(pairs: &[(u64, u64, f64)]) -> UpdateBatch {
    UpdateBatch::Encounter {
        variant: EncounterVariant::Future,
        encounters: pairs
            .iter()
            .map(|(a, b, cri)| VesselEncounter::test_future(Mmsi::from(*a), Mmsi::from(*b), *cri))
            .collect(),
    }
}
