use std::{collections::HashSet, sync::Arc};

use fleet_core::{EncounteringVessel, GeoBounds, Mmsi, Vessel};
use tokio::sync::watch;
use tracing::{Level, event};

use crate::FleetSnapshot;

/// An encountering entry of the active vessel together with the partner's current record.
///
/// `vessel` is `None` while the partner has not been seen by the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterPartner {
    pub entry: EncounteringVessel,
    pub vessel: Option<Arc<Vessel>>,
}

/// The active vessel and every vessel it references through its encounters.
pub fn pinned(snapshot: &FleetSnapshot, active: Option<&Mmsi>) -> HashSet<Mmsi> {
    let Some(active) = active else {
        return HashSet::new();
    };

    let mut pinned = HashSet::from([active.clone()]);
    if let Some(vessel) = snapshot.get(active) {
        pinned.extend(vessel.encountering_vessels.iter().map(|e| e.mmsi.clone()));
    }
    pinned
}

/// Tracks which vessel is active and derives camera regions around it.
///
/// The selection is published over a watch channel, a vessel vanishing from the store while
/// selected is not an error, the derived queries simply return nothing for it.
#[derive(Debug)]
pub struct ViewCoordinator {
    store: watch::Receiver<Arc<FleetSnapshot>>,
    active: watch::Sender<Option<Mmsi>>,
}

impl ViewCoordinator {
    pub fn new(store: watch::Receiver<Arc<FleetSnapshot>>) -> Self {
        let (active, _) = watch::channel(None);
        Self { store, active }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Mmsi>> {
        self.active.subscribe()
    }

    pub fn active(&self) -> Option<Mmsi> {
        self.active.borrow().clone()
    }

    /// Activates `mmsi`, or deselects when it already is the active vessel.
    pub fn select(&self, mmsi: Mmsi) {
        self.active.send_modify(|active| {
            if active.as_ref() == Some(&mmsi) {
                event!(Level::DEBUG, "deselected {mmsi}");
                *active = None;
            } else {
                event!(Level::DEBUG, "selected {mmsi}");
                *active = Some(mmsi);
            }
        });
    }

    /// Makes `mmsi` the active vessel without toggling, `None` deselects.
    pub fn set_active(&self, mmsi: Option<Mmsi>) {
        let Some(mmsi) = mmsi else {
            self.deselect();
            return;
        };

        self.active.send_if_modified(|active| {
            if active.as_ref() == Some(&mmsi) {
                return false;
            }
            event!(Level::DEBUG, "selected {mmsi}");
            *active = Some(mmsi);
            true
        });
    }

    pub fn deselect(&self) {
        self.active.send_if_modified(|active| active.take().is_some());
    }

    fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.store.borrow().clone()
    }

    pub fn active_vessel(&self) -> Option<Arc<Vessel>> {
        let active = self.active()?;
        self.snapshot().get(&active).cloned()
    }

    pub fn encounter_partners(&self) -> Vec<EncounterPartner> {
        let snapshot = self.snapshot();
        let Some(vessel) = self.active().and_then(|m| snapshot.get(&m).cloned()) else {
            return Vec::new();
        };

        vessel
            .encountering_vessels
            .iter()
            .map(|entry| EncounterPartner {
                entry: entry.clone(),
                vessel: snapshot.get(&entry.mmsi).cloned(),
            })
            .collect()
    }

    pub fn pinned(&self) -> HashSet<Mmsi> {
        pinned(&self.snapshot(), self.active().as_ref())
    }

    /// Position of the active vessel as `(longitude, latitude)`.
    pub fn focus(&self) -> Option<(f64, f64)> {
        self.active_vessel().map(|v| v.position())
    }

    /// Covers the active vessel and its forecast track.
    pub fn bounds_for_active(&self) -> Option<GeoBounds> {
        self.active_vessel()
            .and_then(|v| GeoBounds::from_points(v.track()))
    }

    /// Covers the active vessel, its forecast and the position and forecast of every
    /// encounter partner currently in the store.
    pub fn bounds_for_encounters(&self) -> Option<GeoBounds> {
        let snapshot = self.snapshot();
        let vessel = snapshot.get(&self.active()?)?;

        let partners = vessel
            .encountering_vessels
            .iter()
            .filter_map(|e| snapshot.get(&e.mmsi));

        GeoBounds::from_points(
            vessel
                .track()
                .chain(partners.flat_map(|p| p.track())),
        )
    }
}
