use std::{
    collections::{HashMap, HashSet},
    ops::AddAssign,
    sync::Arc,
};

use fleet_core::{
    DecodedBatch, EncounterVariant, EncounteringVessel, ForecastUpdate, Mmsi, PositionUpdate,
    UpdateBatch, UpdateMessage, Vessel, VesselEncounter,
};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{Level, event, instrument};

/// Rules applied while merging updates into the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconcilePolicy {
    /// How far behind the vessel timestamp a forecast point may be before it is dropped.
    #[serde(with = "humantime_serde", default = "default_forecast_tolerance")]
    pub forecast_tolerance: std::time::Duration,
    /// Vessel types allowed into the store, `None` accepts every type.
    #[serde(default)]
    pub accepted_vessel_types: Option<Vec<String>>,
}

fn default_forecast_tolerance() -> std::time::Duration {
    std::time::Duration::from_secs(60)
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            forecast_tolerance: default_forecast_tolerance(),
            accepted_vessel_types: None,
        }
    }
}

impl ReconcilePolicy {
    fn accepts(&self, declared: Option<&str>, known: bool) -> bool {
        match (&self.accepted_vessel_types, declared) {
            (None, _) => true,
            (Some(types), Some(declared)) => types.iter().any(|t| t == declared),
            (Some(_), None) => known,
        }
    }
}

/// Counters describing what the store did with the updates it received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub messages: u64,
    pub created: u64,
    pub updated: u64,
    /// Updates for a vessel the store has never been asked to hold.
    pub dangling: u64,
    /// Positions refused by the vessel type policy, and forecasts and encounter parties
    /// of vessels refused that way.
    pub ignored_by_policy: u64,
    /// New vessels lacking a timestamp and encounters lacking a risk index.
    pub incomplete: u64,
    /// Records the decoder already dropped as malformed.
    pub skipped: u64,
}

impl StoreMetrics {
    pub fn changed(&self) -> u64 {
        self.created + self.updated
    }
}

impl AddAssign for StoreMetrics {
    fn add_assign(&mut self, rhs: Self) {
        self.messages += rhs.messages;
        self.created += rhs.created;
        self.updated += rhs.updated;
        self.dangling += rhs.dangling;
        self.ignored_by_policy += rhs.ignored_by_policy;
        self.incomplete += rhs.incomplete;
        self.skipped += rhs.skipped;
    }
}

/// An immutable view of every vessel at one point in time.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    version: u64,
    vessels: HashMap<Mmsi, Arc<Vessel>>,
}

impl FleetSnapshot {
    /// Increases by one for every published snapshot, starting at 0 for the empty store.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, mmsi: &Mmsi) -> Option<&Arc<Vessel>> {
        self.vessels.get(mmsi)
    }

    pub fn contains(&self, mmsi: &Mmsi) -> bool {
        self.vessels.contains_key(mmsi)
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Mmsi, &Arc<Vessel>)> {
        self.vessels.iter()
    }

    /// Vessels whose mmsi contains `term` or whose name contains it ignoring case.
    pub fn search(&self, term: &str) -> Vec<Arc<Vessel>> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        let lowercase = term.to_lowercase();

        let mut hits: Vec<Arc<Vessel>> = self
            .vessels
            .values()
            .filter(|v| {
                v.mmsi.as_str().contains(term) || v.name.to_lowercase().contains(&lowercase)
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.mmsi.cmp(&b.mmsi));
        hits
    }
}

/// Owner of the authoritative vessel map.
///
/// Every write goes through [VesselStore::apply], readers only ever get immutable
/// [FleetSnapshot]s through the watch channel returned by [VesselStore::subscribe].
pub struct VesselStore {
    policy: ReconcilePolicy,
    forecast_tolerance: chrono::Duration,
    vessels: HashMap<Mmsi, Arc<Vessel>>,
    /// Absent vessels whose positions the policy refused.
    refused: HashSet<Mmsi>,
    version: u64,
    sender: watch::Sender<Arc<FleetSnapshot>>,
    metrics: StoreMetrics,
}

impl VesselStore {
    pub fn new(policy: ReconcilePolicy) -> Self {
        let forecast_tolerance = chrono::Duration::from_std(policy.forecast_tolerance)
            .unwrap_or_else(|_| chrono::Duration::minutes(1));
        let (sender, _) = watch::channel(Arc::new(FleetSnapshot::default()));

        Self {
            policy,
            forecast_tolerance,
            vessels: HashMap::new(),
            refused: HashSet::new(),
            version: 0,
            sender,
            metrics: StoreMetrics::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FleetSnapshot>> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.sender.borrow().clone()
    }

    pub fn metrics(&self) -> StoreMetrics {
        self.metrics
    }

    pub async fn consume_loop(
        mut self,
        receiver: async_channel::Receiver<UpdateMessage>,
        process_confirmation: Option<tokio::sync::mpsc::Sender<()>>,
    ) {
        while let Ok(message) = receiver.recv().await {
            self.apply(message);
            // Only enabled in tests
            if let Some(ref s) = process_confirmation {
                if let Err(e) = s.send(()).await {
                    event!(Level::WARN, "failed to send process confirmation: {:?}", e);
                }
            }
        }
        event!(
            Level::INFO,
            "update channel closed, serving version {}: {:?}",
            self.version,
            self.metrics
        );
    }

    /// Applies every batch of `message` and publishes at most one new snapshot.
    #[instrument(skip_all, fields(app.num_updates = message.num_updates(), app.version))]
    pub fn apply(&mut self, message: UpdateMessage) -> StoreMetrics {
        let mut delta = StoreMetrics {
            messages: 1,
            ..Default::default()
        };

        for DecodedBatch { batch, skipped } in message.batches {
            delta.skipped += skipped as u64;
            match batch {
                UpdateBatch::Position(updates) => self.apply_positions(updates, &mut delta),
                UpdateBatch::Forecast(updates) => self.apply_forecasts(updates, &mut delta),
                UpdateBatch::Encounter {
                    variant,
                    encounters,
                } => self.apply_encounters(variant, encounters, &mut delta),
            }
        }

        if delta.changed() > 0 {
            self.publish();
        }
        tracing::Span::current().record("app.version", self.version);

        if delta.dangling + delta.ignored_by_policy + delta.incomplete + delta.skipped > 0 {
            event!(Level::DEBUG, "partially applied update message: {:?}", delta);
        }

        self.metrics += delta;
        delta
    }

    fn publish(&mut self) {
        self.version += 1;
        self.sender.send_replace(Arc::new(FleetSnapshot {
            version: self.version,
            vessels: self.vessels.clone(),
        }));
    }

    fn apply_positions(&mut self, updates: Vec<PositionUpdate>, delta: &mut StoreMetrics) {
        for update in updates {
            let known = self.vessels.contains_key(&update.mmsi);
            if !self.policy.accepts(update.vessel_type.as_deref(), known) {
                if !known {
                    self.refused.insert(update.mmsi);
                }
                delta.ignored_by_policy += 1;
                continue;
            }

            match self.vessels.get_mut(&update.mmsi) {
                Some(vessel) => {
                    Arc::make_mut(vessel).merge_position(update, self.forecast_tolerance);
                    delta.updated += 1;
                }
                None => match Vessel::from_position(update) {
                    Some(vessel) => {
                        self.refused.remove(&vessel.mmsi);
                        self.vessels.insert(vessel.mmsi.clone(), Arc::new(vessel));
                        delta.created += 1;
                    }
                    None => delta.incomplete += 1,
                },
            }
        }
    }

    fn apply_forecasts(&mut self, updates: Vec<ForecastUpdate>, delta: &mut StoreMetrics) {
        for ForecastUpdate { mmsi, points } in updates {
            match self.vessels.get_mut(&mmsi) {
                Some(vessel) => {
                    Arc::make_mut(vessel).set_forecast(points, self.forecast_tolerance);
                    delta.updated += 1;
                }
                None => self.count_missing(&mmsi, delta),
            }
        }
    }

    fn count_missing(&self, mmsi: &Mmsi, delta: &mut StoreMetrics) {
        if self.refused.contains(mmsi) {
            delta.ignored_by_policy += 1;
        } else {
            delta.dangling += 1;
        }
    }

    fn apply_encounters(
        &mut self,
        variant: EncounterVariant,
        encounters: Vec<VesselEncounter>,
        delta: &mut StoreMetrics,
    ) {
        let mut entries: HashMap<Mmsi, Vec<EncounteringVessel>> = HashMap::new();
        let mut lengths: HashMap<Mmsi, f64> = HashMap::new();

        for encounter in encounters {
            let Some((first, second)) = encounter.directed(variant) else {
                delta.incomplete += 1;
                continue;
            };

            for (party, entry) in [(encounter.vessel_1, first), (encounter.vessel_2, second)] {
                if !self.vessels.contains_key(&party.mmsi) {
                    self.count_missing(&party.mmsi, delta);
                    continue;
                }
                if let Some(length) = party.length {
                    lengths.insert(party.mmsi.clone(), length);
                }
                entries.entry(party.mmsi).or_default().push(entry);
            }
        }

        for (mmsi, list) in entries {
            if let Some(vessel) = self.vessels.get_mut(&mmsi) {
                let vessel = Arc::make_mut(vessel);
                vessel.replace_encounters(variant.is_future(), list);
                if let Some(length) = lengths.get(&mmsi) {
                    vessel.length = Some(*length);
                }
                delta.updated += 1;
            }
        }
    }
}

impl Default for VesselStore {
    fn default() -> Self {
        Self::new(ReconcilePolicy::default())
    }
}
