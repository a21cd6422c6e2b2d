use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use fleet_core::{Mmsi, Range, Vessel};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{Level, event};

use crate::{FleetSnapshot, view::pinned};

/// A replaceable vessel predicate.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Vessel) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Vessel) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    pub fn matches(&self, vessel: &Vessel) -> bool {
        (self.0)(vessel)
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Predicate")
    }
}

impl From<VesselFilter> for Predicate {
    fn from(value: VesselFilter) -> Self {
        Self::new(move |v| value.matches(v))
    }
}

/// Which risk index the `cri` range of a [VesselFilter] is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum CriSource {
    #[default]
    Current,
    Future,
}

/// Independent conditions ANDed together.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VesselFilter {
    pub sog: Range<f64>,
    /// A vessel without encounters counts as risk 0.
    pub cri: Range<f64>,
    pub cri_source: CriSource,
    /// Substring of the vessel type, empty matches every type.
    pub vessel_type: String,
    pub require_forecast: bool,
}

impl Default for VesselFilter {
    fn default() -> Self {
        Self {
            sog: Range::closed(0.0, 30.0),
            cri: Range::closed(0.0, 1.0),
            cri_source: CriSource::Current,
            vessel_type: String::new(),
            require_forecast: false,
        }
    }
}

impl VesselFilter {
    pub fn matches(&self, vessel: &Vessel) -> bool {
        let cri = match self.cri_source {
            CriSource::Current => vessel.cri,
            CriSource::Future => vessel.future_cri,
        }
        .unwrap_or(0.0);

        self.sog.contains(&vessel.sog)
            && self.cri.contains(&cri)
            && vessel.vessel_type.contains(self.vessel_type.as_str())
            && (!self.require_forecast || vessel.has_forecast())
    }
}

/// The result of one filter recomputation.
#[derive(Debug, Clone, Default)]
pub struct FilteredSnapshot {
    /// Increases with every recomputation, usable as a cache key.
    pub generation: u64,
    pub selection: Option<Mmsi>,
    pub source: Arc<FleetSnapshot>,
    pub vessels: BTreeMap<Mmsi, Arc<Vessel>>,
}

impl FilteredSnapshot {
    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn contains(&self, mmsi: &Mmsi) -> bool {
        self.vessels.contains_key(mmsi)
    }
}

/// Derives the filtered subset of the store.
///
/// The subset is recomputed in full whenever the predicate, the published store snapshot
/// or the selection changes, it is never patched incrementally.
#[derive(Debug)]
pub struct FilterEngine {
    store: watch::Receiver<Arc<FleetSnapshot>>,
    selection: watch::Receiver<Option<Mmsi>>,
    predicate: Predicate,
    keep_selection: bool,
    current: Arc<FilteredSnapshot>,
}

impl FilterEngine {
    pub fn new(
        store: watch::Receiver<Arc<FleetSnapshot>>,
        selection: watch::Receiver<Option<Mmsi>>,
    ) -> Self {
        let mut engine = Self {
            store,
            selection,
            predicate: Predicate::default(),
            keep_selection: true,
            current: Arc::new(FilteredSnapshot::default()),
        };
        engine.recompute();
        engine
    }

    pub fn set_filter(&mut self, predicate: impl Into<Predicate>) {
        self.predicate = predicate.into();
        self.recompute();
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(Predicate::accept_all());
    }

    /// Whether the active vessel and its encounter partners bypass the predicate.
    pub fn set_keep_selection(&mut self, keep: bool) {
        if self.keep_selection != keep {
            self.keep_selection = keep;
            self.recompute();
        }
    }

    /// The filtered subset of the latest published snapshot.
    pub fn filtered(&mut self) -> Arc<FilteredSnapshot> {
        let stale = self.store.borrow().version() != self.current.source.version()
            || *self.selection.borrow() != self.current.selection;
        if stale {
            self.recompute();
        }
        self.current.clone()
    }

    fn recompute(&mut self) {
        let source = self.store.borrow_and_update().clone();
        let selection = self.selection.borrow_and_update().clone();

        let keep = if self.keep_selection {
            pinned(&source, selection.as_ref())
        } else {
            Default::default()
        };

        let vessels: BTreeMap<Mmsi, Arc<Vessel>> = source
            .iter()
            .filter(|(mmsi, vessel)| keep.contains(*mmsi) || self.predicate.matches(vessel))
            .map(|(mmsi, vessel)| (mmsi.clone(), vessel.clone()))
            .collect();

        let generation = self.current.generation + 1;
        event!(
            Level::TRACE,
            "filter generation {generation}: {} of {} vessels",
            vessels.len(),
            source.len()
        );

        self.current = Arc::new(FilteredSnapshot {
            generation,
            selection,
            source,
            vessels,
        });
    }
}
