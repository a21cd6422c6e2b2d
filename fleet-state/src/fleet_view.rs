use std::sync::Arc;

use fleet_cluster::ClusterOptions;
use fleet_core::{GeoBounds, Mmsi, Vessel};
use tokio::sync::watch;

use crate::{
    ClusterLayer, EncounterPartner, FilterEngine, FilteredSnapshot, FleetSnapshot, MapFeature,
    Predicate, ViewCoordinator, error::Result,
};

/// Everything a renderer or view layer needs, derived from one store subscription.
pub struct FleetView {
    store: watch::Receiver<Arc<FleetSnapshot>>,
    filter: FilterEngine,
    view: ViewCoordinator,
    clusters: ClusterLayer,
}

impl FleetView {
    pub fn new(
        store: watch::Receiver<Arc<FleetSnapshot>>,
        options: ClusterOptions,
        view_max_zoom: u8,
    ) -> Result<Self> {
        let view = ViewCoordinator::new(store.clone());
        let filter = FilterEngine::new(store.clone(), view.subscribe());
        let clusters = ClusterLayer::new(options, view_max_zoom)?;

        Ok(Self {
            store,
            filter,
            view,
            clusters,
        })
    }

    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.store.borrow().clone()
    }

    pub fn filtered_snapshot(&mut self) -> Arc<FilteredSnapshot> {
        self.filter.filtered()
    }

    pub fn query_clusters(&mut self, bounds: &GeoBounds, zoom: u8) -> Result<Vec<MapFeature>> {
        let filtered = self.filter.filtered();
        self.clusters.query(&filtered, bounds, zoom)
    }

    pub fn expansion_zoom(&self, cluster_id: usize) -> Result<u8> {
        self.clusters.expansion_zoom(cluster_id)
    }

    pub fn cluster_leaves(
        &self,
        cluster_id: usize,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Arc<Vessel>>> {
        self.clusters.leaves(cluster_id, limit, offset)
    }

    pub fn set_filter(&mut self, predicate: impl Into<Predicate>) {
        self.filter.set_filter(predicate);
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear_filter();
    }

    pub fn set_keep_selection(&mut self, keep: bool) {
        self.filter.set_keep_selection(keep);
    }

    pub fn set_active(&self, mmsi: Option<Mmsi>) {
        self.view.set_active(mmsi);
    }

    pub fn select(&self, mmsi: Mmsi) {
        self.view.select(mmsi);
    }

    pub fn deselect(&self) {
        self.view.deselect();
    }

    /// Notified whenever the active vessel changes.
    pub fn subscribe_selection(&self) -> watch::Receiver<Option<Mmsi>> {
        self.view.subscribe()
    }

    pub fn active(&self) -> Option<Mmsi> {
        self.view.active()
    }

    pub fn active_vessel(&self) -> Option<Arc<Vessel>> {
        self.view.active_vessel()
    }

    pub fn encounter_partners(&self) -> Vec<EncounterPartner> {
        self.view.encounter_partners()
    }

    pub fn focus(&self) -> Option<(f64, f64)> {
        self.view.focus()
    }

    pub fn bounds_for_active(&self) -> Option<GeoBounds> {
        self.view.bounds_for_active()
    }

    pub fn bounds_for_encounters(&self) -> Option<GeoBounds> {
        self.view.bounds_for_encounters()
    }

    pub fn search(&self, term: &str) -> Vec<Arc<Vessel>> {
        self.snapshot().search(term)
    }
}
