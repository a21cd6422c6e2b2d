use std::{collections::HashSet, sync::Arc};

use fleet_cluster::{ClusterNode, ClusterOptions, ClusterSummary, Leaf, Supercluster};
use fleet_core::{EncounteringVessel, GeoBounds, Mmsi, Vessel};
use snafu::{OptionExt, ResultExt};
use tracing::{Level, event};

use crate::{
    FilteredSnapshot,
    error::{
        Result,
        error::{ClusterSnafu, NoClusterIndexSnafu},
    },
    view::pinned,
};

/// How a single vessel marker relates to the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerRole {
    Active,
    /// A partner of the active vessel, carrying the active vessel's entry for it.
    Encountering(EncounteringVessel),
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapFeature {
    Vessel {
        vessel: Arc<Vessel>,
        role: MarkerRole,
    },
    Cluster(ClusterSummary),
}

impl MapFeature {
    pub fn is_cluster(&self) -> bool {
        matches!(self, MapFeature::Cluster(_))
    }

    pub fn vessel(&self) -> Option<&Arc<Vessel>> {
        match self {
            MapFeature::Vessel { vessel, .. } => Some(vessel),
            MapFeature::Cluster(_) => None,
        }
    }
}

struct CachedIndex {
    generation: u64,
    index: Supercluster<Arc<Vessel>>,
    priority: Vec<MapFeature>,
}

/// Clusters the filtered vessels for rendering.
///
/// The active vessel and its encounter partners never take part in clustering, they are
/// returned ahead of everything else as individual markers. The index is rebuilt only
/// when the filtered snapshot changes generation.
pub struct ClusterLayer {
    options: ClusterOptions,
    view_max_zoom: u8,
    cache: Option<CachedIndex>,
}

impl ClusterLayer {
    pub fn new(options: ClusterOptions, view_max_zoom: u8) -> Result<Self> {
        options.validate().context(ClusterSnafu)?;
        Ok(Self {
            options,
            view_max_zoom,
            cache: None,
        })
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Priority markers followed by the clusters and points inside `bounds` at `zoom`.
    pub fn query(
        &mut self,
        filtered: &FilteredSnapshot,
        bounds: &GeoBounds,
        zoom: u8,
    ) -> Result<Vec<MapFeature>> {
        let cache = self.index(filtered)?;

        let mut features = cache.priority.clone();
        features.extend(
            cache
                .index
                .clusters(bounds, zoom)
                .into_iter()
                .map(|node| match node {
                    ClusterNode::Point { leaf, .. } => MapFeature::Vessel {
                        vessel: leaf.data.clone(),
                        role: MarkerRole::Plain,
                    },
                    ClusterNode::Cluster(summary) => MapFeature::Cluster(summary),
                }),
        );

        Ok(features)
    }

    /// Zoom at which the cluster splits, never above the maximum zoom of the map view.
    pub fn expansion_zoom(&self, cluster_id: usize) -> Result<u8> {
        let cache = self.cache.as_ref().context(NoClusterIndexSnafu)?;
        let zoom = cache
            .index
            .expansion_zoom(cluster_id)
            .context(ClusterSnafu)?;
        Ok(zoom.min(self.view_max_zoom))
    }

    pub fn leaves(&self, cluster_id: usize, limit: usize, offset: usize) -> Result<Vec<Arc<Vessel>>> {
        let cache = self.cache.as_ref().context(NoClusterIndexSnafu)?;
        Ok(cache
            .index
            .leaves(cluster_id, limit, offset)
            .context(ClusterSnafu)?
            .into_iter()
            .map(|l| l.data.clone())
            .collect())
    }

    fn index(&mut self, filtered: &FilteredSnapshot) -> Result<&CachedIndex> {
        let fresh = self
            .cache
            .as_ref()
            .is_some_and(|c| c.generation == filtered.generation);

        if !fresh {
            let excluded = pinned(&filtered.source, filtered.selection.as_ref());
            let priority = priority_markers(filtered, filtered.selection.as_ref());

            let leaves = filtered
                .vessels
                .iter()
                .filter(|(mmsi, _)| !excluded.contains(*mmsi))
                .map(|(_, vessel)| Leaf {
                    lng: vessel.longitude,
                    lat: vessel.latitude,
                    data: vessel.clone(),
                });
            let index = Supercluster::new(self.options, leaves).context(ClusterSnafu)?;

            event!(
                Level::DEBUG,
                "rebuilt cluster index for generation {}: {} points, {} pinned",
                filtered.generation,
                index.num_points(),
                priority.len()
            );

            self.cache = Some(CachedIndex {
                generation: filtered.generation,
                index,
                priority,
            });
        }

        self.cache.as_ref().context(NoClusterIndexSnafu)
    }
}

/// The active vessel first, then every encounter partner present in the store, current
/// entries ahead of future ones.
///
/// Future partners are kept out of the index like current ones, so they need a marker of
/// their own to stay visible.
fn priority_markers(filtered: &FilteredSnapshot, active: Option<&Mmsi>) -> Vec<MapFeature> {
    let Some(vessel) = active.and_then(|m| filtered.source.get(m)) else {
        return Vec::new();
    };

    let mut seen = HashSet::from([vessel.mmsi.clone()]);
    let mut markers = vec![MapFeature::Vessel {
        vessel: vessel.clone(),
        role: MarkerRole::Active,
    }];

    let mut entries: Vec<&EncounteringVessel> = vessel.encounters(false).collect();
    entries.extend(vessel.encounters(true));

    for entry in entries {
        if !seen.insert(entry.mmsi.clone()) {
            continue;
        }
        if let Some(partner) = filtered.source.get(&entry.mmsi) {
            markers.push(MapFeature::Vessel {
                vessel: partner.clone(),
                role: MarkerRole::Encountering(entry.clone()),
            });
        }
    }

    markers
}
