use std::collections::{HashMap, HashSet};

use fleet_cluster::{
    ClusterNode, ClusterOptions, Leaf, Supercluster,
    projection::{lat_y, lng_x, pixel_distance},
};
use fleet_core::GeoBounds;

use crate::helper::index;

const EPSILON: f64 = 1e-6;

fn project(lng: f64, lat: f64) -> (f64, f64) {
    (lng_x(lng), lat_y(lat))
}

#[test]
fn test_leaves_of_clusters_are_within_radius_at_every_zoom() {
    let index = index(5000, 1);
    let options = ClusterOptions::default();
    let mut checked = 0;

    for zoom in options.min_zoom..=options.max_zoom {
        let clusters: Vec<_> = index
            .clusters(&GeoBounds::world(), zoom)
            .into_iter()
            .filter_map(|n| match n {
                ClusterNode::Cluster(c) => Some(c),
                ClusterNode::Point { .. } => None,
            })
            .collect();
        checked += clusters.len();

        for cluster in clusters {
            let leaves = index.leaves(cluster.id, usize::MAX, 0).unwrap();
            assert_eq!(leaves.len(), cluster.count);

            // The diagonal of the projected bounding box bounds every pairwise distance.
            let projected: Vec<_> = leaves.iter().map(|l| project(l.lng, l.lat)).collect();
            let min = projected
                .iter()
                .fold((f64::MAX, f64::MAX), |acc, p| (acc.0.min(p.0), acc.1.min(p.1)));
            let max = projected
                .iter()
                .fold((f64::MIN, f64::MIN), |acc, p| (acc.0.max(p.0), acc.1.max(p.1)));

            let d = pixel_distance(min, max, zoom, options.extent);
            assert!(
                d <= options.radius + EPSILON,
                "cluster {} spans {d} px at zoom {zoom}",
                cluster.id
            );
        }
    }

    assert!(checked > 0);
}

#[test]
fn test_wide_clusters_do_not_absorb_each_other() {
    // Two groups, each 170 px wide at zoom 12. Their centroids are 170 px apart at zoom 11
    // but their outer points are 255 px apart.
    let options = ClusterOptions::default();
    let px = 360.0 / (options.extent * f64::from(1u32 << 12));
    let points: Vec<_> = [0.0, 85.0, 170.0, 340.0, 425.0, 510.0]
        .into_iter()
        .enumerate()
        .map(|(i, offset)| Leaf {
            lng: 9.0 + offset * px,
            lat: 0.0,
            data: i,
        })
        .collect();
    let index = Supercluster::new(options, points).unwrap();

    for zoom in [12, 11] {
        let nodes = index.clusters(&GeoBounds::world(), zoom);
        assert_eq!(nodes.len(), 2, "zoom {zoom}");
        assert!(nodes.iter().all(|n| n.count() == 3), "zoom {zoom}");
    }
    assert_eq!(index.clusters(&GeoBounds::world(), 10).len(), 1);
}

#[test]
fn test_cluster_members_are_within_radius_at_every_zoom() {
    let index = index(1000, 2);
    let options = ClusterOptions::default();

    for zoom in options.min_zoom..=options.max_zoom {
        for node in index.clusters(&GeoBounds::world(), zoom) {
            let ClusterNode::Cluster(cluster) = node else {
                continue;
            };
            let members: Vec<_> = index
                .children(cluster.id)
                .unwrap()
                .iter()
                .map(|c| {
                    let (lng, lat) = c.position();
                    project(lng, lat)
                })
                .collect();

            for a in &members {
                for b in &members {
                    let d = pixel_distance(*a, *b, zoom, options.extent);
                    assert!(d <= options.radius + EPSILON, "{d} px apart at zoom {zoom}");
                }
            }
        }
    }
}

#[test]
fn test_every_point_is_returned_individually_above_max_zoom() {
    let index = index(500, 3);
    let max_zoom = index.options().max_zoom;

    for zoom in [max_zoom + 1, max_zoom + 5, 22] {
        let nodes = index.clusters(&GeoBounds::world(), zoom);
        assert_eq!(nodes.len(), 500);
        assert!(
            nodes
                .iter()
                .all(|n| matches!(n, ClusterNode::Point { .. }))
        );
    }
}

#[test]
fn test_counts_cover_every_point_at_every_zoom() {
    let index = index(800, 4);

    for zoom in 0..=14 {
        let total: usize = index
            .clusters(&GeoBounds::world(), zoom)
            .iter()
            .map(|n| n.count())
            .sum();
        assert_eq!(total, 800, "zoom {zoom}");
    }
}

#[test]
fn test_clusters_are_stable_when_panning() {
    let index = index(1500, 5);
    let zoom = 7;

    let left = GeoBounds::new(8.0, 55.0, 11.0, 57.5);
    let right = GeoBounds::new(9.0, 55.0, 12.0, 57.5);
    let overlap = GeoBounds::new(9.0, 55.0, 11.0, 57.5);

    let collect = |bounds: &GeoBounds| -> HashMap<usize, (usize, HashSet<usize>)> {
        index
            .clusters(bounds, zoom)
            .into_iter()
            .filter_map(|n| match n {
                ClusterNode::Cluster(c) => Some(c),
                ClusterNode::Point { .. } => None,
            })
            .filter(|c| overlap.contains(c.lng, c.lat))
            .map(|c| {
                let leaves = index
                    .leaves(c.id, usize::MAX, 0)
                    .unwrap()
                    .into_iter()
                    .map(|l| l.data)
                    .collect();
                (c.id, (c.count, leaves))
            })
            .collect()
    };

    let a = collect(&left);
    let b = collect(&right);

    assert!(!a.is_empty());
    assert_eq!(a, b);
}
