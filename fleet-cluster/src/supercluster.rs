use fleet_core::GeoBounds;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ensure};
use tracing::{Level, event, instrument};

use crate::{
    KdBush,
    error::{
        Result,
        error::{InvalidOptionsSnafu, UnknownClusterSnafu},
    },
    kdbush::sq_dist,
    projection::{lat_y, lng_x, x_lng, y_lat},
};

const UNVISITED: u8 = u8::MAX;
const MAX_SUPPORTED_ZOOM: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Cluster radius in pixels.
    pub radius: f64,
    /// Tile extent in pixels, the radius is relative to it.
    pub extent: f64,
    /// Smallest number of points forming a cluster.
    pub min_points: usize,
    pub min_zoom: u8,
    /// Highest zoom at which points are clustered, every point stands alone above it.
    pub max_zoom: u8,
    /// Leaf size of the k-d trees.
    pub node_size: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius: 180.0,
            extent: 512.0,
            min_points: 3,
            min_zoom: 0,
            max_zoom: 12,
            node_size: 64,
        }
    }
}

impl ClusterOptions {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_zoom <= self.max_zoom,
            InvalidOptionsSnafu {
                reason: format!(
                    "min_zoom {} is above max_zoom {}",
                    self.min_zoom, self.max_zoom
                ),
            }
        );
        ensure!(
            self.max_zoom <= MAX_SUPPORTED_ZOOM,
            InvalidOptionsSnafu {
                reason: format!("max_zoom {} is above {MAX_SUPPORTED_ZOOM}", self.max_zoom),
            }
        );
        ensure!(
            self.min_points >= 2,
            InvalidOptionsSnafu {
                reason: "min_points must be at least 2",
            }
        );
        ensure!(
            self.radius.is_finite() && self.radius > 0.0,
            InvalidOptionsSnafu {
                reason: format!("radius {} is not positive", self.radius),
            }
        );
        ensure!(
            self.extent.is_finite() && self.extent > 0.0,
            InvalidOptionsSnafu {
                reason: format!("extent {} is not positive", self.extent),
            }
        );
        ensure!(
            self.node_size >= 2,
            InvalidOptionsSnafu {
                reason: "node_size must be at least 2",
            }
        );
        Ok(())
    }
}

/// An input point carrying caller data.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<T> {
    pub lng: f64,
    pub lat: f64,
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSummary {
    pub id: usize,
    /// Weighted centroid of the clustered points.
    pub lng: f64,
    pub lat: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClusterNode<'a, T> {
    Point { index: usize, leaf: &'a Leaf<T> },
    Cluster(ClusterSummary),
}

impl<T> ClusterNode<'_, T> {
    pub fn count(&self) -> usize {
        match self {
            ClusterNode::Point { .. } => 1,
            ClusterNode::Cluster(c) => c.count,
        }
    }

    /// `(longitude, latitude)`
    pub fn position(&self) -> (f64, f64) {
        match self {
            ClusterNode::Point { leaf, .. } => (leaf.lng, leaf.lat),
            ClusterNode::Cluster(c) => (c.lng, c.lat),
        }
    }
}

/// Projected bounding box of every leaf below a node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Footprint {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Footprint {
    fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn union(&self, other: &Footprint) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Squared length of the diagonal, an upper bound for the squared distance of any two
    /// leaves inside.
    fn sq_diagonal(&self) -> f64 {
        sq_dist(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    x: f64,
    y: f64,
    /// Last zoom at which this node has been processed.
    zoom: u8,
    /// Leaf index for single points, cluster id otherwise.
    index: usize,
    parent_id: Option<usize>,
    num_points: usize,
    footprint: Footprint,
}

#[derive(Debug, Clone)]
struct ZoomTree {
    index: KdBush,
    nodes: Vec<Node>,
}

impl ZoomTree {
    fn new(nodes: Vec<Node>, node_size: usize) -> Self {
        Self {
            index: KdBush::new(nodes.iter().map(|n| (n.x, n.y)), node_size),
            nodes,
        }
    }
}

/// Zoom-indexed point clusters.
///
/// One k-d tree is built per zoom level, from `max_zoom + 1` (the raw points) down to
/// `min_zoom`, each level greedily merging the nodes of the level above. A cluster id
/// encodes the index of its seed node and the level the seed lives in, which is what
/// lets [Supercluster::children] find the members again.
#[derive(Debug, Clone)]
pub struct Supercluster<T> {
    options: ClusterOptions,
    leaves: Vec<Leaf<T>>,
    trees: Vec<Option<ZoomTree>>,
}

impl<T> Supercluster<T> {
    #[instrument(skip_all, fields(app.num_points))]
    pub fn new(options: ClusterOptions, points: impl IntoIterator<Item = Leaf<T>>) -> Result<Self> {
        options.validate()?;

        let leaves: Vec<Leaf<T>> = points
            .into_iter()
            .filter(|l| l.lng.is_finite() && l.lat.is_finite())
            .collect();
        tracing::Span::current().record("app.num_points", leaves.len());

        let nodes = leaves
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let (x, y) = (lng_x(l.lng), lat_y(l.lat));
                Node {
                    x,
                    y,
                    zoom: UNVISITED,
                    index: i,
                    parent_id: None,
                    num_points: 1,
                    footprint: Footprint::point(x, y),
                }
            })
            .collect();

        let top = usize::from(options.max_zoom) + 1;
        let mut trees: Vec<Option<ZoomTree>> = (0..=top).map(|_| None).collect();
        trees[top] = Some(ZoomTree::new(nodes, options.node_size));

        for zoom in (options.min_zoom..=options.max_zoom).rev() {
            let z = usize::from(zoom);
            let Some(previous) = trees[z + 1].as_mut() else {
                break;
            };
            let next = cluster(previous, zoom, &options, leaves.len());
            event!(
                Level::TRACE,
                "zoom {zoom}: {} nodes from {}",
                next.len(),
                previous.nodes.len()
            );
            trees[z] = Some(ZoomTree::new(next, options.node_size));
        }

        Ok(Self {
            options,
            leaves,
            trees,
        })
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    pub fn num_points(&self) -> usize {
        self.leaves.len()
    }

    /// Clusters and single points whose position falls inside `bounds` at `zoom`.
    pub fn clusters(&self, bounds: &GeoBounds, zoom: u8) -> Vec<ClusterNode<'_, T>> {
        let wrap = |lng: f64| ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0;

        let mut min_lng = wrap(bounds.west);
        let min_lat = bounds.south.clamp(-90.0, 90.0);
        let mut max_lng = if bounds.east == 180.0 {
            180.0
        } else {
            wrap(bounds.east)
        };
        let max_lat = bounds.north.clamp(-90.0, 90.0);

        if bounds.east - bounds.west >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut eastern =
                self.clusters(&GeoBounds::new(min_lng, min_lat, 180.0, max_lat), zoom);
            eastern.extend(self.clusters(&GeoBounds::new(-180.0, min_lat, max_lng, max_lat), zoom));
            return eastern;
        }

        let Some(tree) = self.tree(self.limit_zoom(zoom)) else {
            return Vec::new();
        };

        tree.index
            .range(
                lng_x(min_lng),
                lat_y(max_lat),
                lng_x(max_lng),
                lat_y(min_lat),
            )
            .into_iter()
            .map(|i| self.to_cluster_node(&tree.nodes[i]))
            .collect()
    }

    /// The nodes merged into `cluster_id` at the zoom it was formed.
    pub fn children(&self, cluster_id: usize) -> Result<Vec<ClusterNode<'_, T>>> {
        let origin_id = self.origin_id(cluster_id)?;
        let origin_zoom = self.origin_zoom(cluster_id)?;

        let tree = self
            .tree(origin_zoom)
            .context(UnknownClusterSnafu { id: cluster_id })?;
        let seed = tree
            .nodes
            .get(origin_id)
            .context(UnknownClusterSnafu { id: cluster_id })?;

        let r = self.radius_at(origin_zoom - 1);
        let children: Vec<_> = tree
            .index
            .within(seed.x, seed.y, r)
            .into_iter()
            .filter(|&i| tree.nodes[i].parent_id == Some(cluster_id))
            .map(|i| self.to_cluster_node(&tree.nodes[i]))
            .collect();

        ensure!(!children.is_empty(), UnknownClusterSnafu { id: cluster_id });

        Ok(children)
    }

    /// Input points of `cluster_id`, paginated by `limit` and `offset`.
    pub fn leaves(&self, cluster_id: usize, limit: usize, offset: usize) -> Result<Vec<&Leaf<T>>> {
        let mut result = Vec::new();
        if limit > 0 {
            self.append_leaves(&mut result, cluster_id, limit, offset, 0)?;
        }
        Ok(result)
    }

    fn append_leaves<'a>(
        &'a self,
        result: &mut Vec<&'a Leaf<T>>,
        cluster_id: usize,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> Result<usize> {
        for child in self.children(cluster_id)? {
            match child {
                ClusterNode::Cluster(c) => {
                    if skipped + c.count <= offset {
                        skipped += c.count;
                    } else {
                        skipped = self.append_leaves(result, c.id, limit, offset, skipped)?;
                    }
                }
                ClusterNode::Point { leaf, .. } => {
                    if skipped < offset {
                        skipped += 1;
                    } else {
                        result.push(leaf);
                    }
                }
            }
            if result.len() == limit {
                break;
            }
        }
        Ok(skipped)
    }

    /// The zoom at which `cluster_id` splits into several nodes.
    pub fn expansion_zoom(&self, cluster_id: usize) -> Result<u8> {
        let mut id = cluster_id;
        let mut expansion = self.origin_zoom(cluster_id)? - 1;

        while expansion <= self.options.max_zoom {
            let children = self.children(id)?;
            expansion += 1;
            match children.as_slice() {
                [ClusterNode::Cluster(c)] => id = c.id,
                _ => break,
            }
        }

        Ok(expansion)
    }

    fn tree(&self, zoom: u8) -> Option<&ZoomTree> {
        self.trees.get(usize::from(zoom)).and_then(|t| t.as_ref())
    }

    fn limit_zoom(&self, zoom: u8) -> u8 {
        zoom.clamp(self.options.min_zoom, self.options.max_zoom + 1)
    }

    fn radius_at(&self, zoom: u8) -> f64 {
        self.options.radius / (self.options.extent * f64::from(1u32 << zoom))
    }

    fn origin_id(&self, cluster_id: usize) -> Result<usize> {
        ensure!(
            cluster_id >= self.leaves.len(),
            UnknownClusterSnafu { id: cluster_id }
        );
        Ok((cluster_id - self.leaves.len()) >> 5)
    }

    fn origin_zoom(&self, cluster_id: usize) -> Result<u8> {
        ensure!(
            cluster_id >= self.leaves.len(),
            UnknownClusterSnafu { id: cluster_id }
        );
        let zoom = ((cluster_id - self.leaves.len()) % 32) as u8;
        ensure!(
            zoom > self.options.min_zoom && zoom <= self.options.max_zoom + 1,
            UnknownClusterSnafu { id: cluster_id }
        );
        Ok(zoom)
    }

    fn to_cluster_node(&self, node: &Node) -> ClusterNode<'_, T> {
        if node.num_points > 1 {
            ClusterNode::Cluster(ClusterSummary {
                id: node.index,
                lng: x_lng(node.x),
                lat: y_lat(node.y),
                count: node.num_points,
            })
        } else {
            ClusterNode::Point {
                index: node.index,
                leaf: &self.leaves[node.index],
            }
        }
    }
}

/// Merges the nodes of `tree` at `zoom` and returns the nodes of the level below.
///
/// Candidates within the radius of a seed are taken nearest first and only accepted while
/// the footprint of the seed and every accepted member still has a diagonal of at most
/// `radius` pixels, so any two leaves of a cluster are at most `radius` pixels apart at
/// `zoom`.
fn cluster(tree: &mut ZoomTree, zoom: u8, options: &ClusterOptions, num_leaves: usize) -> Vec<Node> {
    let r = options.radius / (options.extent * f64::from(1u32 << zoom));
    let r2 = r * r;
    let mut next = Vec::with_capacity(tree.nodes.len());

    for i in 0..tree.nodes.len() {
        if tree.nodes[i].zoom <= zoom {
            continue;
        }
        tree.nodes[i].zoom = zoom;
        let seed = tree.nodes[i];

        let mut candidates: Vec<(f64, usize)> = tree
            .index
            .within(seed.x, seed.y, r)
            .into_iter()
            .filter(|&j| j != i && tree.nodes[j].zoom > zoom)
            .map(|j| (sq_dist(seed.x, seed.y, tree.nodes[j].x, tree.nodes[j].y), j))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut footprint = seed.footprint;
        let mut members: Vec<usize> = Vec::new();
        for (_, j) in candidates {
            let grown = footprint.union(&tree.nodes[j].footprint);
            if grown.sq_diagonal() <= r2 {
                footprint = grown;
                members.push(j);
            }
        }

        let num_points =
            seed.num_points + members.iter().map(|&m| tree.nodes[m].num_points).sum::<usize>();

        if !members.is_empty() && num_points >= options.min_points {
            let id = (i << 5) + usize::from(zoom) + 1 + num_leaves;
            let mut wx = seed.x * seed.num_points as f64;
            let mut wy = seed.y * seed.num_points as f64;

            for &m in &members {
                let node = &mut tree.nodes[m];
                node.zoom = zoom;
                node.parent_id = Some(id);
                wx += node.x * node.num_points as f64;
                wy += node.y * node.num_points as f64;
            }
            tree.nodes[i].parent_id = Some(id);

            next.push(Node {
                x: wx / num_points as f64,
                y: wy / num_points as f64,
                zoom: UNVISITED,
                index: id,
                parent_id: None,
                num_points,
                footprint,
            });
        } else {
            next.push(seed);
            for &m in &members {
                tree.nodes[m].zoom = zoom;
                next.push(tree.nodes[m]);
            }
        }
    }

    next
}
