//! A static, flat k-d tree over 2D points.
//!
//! Built once, queried many times; nothing is ever inserted after construction.

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: usize,
    x: f64,
    y: f64,
}

impl Entry {
    fn coord(&self, axis: usize) -> f64 {
        if axis == 0 { self.x } else { self.y }
    }
}

#[derive(Debug, Clone)]
pub struct KdBush {
    node_size: usize,
    entries: Vec<Entry>,
}

impl KdBush {
    /// Indexes `points`, the id of each point is its position in the iterator.
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>, node_size: usize) -> Self {
        let mut entries: Vec<Entry> = points
            .into_iter()
            .enumerate()
            .map(|(id, (x, y))| Entry { id, x, y })
            .collect();

        let node_size = node_size.max(1);
        sort(&mut entries, node_size, 0);

        Self { node_size, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of every point inside the axis aligned box, edges included.
    pub fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let mut result = Vec::new();
        let mut stack = vec![(0, self.entries.len(), 0)];

        while let Some((start, end, axis)) = stack.pop() {
            if end - start <= self.node_size {
                result.extend(
                    self.entries[start..end]
                        .iter()
                        .filter(|e| e.x >= min_x && e.x <= max_x && e.y >= min_y && e.y <= max_y)
                        .map(|e| e.id),
                );
                continue;
            }

            let m = start + (end - start) / 2;
            let e = &self.entries[m];
            if e.x >= min_x && e.x <= max_x && e.y >= min_y && e.y <= max_y {
                result.push(e.id);
            }

            let (lo, hi) = if axis == 0 {
                (min_x, max_x)
            } else {
                (min_y, max_y)
            };
            if lo <= e.coord(axis) {
                stack.push((start, m, 1 - axis));
            }
            if hi >= e.coord(axis) {
                stack.push((m + 1, end, 1 - axis));
            }
        }

        result
    }

    /// Ids of every point within euclidean distance `r` of `(qx, qy)`.
    pub fn within(&self, qx: f64, qy: f64, r: f64) -> Vec<usize> {
        let r2 = r * r;
        let in_circle = |e: &Entry| sq_dist(e.x, e.y, qx, qy) <= r2;

        let mut result = Vec::new();
        let mut stack = vec![(0, self.entries.len(), 0)];

        while let Some((start, end, axis)) = stack.pop() {
            if end - start <= self.node_size {
                result.extend(
                    self.entries[start..end]
                        .iter()
                        .filter(|e| in_circle(e))
                        .map(|e| e.id),
                );
                continue;
            }

            let m = start + (end - start) / 2;
            let e = &self.entries[m];
            if in_circle(e) {
                result.push(e.id);
            }

            let q = if axis == 0 { qx } else { qy };
            if q - r <= e.coord(axis) {
                stack.push((start, m, 1 - axis));
            }
            if q + r >= e.coord(axis) {
                stack.push((m + 1, end, 1 - axis));
            }
        }

        result
    }
}

pub(crate) fn sq_dist(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

fn sort(entries: &mut [Entry], node_size: usize, axis: usize) {
    if entries.len() <= node_size {
        return;
    }

    let m = entries.len() / 2;
    entries.select_nth_unstable_by(m, |a, b| a.coord(axis).total_cmp(&b.coord(axis)));

    let (left, right) = entries.split_at_mut(m);
    sort(left, node_size, 1 - axis);
    sort(&mut right[1..], node_size, 1 - axis);
}
