use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{BBox, Point3, Vec3};

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { first: u32, len: u32 },
    Branch { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: BBox,
    kind: NodeKind,
}

/// Bounding-volume hierarchy over primitive bounds (one entry per triangle).
///
/// Primitives are addressed by their index in the slice passed to [`Bvh::build`].
#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<Node>,
    order: Vec<u32>,
}

impl Bvh {
    const LEAF_SIZE: usize = 4;

    #[must_use]
    pub(crate) fn build(bounds: &[BBox]) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }
        let mut bvh = Self {
            nodes: Vec::with_capacity(bounds.len() * 2),
            order: (0..bounds.len() as u32).collect(),
        };
        bvh.split(bounds, 0, bounds.len());
        Some(bvh)
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn root_bounds(&self) -> BBox {
        self.nodes[0].bounds
    }

    fn split(&mut self, bounds: &[BBox], start: usize, end: usize) -> u32 {
        let range = &self.order[start..end];
        let mut enclosing = bounds[range[0] as usize];
        for &prim in &range[1..] {
            enclosing = enclosing.union(bounds[prim as usize]);
        }

        let index = self.nodes.len() as u32;
        self.nodes.push(Node {
            bounds: enclosing,
            kind: NodeKind::Leaf {
                first: start as u32,
                len: (end - start) as u32,
            },
        });
        if end - start <= Self::LEAF_SIZE {
            return index;
        }

        // Median split along the axis with the widest centroid spread.
        let axis = widest_centroid_axis(bounds, &self.order[start..end]);
        let mid = start + (end - start) / 2;
        self.order[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = axis_component(bounds[*a as usize].center(), axis);
            let cb = axis_component(bounds[*b as usize].center(), axis);
            ca.total_cmp(&cb)
        });

        let left = self.split(bounds, start, mid);
        let right = self.split(bounds, mid, end);
        self.nodes[index as usize].kind = NodeKind::Branch { left, right };
        index
    }

    /// Visits every primitive whose node bounds the ray segment `[0, max_t]` touches.
    ///
    /// The callback returns `false` to stop the traversal early.
    pub(crate) fn ray_candidates<F>(&self, origin: Point3, dir: Vec3, max_t: f64, mut visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        let mut stack = vec![0u32];
        while let Some(idx) = stack.pop() {
            let node = self.nodes[idx as usize];
            if !ray_hits_box(origin, dir, node.bounds, max_t) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { first, len } => {
                    let leaf = &self.order[first as usize..(first + len) as usize];
                    for &prim in leaf {
                        if !visit(prim as usize) {
                            return;
                        }
                    }
                }
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Best-first search for the primitive closest to `point`.
    ///
    /// `distance_to_prim` returns the squared distance from `point` to a primitive.
    pub(crate) fn nearest<F>(&self, point: Point3, mut distance_to_prim: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> f64,
    {
        let mut best: Option<(usize, f64)> = None;
        let mut heap = BinaryHeap::new();
        heap.push(Pending {
            dist2: self.nodes[0].bounds.distance_squared_to_point(point),
            node: 0,
        });

        while let Some(Pending { dist2, node }) = heap.pop() {
            if best.is_some_and(|(_, best_d2)| dist2 > best_d2) {
                break;
            }
            match self.nodes[node as usize].kind {
                NodeKind::Leaf { first, len } => {
                    for &prim in &self.order[first as usize..(first + len) as usize] {
                        let d2 = distance_to_prim(prim as usize);
                        if !d2.is_finite() {
                            continue;
                        }
                        if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
                            best = Some((prim as usize, d2));
                        }
                    }
                }
                NodeKind::Branch { left, right } => {
                    for child in [left, right] {
                        let child_d2 = self.nodes[child as usize].bounds.distance_squared_to_point(point);
                        if best.is_none_or(|(_, best_d2)| child_d2 <= best_d2) {
                            heap.push(Pending {
                                dist2: child_d2,
                                node: child,
                            });
                        }
                    }
                }
            }
        }

        best
    }
}

fn widest_centroid_axis(bounds: &[BBox], prims: &[u32]) -> usize {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for &prim in prims {
        let c = bounds[prim as usize].center().to_array();
        for axis in 0..3 {
            lo[axis] = lo[axis].min(c[axis]);
            hi[axis] = hi[axis].max(c[axis]);
        }
    }
    let spread = [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]];
    if spread[0] >= spread[1] && spread[0] >= spread[2] {
        0
    } else if spread[1] >= spread[2] {
        1
    } else {
        2
    }
}

fn axis_component(p: Point3, axis: usize) -> f64 {
    p.to_array()[axis]
}

/// Slab test of the segment `origin + t * dir`, `t ∈ [0, max_t]`, against `bounds`.
fn ray_hits_box(origin: Point3, dir: Vec3, bounds: BBox, max_t: f64) -> bool {
    let o = origin.to_array();
    let d = dir.to_array();
    let lo = bounds.min.to_array();
    let hi = bounds.max.to_array();

    let mut t_enter = 0.0_f64;
    let mut t_exit = max_t;
    for axis in 0..3 {
        if d[axis].abs() <= 1e-15 {
            if o[axis] < lo[axis] || o[axis] > hi[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d[axis];
        let (mut t0, mut t1) = ((lo[axis] - o[axis]) * inv, (hi[axis] - o[axis]) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_exit < t_enter {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    dist2: f64,
    node: u32,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the closest node first.
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| other.node.cmp(&self.node))
    }
}
