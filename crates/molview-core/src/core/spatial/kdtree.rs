use super::algebra::Algebra;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct Node<A, const K: usize> {
    point: [A; K],
    item: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// A point returned by a neighbourhood query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour<'t, A, V> {
    pub squared_distance: A,
    pub value: &'t V,
}

impl<A: Algebra, V> Neighbour<'_, A, V> {
    pub fn distance(&self) -> A {
        self.squared_distance.sqrt()
    }
}

/// Heap entry ordered by distance, then by insertion ordinal.
#[derive(Debug, Clone, Copy)]
struct Candidate<A> {
    squared_distance: A,
    item: usize,
}

impl<A: Algebra> PartialEq for Candidate<A> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A: Algebra> Eq for Candidate<A> {}

impl<A: Algebra> PartialOrd for Candidate<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: Algebra> Ord for Candidate<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.squared_distance
            .total_cmp(&other.squared_distance)
            .then(self.item.cmp(&other.item))
    }
}

/// A k-d tree over `K`-dimensional points carrying a value of type `V` each.
///
/// Nodes live in an arena and reference each other by position. The splitting axis of a
/// node is its depth modulo `K`. Points may be inserted one at a time, or a balanced tree can
/// be built from a whole point set with [`KdTree::build`].
#[derive(Debug, Clone)]
pub struct KdTree<A, V, const K: usize> {
    nodes: Vec<Node<A, K>>,
    values: Vec<V>,
    root: Option<usize>,
}

impl<A: Algebra, V, const K: usize> Default for KdTree<A, V, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Algebra, V, const K: usize> KdTree<A, V, K> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Builds a balanced tree by recursive median splits.
    pub fn build(entries: impl IntoIterator<Item = ([A; K], V)>) -> Self {
        let (points, values): (Vec<[A; K]>, Vec<V>) = entries.into_iter().unzip();
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            values,
            root: None,
        };
        let mut order: Vec<usize> = (0..points.len()).collect();
        tree.root = tree.build_range(&points, &mut order, 0);
        tree
    }

    fn build_range(
        &mut self,
        points: &[[A; K]],
        order: &mut [usize],
        depth: usize,
    ) -> Option<usize> {
        if order.is_empty() {
            return None;
        }
        let axis = depth % K;
        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            points[a][axis]
                .total_cmp(&points[b][axis])
                .then(a.cmp(&b))
        });

        let item = order[mid];
        let node = self.nodes.len();
        self.nodes.push(Node {
            point: points[item],
            item,
            left: None,
            right: None,
        });

        let (lower, upper) = order.split_at_mut(mid);
        let left = self.build_range(points, lower, depth + 1);
        let right = self.build_range(points, &mut upper[1..], depth + 1);
        self.nodes[node].left = left;
        self.nodes[node].right = right;
        Some(node)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn insert(&mut self, point: [A; K], value: V) {
        let item = self.values.len();
        self.values.push(value);
        let node = self.nodes.len();
        self.nodes.push(Node {
            point,
            item,
            left: None,
            right: None,
        });

        let Some(mut current) = self.root else {
            self.root = Some(node);
            return;
        };
        let mut depth = 0;
        loop {
            let axis = depth % K;
            let parent = &mut self.nodes[current];
            let slot = if point[axis] < parent.point[axis] {
                &mut parent.left
            } else {
                &mut parent.right
            };
            match *slot {
                Some(child) => current = child,
                None => {
                    *slot = Some(node);
                    return;
                }
            }
            depth += 1;
        }
    }

    /// Returns up to `max_results` points within `radius` of `query`, nearest first.
    ///
    /// Points exactly at `radius` are included. Ties in distance are broken by insertion
    /// order, so results are deterministic for a given tree.
    pub fn nearest_within(
        &self,
        query: &[A; K],
        radius: A,
        max_results: usize,
    ) -> Vec<Neighbour<'_, A, V>> {
        if max_results == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::new();
        if let Some(root) = self.root {
            self.search(root, 0, query, radius * radius, max_results, &mut heap);
        }
        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbour {
                squared_distance: c.squared_distance,
                value: &self.values[c.item],
            })
            .collect()
    }

    /// Returns every point within `radius` of `query`, nearest first.
    pub fn within(&self, query: &[A; K], radius: A) -> Vec<Neighbour<'_, A, V>> {
        self.nearest_within(query, radius, usize::MAX)
    }

    fn search(
        &self,
        node: usize,
        depth: usize,
        query: &[A; K],
        radius_sq: A,
        max_results: usize,
        heap: &mut BinaryHeap<Candidate<A>>,
    ) {
        let current = &self.nodes[node];
        let squared_distance = A::squared_distance(query, &current.point);
        if squared_distance <= radius_sq {
            let candidate = Candidate {
                squared_distance,
                item: current.item,
            };
            if heap.len() < max_results {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        let axis = depth % K;
        let diff = query[axis] - current.point[axis];
        let (near, far) = if diff < A::ZERO {
            (current.left, current.right)
        } else {
            (current.right, current.left)
        };
        if let Some(child) = near {
            self.search(child, depth + 1, query, radius_sq, max_results, heap);
        }

        let bound = match heap.peek() {
            Some(worst) if heap.len() >= max_results => worst.squared_distance,
            _ => radius_sq,
        };
        if diff * diff <= bound {
            if let Some(child) = far {
                self.search(child, depth + 1, query, radius_sq, max_results, heap);
            }
        }
    }
}

impl<A: Algebra, V, const K: usize> FromIterator<([A; K], V)> for KdTree<A, V, K> {
    fn from_iter<I: IntoIterator<Item = ([A; K], V)>>(iter: I) -> Self {
        Self::build(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<([f32; 3], usize)> {
        let mut points = Vec::new();
        for x in 0..5 {
            for y in 0..5 {
                for z in 0..5 {
                    points.push(([x as f32, y as f32, z as f32], points.len()));
                }
            }
        }
        points
    }

    fn brute_force(points: &[([f32; 3], usize)], query: &[f32; 3], radius: f32) -> Vec<usize> {
        let mut hits: Vec<usize> = points
            .iter()
            .filter(|(p, _)| f32::squared_distance(p, query) <= radius * radius)
            .map(|(_, v)| *v)
            .collect();
        hits.sort_unstable();
        hits
    }

    #[test]
    fn built_and_inserted_trees_agree_with_brute_force() {
        let points = grid();
        let built: KdTree<f32, usize, 3> = points.iter().copied().collect();
        let mut inserted = KdTree::new();
        for (p, v) in &points {
            inserted.insert(*p, *v);
        }
        assert_eq!(built.len(), 125);

        for query in [[2.0, 2.0, 2.0], [0.1, 4.2, 3.7], [-1.0, -1.0, -1.0]] {
            let expected = brute_force(&points, &query, 1.5);
            for tree in [&built, &inserted] {
                let mut found: Vec<usize> = tree.within(&query, 1.5).iter().map(|n| *n.value).collect();
                found.sort_unstable();
                assert_eq!(found, expected);
            }
        }
    }

    #[test]
    fn results_are_sorted_and_capped() {
        let tree: KdTree<f32, usize, 3> = grid().into_iter().collect();
        let hits = tree.nearest_within(&[2.0, 2.0, 2.1], 1.5, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(*hits[0].value, 2 * 25 + 2 * 5 + 2);
        assert!((hits[0].distance() - 0.1).abs() < 1e-6);
        assert!(hits.windows(2).all(|w| w[0].squared_distance <= w[1].squared_distance));
    }

    #[test]
    fn works_for_other_dimensions_and_precisions() {
        let mut tree: KdTree<f64, &str, 2> = KdTree::new();
        tree.insert([0.0, 0.0], "origin");
        tree.insert([3.0, 4.0], "far");
        let hits = tree.within(&[0.0, 0.0], 5.0);
        assert_eq!(hits.iter().map(|n| *n.value).collect::<Vec<_>>(), ["origin", "far"]);
        assert!(tree.nearest_within(&[0.0, 0.0], 1.0, 0).is_empty());
        assert!(KdTree::<f64, (), 2>::new().within(&[0.0, 0.0], 1.0).is_empty());
    }
}
