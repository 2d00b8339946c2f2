//! Isolation tree
//!
//! Trees are built by recursively partitioning a one-dimensional sample at
//! random split points until every point is isolated, all remaining points are
//! identical, or the height limit is reached.

use rand::Rng;

use crate::error::{DetectorError, DetectorResult};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points.
///
/// Used both to normalize scores and to account for the unbuilt subtree
/// below a leaf that still holds several points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Internal {
        split: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
        min: f64,
        max: f64,
    },
}

/// A single random partitioning tree
#[derive(Debug, Clone)]
pub struct IsolationTree {
    nodes: Vec<Node>,
    max_depth: usize,
}

impl IsolationTree {
    /// Grow a tree over `samples`
    pub fn fit<R: Rng + ?Sized>(samples: &[f64], max_depth: usize, rng: &mut R) -> DetectorResult<Self> {
        if samples.is_empty() {
            return Err(DetectorError::EmptyWindow);
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(DetectorError::NonFiniteWindow);
        }

        let mut tree = Self {
            nodes: Vec::with_capacity(2 * samples.len()),
            max_depth,
        };
        let mut work = samples.to_vec();
        tree.build(&mut work, 0, rng);

        Ok(tree)
    }

    fn build<R: Rng + ?Sized>(&mut self, samples: &mut [f64], depth: usize, rng: &mut R) -> usize {
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        if depth >= self.max_depth || samples.len() <= 1 || max <= min || !(max - min).is_finite() {
            return self.push(Node::Leaf { size: samples.len(), min, max });
        }

        // split in [min, max) keeps both sides non-empty with `<=` going left
        let split = rng.gen_range(min..max);
        let mid = partition(samples, split);
        if mid == 0 || mid == samples.len() {
            return self.push(Node::Leaf { size: samples.len(), min, max });
        }

        let index = self.push(Node::Internal { split, left: 0, right: 0 });
        let (lower, upper) = samples.split_at_mut(mid);
        let left = self.build(lower, depth + 1, rng);
        let right = self.build(upper, depth + 1, rng);
        self.nodes[index] = Node::Internal { split, left, right };

        index
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Number of partitioning steps needed to isolate `value`
    pub fn path_length(&self, value: f64) -> f64 {
        let mut index = 0;
        let mut depth = 0usize;

        loop {
            match self.nodes[index] {
                Node::Internal { split, left, right } => {
                    index = if value <= split { left } else { right };
                    depth += 1;
                }
                Node::Leaf { size, min, max } => {
                    let unbuilt = average_path_length(size);
                    // A point outside the leaf's range is separated by one more cut
                    if value < min || value > max {
                        return depth as f64 + unbuilt.min(1.0);
                    }
                    return depth as f64 + unbuilt;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Height of the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes[index] {
                Node::Internal { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
                Node::Leaf { .. } => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Move values `<= split` to the front; returns the count moved
fn partition(samples: &mut [f64], split: f64) -> usize {
    let mut mid = 0;
    for i in 0..samples.len() {
        if samples[i] <= split {
            samples.swap(i, mid);
            mid += 1;
        }
    }
    mid
}
