use std::collections::HashMap;
use std::hash::Hash;

use crate::geometry::Envelope;

const DEFAULT_MAX_DEPTH: usize = 10;
const DEFAULT_TARGET_COUNT: usize = 10;

#[derive(Debug, Clone, Copy)]
struct Split {
    /// Split on x (a vertical line) when true, on y otherwise.
    vertical: bool,
    at: f64,
    low: usize,
    high: usize,
}

#[derive(Debug, Clone)]
struct BspNode<K> {
    depth: usize,
    vertical: bool,
    split: Option<Split>,
    items: Vec<(K, Envelope)>,
}

impl<K> BspNode<K> {
    fn new(depth: usize, vertical: bool) -> Self {
        Self {
            depth,
            vertical,
            split: None,
            items: Vec::new(),
        }
    }
}

/// Which side of a split an envelope falls on, if it does not straddle it.
fn side(split: &Split, env: &Envelope) -> Option<bool> {
    let (lo, hi) = if split.vertical {
        (env.min.x, env.max.x)
    } else {
        (env.min.y, env.max.y)
    };
    if hi < split.at {
        Some(false)
    } else if lo > split.at {
        Some(true)
    } else {
        None
    }
}

/// Binary space partition over keyed 2D envelopes.
///
/// Nodes split at the middle of their items' extent, alternating between
/// vertical and horizontal split lines. Items straddling a split line stay
/// at the splitting node. Intended to live for a single operation.
#[derive(Debug, Clone)]
pub struct Bsp<K> {
    nodes: Vec<BspNode<K>>,
    location: HashMap<K, usize>,
    max_depth: usize,
    target_count: usize,
}

impl<K: Copy + Eq + Hash> Default for Bsp<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> Bsp<K> {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_DEPTH, DEFAULT_TARGET_COUNT)
    }

    pub fn with_limits(max_depth: usize, target_count: usize) -> Self {
        Self {
            nodes: vec![BspNode::new(0, true)],
            location: HashMap::new(),
            max_depth,
            target_count: target_count.max(1),
        }
    }

    /// Build an index over `items` in one pass.
    pub fn build(items: impl IntoIterator<Item = (K, Envelope)>) -> Self {
        let mut bsp = Self::new();
        for (key, env) in items {
            bsp.insert(key, env);
        }
        bsp
    }

    pub fn len(&self) -> usize {
        self.location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.location.contains_key(key)
    }

    /// Insert or replace the envelope stored for `key`.
    pub fn insert(&mut self, key: K, env: Envelope) {
        self.remove(&key);
        let mut idx = 0;
        while let Some(split) = self.nodes[idx].split {
            match side(&split, &env) {
                Some(false) => idx = split.low,
                Some(true) => idx = split.high,
                None => break,
            }
        }
        self.nodes[idx].items.push((key, env));
        self.location.insert(key, idx);
        self.maybe_split(idx);
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(idx) = self.location.remove(key) else {
            return false;
        };
        let items = &mut self.nodes[idx].items;
        if let Some(pos) = items.iter().position(|(k, _)| k == key) {
            items.swap_remove(pos);
        }
        true
    }

    fn maybe_split(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        if node.split.is_some() || node.depth >= self.max_depth || node.items.len() <= self.target_count {
            return;
        }
        let (depth, vertical) = (node.depth, node.vertical);
        let (lo, hi) = node.items.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, e)| {
            if vertical {
                (lo.min(e.min.x), hi.max(e.max.x))
            } else {
                (lo.min(e.min.y), hi.max(e.max.y))
            }
        });
        let low = self.nodes.len();
        self.nodes.push(BspNode::new(depth + 1, !vertical));
        self.nodes.push(BspNode::new(depth + 1, !vertical));
        let split = Split {
            vertical,
            at: lo + (hi - lo) / 2.0,
            low,
            high: low + 1,
        };
        self.nodes[idx].split = Some(split);

        let items = std::mem::take(&mut self.nodes[idx].items);
        for (key, env) in items {
            let target = match side(&split, &env) {
                Some(false) => split.low,
                Some(true) => split.high,
                None => idx,
            };
            self.nodes[target].items.push((key, env));
            self.location.insert(key, target);
        }
        self.maybe_split(split.low);
        self.maybe_split(split.high);
    }

    /// Keys whose envelopes intersect `env`, grown by `epsilon`.
    pub fn query(&self, env: &Envelope, epsilon: f64) -> Vec<K> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            out.extend(
                node.items
                    .iter()
                    .filter(|(_, e)| e.intersects(env, epsilon))
                    .map(|(k, _)| *k),
            );
            if let Some(split) = node.split {
                let (lo, hi) = if split.vertical {
                    (env.min.x, env.max.x)
                } else {
                    (env.min.y, env.max.y)
                };
                if lo - epsilon <= split.at {
                    stack.push(split.low);
                }
                if hi + epsilon >= split.at {
                    stack.push(split.high);
                }
            }
        }
        out
    }

    /// Depth of the deepest node; zero when the root never split.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn unit_box(x: f64, y: f64) -> Envelope {
        Envelope::new(Point::new(x, y), Point::new(x + 1.0, y + 1.0))
    }

    fn grid(n: usize) -> Bsp<usize> {
        Bsp::build((0..n * n).map(|i| (i, unit_box((i % n) as f64 * 2.0, (i / n) as f64 * 2.0))))
    }

    #[test]
    fn test_query_matches_brute_force() {
        let bsp = grid(12);
        assert_eq!(bsp.len(), 144);
        assert!(bsp.depth() > 0);
        let window = Envelope::new(Point::new(3.5, 3.5), Point::new(8.5, 4.5));
        let mut hits = bsp.query(&window, 1e-7);
        hits.sort_unstable();
        let mut expected: Vec<usize> = (0..144)
            .filter(|&i| unit_box((i % 12) as f64 * 2.0, (i / 12) as f64 * 2.0).intersects(&window, 1e-7))
            .collect();
        expected.sort_unstable();
        assert_eq!(hits, expected);
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_remove_and_reinsert() {
        let mut bsp = grid(5);
        let window = unit_box(0.0, 0.0);
        assert!(bsp.query(&window, 0.0).contains(&0));
        assert!(bsp.remove(&0));
        assert!(!bsp.remove(&0));
        assert!(!bsp.query(&window, 0.0).contains(&0));
        bsp.insert(0, unit_box(100.0, 100.0));
        assert!(bsp.query(&unit_box(100.0, 100.0), 0.0).contains(&0));
        assert_eq!(bsp.len(), 25);
    }

    #[test]
    fn test_straddling_item_is_found() {
        let mut bsp = grid(6);
        let wide = Envelope::new(Point::new(-1.0, 5.2), Point::new(20.0, 5.4));
        bsp.insert(999, wide);
        assert!(bsp.query(&unit_box(10.0, 5.0), 0.0).contains(&999));
        assert!(bsp.query(&unit_box(-0.5, 5.0), 0.0).contains(&999));
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut bsp = Bsp::with_limits(3, 1);
        for i in 0..200usize {
            bsp.insert(i, unit_box(i as f64, 0.0));
        }
        assert!(bsp.depth() <= 3);
        assert_eq!(bsp.len(), 200);
    }
}
