//! Random-projection forest for approximate L1 nearest-neighbor search.
//!
//! Each tree recursively splits its items by the perpendicular bisector of
//! two sampled points until a node holds at most `leaf_size` items.
//!
//! **Build**: `n_trees` independent trees from one seeded RNG. More trees
//! cost memory and build time and buy recall.
//!
//! **Search**: walk all trees at once with a max-heap keyed on the smallest
//! split margin seen along each path, collect leaf items until `search_k`
//! leaf hits are gathered (an item found by several trees counts each
//! time), then dedupe and rerank the candidates exactly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{NearestNeighbors, Neighbor, check_dimensions, manhattan, sort_neighbors};
use crate::catalog::EntityCatalog;
use crate::{Error, Result};

/// Attempts at sampling two distinct points for a split.
const SPLIT_ATTEMPTS: usize = 3;

/// Build and search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees. The quality/size tradeoff.
    pub n_trees: usize,
    /// Largest node kept as a leaf.
    pub leaf_size: usize,
    /// Leaf hits gathered per query, duplicates included; `k * n_trees` when unset.
    pub search_k: Option<usize>,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self { n_trees: 1000, leaf_size: 16, search_k: None, seed: 0x5EED }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(Error::InvalidConfig("n_trees must be at least 1".into()));
        }
        if self.leaf_size == 0 {
            return Err(Error::InvalidConfig("leaf_size must be at least 1".into()));
        }
        if self.search_k == Some(0) {
            return Err(Error::InvalidConfig("search_k must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf(Vec<usize>),
    Split {
        normal: Vec<f32>,
        offset: f32,
        /// margin <= 0
        left: usize,
        /// margin > 0
        right: usize,
    },
}

/// Node waiting to be visited (max-heap on priority).
#[derive(Clone, Copy)]
struct Probe {
    priority: f32,
    node: usize,
}

impl PartialEq for Probe {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for Probe {}

impl Ord for Probe {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

impl PartialOrd for Probe {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Approximate L1 index over a fixed set of vectors.
pub struct ProjectionForest {
    vectors: Vec<Vec<f32>>,
    dimension: usize,
    nodes: Vec<TreeNode>,
    roots: Vec<usize>,
    config: ForestConfig,
}

impl ProjectionForest {
    pub fn build(vectors: Vec<Vec<f32>>, config: &ForestConfig) -> Result<Self> {
        config.validate()?;
        let dimension = check_dimensions(&vectors)?;
        let mut forest = Self {
            vectors,
            dimension,
            nodes: Vec::new(),
            roots: Vec::with_capacity(config.n_trees),
            config: config.clone(),
        };
        if forest.vectors.is_empty() {
            return Ok(forest);
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        for _ in 0..config.n_trees {
            let items: Vec<usize> = (0..forest.vectors.len()).collect();
            let root = forest.build_tree(items, &mut rng);
            forest.roots.push(root);
        }
        tracing::debug!(
            items = forest.vectors.len(),
            trees = forest.roots.len(),
            nodes = forest.nodes.len(),
            "projection forest built"
        );
        Ok(forest)
    }

    pub fn from_catalog(catalog: &EntityCatalog, config: &ForestConfig) -> Result<Self> {
        Self::build(catalog.vectors().map(<[f32]>::to_vec).collect(), config)
    }

    pub fn n_trees(&self) -> usize {
        self.roots.len()
    }

    fn build_tree(&mut self, mut items: Vec<usize>, rng: &mut StdRng) -> usize {
        if items.len() <= self.config.leaf_size {
            return self.push(TreeNode::Leaf(items));
        }

        let Some((normal, offset)) = self.split_plane(&items, rng) else {
            // every sampled pair coincided: treat as one bucket
            return self.push(TreeNode::Leaf(items));
        };

        let (mut lo, mut hi): (Vec<usize>, Vec<usize>) = items
            .iter()
            .copied()
            .partition(|&i| dot(&normal, &self.vectors[i]) + offset <= 0.0);
        if lo.is_empty() || hi.is_empty() {
            items.shuffle(rng);
            hi = items.split_off(items.len() / 2);
            lo = items;
        }

        let left = self.build_tree(lo, rng);
        let right = self.build_tree(hi, rng);
        self.push(TreeNode::Split { normal, offset, left, right })
    }

    fn split_plane(&self, items: &[usize], rng: &mut StdRng) -> Option<(Vec<f32>, f32)> {
        for _ in 0..SPLIT_ATTEMPTS {
            let a = items[rng.gen_range(0..items.len())];
            let b = items[rng.gen_range(0..items.len())];
            let (va, vb) = (&self.vectors[a], &self.vectors[b]);
            let normal: Vec<f32> = va.iter().zip(vb).map(|(x, y)| x - y).collect();
            if normal.iter().all(|&c| c == 0.0) {
                continue;
            }
            let mid: Vec<f32> = va.iter().zip(vb).map(|(x, y)| (x + y) * 0.5).collect();
            let offset = -dot(&normal, &mid);
            return Some((normal, offset));
        }
        None
    }

    /// Distinct items from the first `search_k` leaf hits, with the number
    /// of nodes visited.
    fn gather(&self, query: &[f32], search_k: usize) -> (Vec<usize>, usize) {
        let mut heap: BinaryHeap<Probe> = self
            .roots
            .iter()
            .map(|&node| Probe { priority: f32::INFINITY, node })
            .collect();
        let mut candidates = Vec::new();
        let mut visited = 0;

        while candidates.len() < search_k {
            let Some(Probe { priority, node }) = heap.pop() else {
                break;
            };
            visited += 1;
            match &self.nodes[node] {
                TreeNode::Leaf(items) => candidates.extend_from_slice(items),
                TreeNode::Split { normal, offset, left, right } => {
                    let margin = dot(normal, query) + offset;
                    heap.push(Probe { priority: priority.min(margin), node: *right });
                    heap.push(Probe { priority: priority.min(-margin), node: *left });
                }
            }
        }

        candidates.sort_unstable();
        candidates.dedup();
        (candidates, visited)
    }

    fn push(&mut self, node: TreeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

impl NearestNeighbors for ProjectionForest {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if k == 0 || self.roots.is_empty() {
            return Vec::new();
        }
        let search_k = self.config.search_k.unwrap_or(k * self.roots.len()).max(k);
        let (candidates, _) = self.gather(query, search_k);

        let mut hits: Vec<Neighbor> = candidates
            .into_iter()
            .map(|item| Neighbor { item, distance: manhattan(query, &self.vectors[item]) })
            .collect();
        sort_neighbors(&mut hits);
        hits.truncate(k);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LinearScan;

    fn grid(n: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| vec![(i % 7) as f32 * 0.5, (i / 7) as f32 * 0.25, ((i * 31) % 11) as f32 * 0.1])
            .collect()
    }

    fn config(n_trees: usize) -> ForestConfig {
        ForestConfig { n_trees, leaf_size: 4, search_k: None, seed: 7 }
    }

    #[test]
    fn every_tree_covers_every_item() {
        let forest = ProjectionForest::build(grid(50), &config(3)).unwrap();
        for &root in &forest.roots {
            let mut stack = vec![root];
            let mut seen = Vec::new();
            while let Some(n) = stack.pop() {
                match &forest.nodes[n] {
                    TreeNode::Leaf(items) => seen.extend(items.iter().copied()),
                    TreeNode::Split { left, right, .. } => stack.extend([*left, *right]),
                }
            }
            seen.sort_unstable();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn exhaustive_search_matches_linear_scan() {
        let vectors = grid(60);
        let exact = LinearScan::build(vectors.clone()).unwrap();
        // every leaf hit of every tree
        let cfg = ForestConfig { search_k: Some(60 * 5), ..config(5) };
        let forest = ProjectionForest::build(vectors, &cfg).unwrap();
        for q in [[0.3f32, 0.9, 0.2], [3.0, 0.0, 1.0], [-1.0, 2.0, 0.5]] {
            assert_eq!(forest.search(&q, 5), exact.search(&q, 5));
        }
    }

    #[test]
    fn default_search_recalls_indexed_points() {
        let vectors = grid(200);
        let forest = ProjectionForest::build(vectors.clone(), &config(20)).unwrap();
        let found = vectors
            .iter()
            .enumerate()
            .filter(|(i, v)| forest.search(v, 1).first().map(|h| h.item) == Some(*i))
            .count();
        assert!(found >= 190, "recalled {found} of 200");
    }

    #[test]
    fn default_search_stops_before_walking_every_node() {
        let vectors = grid(200);
        let forest = ProjectionForest::build(vectors.clone(), &config(50)).unwrap();
        let search_k = 50;
        let (candidates, visited) = forest.gather(&vectors[17], search_k);
        assert!(visited < forest.nodes.len() / 2, "visited {visited} of {}", forest.nodes.len());
        assert!(candidates.contains(&17));
        assert!(candidates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn duplicate_hits_count_toward_search_k() {
        // one leaf per tree holding everything: each tree yields all 10 items
        let forest = ProjectionForest::build(grid(10), &ForestConfig { leaf_size: 16, ..config(4) }).unwrap();
        let (candidates, visited) = forest.gather(&[0.0, 0.0, 0.0], 10);
        assert_eq!(visited, 1);
        assert_eq!(candidates.len(), 10);
    }

    #[test]
    fn same_seed_same_answers() {
        let a = ProjectionForest::build(grid(30), &config(4)).unwrap();
        let b = ProjectionForest::build(grid(30), &config(4)).unwrap();
        let q = [1.0, 0.5, 0.3];
        assert_eq!(a.search(&q, 3), b.search(&q, 3));
    }

    #[test]
    fn duplicate_points_end_in_one_leaf() {
        let forest = ProjectionForest::build(vec![vec![1.0, 1.0]; 10], &config(2)).unwrap();
        assert_eq!(forest.search(&[0.0, 0.0], 10).len(), 10);
    }

    #[test]
    fn rejects_bad_config() {
        assert!(ProjectionForest::build(grid(5), &config(0)).is_err());
        let zero_leaf = ForestConfig { leaf_size: 0, ..config(1) };
        assert!(matches!(ProjectionForest::build(grid(5), &zero_leaf), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn empty_forest_returns_nothing() {
        let forest = ProjectionForest::build(Vec::new(), &config(2)).unwrap();
        assert!(forest.search(&[0.0], 3).is_empty());
        assert!(forest.is_empty());
    }
}
