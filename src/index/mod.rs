//! # Nearest-neighbor search
//!
//! `NearestNeighbors` is the contract between the explorer and any index.
//! Items are catalog positions; distance is Manhattan (L1).
//!
//! | Index              | Module   | Description |
//! |--------------------|----------|-------------|
//! | `LinearScan`       | here     | Exact brute force, reference for tests |
//! | `ProjectionForest` | `forest` | Approximate random-projection forest |

mod forest;

use hashbrown::HashSet;

use crate::catalog::EntityCatalog;
use crate::{Error, Result};

pub use forest::{ForestConfig, ProjectionForest};

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub item: usize,
    pub distance: f32,
}

/// L1 distance.
#[inline]
pub fn manhattan(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Ascending distance, ties by item id.
pub(crate) fn sort_neighbors(hits: &mut [Neighbor]) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.item.cmp(&b.item)));
}

/// Approximate or exact k-nearest-neighbor search over fixed vectors.
pub trait NearestNeighbors {
    /// Number of indexed items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> usize;

    /// Up to `k` items closest to `query`, nearest first.
    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor>;
}

// ============================================================================
// LinearScan
// ============================================================================

/// Exact search by scanning every vector.
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl LinearScan {
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = check_dimensions(&vectors)?;
        Ok(Self { vectors, dimension })
    }

    pub fn from_catalog(catalog: &EntityCatalog) -> Self {
        Self {
            vectors: catalog.vectors().map(<[f32]>::to_vec).collect(),
            dimension: catalog.dimension(),
        }
    }
}

impl NearestNeighbors for LinearScan {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let mut hits: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(item, v)| Neighbor { item, distance: manhattan(query, v) })
            .collect();
        sort_neighbors(&mut hits);
        hits.truncate(k);
        hits
    }
}

pub(crate) fn check_dimensions(vectors: &[Vec<f32>]) -> Result<usize> {
    let dimension = vectors.first().map_or(0, Vec::len);
    match vectors.iter().find(|v| v.len() != dimension) {
        Some(v) => Err(Error::DimensionMismatch { expected: dimension, got: v.len() }),
        None => Ok(dimension),
    }
}

// ============================================================================
// Exclusion search
// ============================================================================

/// Nearest catalog entry to `query` whose abbreviation is not in `exclude`.
///
/// Asks the index for `exclude.len() + 1` neighbors, which is always enough
/// for an exact index over a catalog larger than the exclusion set.
pub fn nearest_excluding<I>(
    catalog: &EntityCatalog,
    index: &I,
    query: &[f32],
    exclude: &HashSet<&str>,
) -> Result<Neighbor>
where
    I: NearestNeighbors + ?Sized,
{
    let requested = exclude.len() + 1;
    let hits = index.search(query, requested);
    for hit in &hits {
        let Some(rec) = catalog.record(hit.item) else {
            continue;
        };
        if !exclude.contains(rec.abbr()) {
            return Ok(*hit);
        }
    }
    Err(Error::NeighborExhausted { requested, excluded: exclude.len(), returned: hits.len() })
}
