//! # Entity Catalog
//!
//! The in-memory set of entities a session works over. Built once from
//! source inputs plus an abbreviation table, then frozen: exploration only
//! reads it.
//!
//! Record position is the item id handed to nearest-neighbor indexes, so a
//! catalog and an index built from it must never be mixed with another
//! catalog.

mod file;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::assign::{self, AssignPolicy, Assignment};
use crate::model::codec::{self, ZeroComponent};
use crate::model::{by_priority, EntityRecord};
use crate::source::SourceInputs;
use crate::{Error, Result};

pub use file::CatalogEntry;

// ============================================================================
// Session filter
// ============================================================================

/// Subset of the catalog used for an exploration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    /// Names starting with any of these are dropped.
    pub excluded_prefixes: Vec<String>,
    /// Keep only ranks strictly below this.
    pub max_rank: Option<u32>,
    /// Drop unranked entities.
    pub ranked_only: bool,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec![assign::FLAG_PREFIX.to_string()],
            max_rank: Some(258),
            ranked_only: true,
        }
    }
}

impl CatalogFilter {
    /// Keeps everything.
    pub fn all() -> Self {
        Self { excluded_prefixes: Vec::new(), max_rank: None, ranked_only: false }
    }

    pub fn accepts(&self, rec: &EntityRecord) -> bool {
        if self.excluded_prefixes.iter().any(|p| rec.name().starts_with(p.as_str())) {
            return false;
        }
        match (rec.rank().position(), self.max_rank) {
            (None, _) => !self.ranked_only && self.max_rank.is_none(),
            (Some(r), Some(max)) => r < max,
            (Some(_), None) => true,
        }
    }
}

// ============================================================================
// Build report
// ============================================================================

/// A freshly built catalog with its data-quality findings.
#[derive(Debug, Clone)]
pub struct CatalogBuild {
    pub catalog: EntityCatalog,
    pub assignment: Assignment,
    pub zero_components: Vec<ZeroComponent>,
    /// Smallest and largest component seen, if any.
    pub value_range: Option<(f32, f32)>,
}

// ============================================================================
// EntityCatalog
// ============================================================================

/// Ordered entity records with O(1) lookup by abbreviation and glyph.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    records: Vec<EntityRecord>,
    by_abbr: HashMap<String, usize>,
    by_glyph: HashMap<String, usize>,
    dimension: usize,
}

impl EntityCatalog {
    /// Index `records`, checking uniqueness and a shared dimension.
    pub fn from_records(records: Vec<EntityRecord>) -> Result<Self> {
        let dimension = records.first().map_or(0, EntityRecord::dimension);
        let mut by_abbr = HashMap::with_capacity(records.len());
        let mut by_glyph = HashMap::with_capacity(records.len());
        let mut names = hashbrown::HashSet::with_capacity(records.len());

        for (i, rec) in records.iter().enumerate() {
            if rec.dimension() != dimension {
                return Err(Error::DimensionMismatch { expected: dimension, got: rec.dimension() });
            }
            if by_abbr.insert(rec.abbr().to_string(), i).is_some() {
                return Err(Error::ConstraintViolation(format!("duplicate abbreviation '{}'", rec.abbr())));
            }
            if by_glyph.insert(rec.glyph().to_string(), i).is_some() {
                return Err(Error::ConstraintViolation(format!("duplicate glyph '{}'", rec.glyph())));
            }
            if !names.insert(rec.name()) {
                return Err(Error::ConstraintViolation(format!("duplicate name '{}'", rec.name())));
            }
        }
        drop(names);

        Ok(Self { records, by_abbr, by_glyph, dimension })
    }

    /// Assign abbreviations and join them with glyphs, ranks and vectors.
    ///
    /// Records come out ordered by name. Every component is checked against
    /// the codec bound; a violation aborts the build.
    pub fn build(inputs: &SourceInputs, policy: &AssignPolicy) -> Result<CatalogBuild> {
        let assignment = assign::assign(inputs, policy)?;

        let mut records = Vec::with_capacity(assignment.table.len());
        let mut zero_components = Vec::new();
        let mut value_range: Option<(f32, f32)> = None;

        for (name, abbr) in assignment.table.iter() {
            let Some(glyph) = inputs.glyph_of(name) else {
                tracing::debug!(name, abbr, "abbreviation has no glyph, dropped");
                continue;
            };
            let Some(vector) = inputs.embedding(glyph) else {
                tracing::debug!(name, abbr, "no embedding, dropped");
                continue;
            };

            zero_components.extend(codec::validate_vector(name, vector)?);
            for &v in vector {
                value_range = Some(match value_range {
                    None => (v, v),
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                });
            }

            records.push(EntityRecord::new(glyph, name, abbr, inputs.rank_of(glyph), vector.to_vec()));
        }

        let catalog = Self::from_records(records)?;
        tracing::info!(
            entities = catalog.len(),
            dimension = catalog.dimension(),
            zeros = zero_components.len(),
            min = value_range.map(|r| r.0),
            max = value_range.map(|r| r.1),
            "catalog built"
        );

        Ok(CatalogBuild { catalog, assignment, zero_components, value_range })
    }

    /// Records accepted by `filter`, in the same relative order.
    pub fn filter(&self, filter: &CatalogFilter) -> Result<Self> {
        let kept: Vec<EntityRecord> = self.records.iter().filter(|r| filter.accepts(r)).cloned().collect();
        tracing::debug!(kept = kept.len(), total = self.len(), "catalog filtered");
        Self::from_records(kept)
    }

    pub fn get(&self, abbr: &str) -> Option<&EntityRecord> {
        self.position(abbr).map(|i| &self.records[i])
    }

    pub fn by_glyph(&self, glyph: &str) -> Option<&EntityRecord> {
        self.by_glyph.get(glyph).map(|&i| &self.records[i])
    }

    pub fn position(&self, abbr: &str) -> Option<usize> {
        self.by_abbr.get(abbr).copied()
    }

    pub fn record(&self, id: usize) -> Option<&EntityRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn vectors(&self) -> impl Iterator<Item = &[f32]> {
        self.records.iter().map(EntityRecord::vector)
    }

    /// Positions sorted by rank (unranked last), ties by abbreviation.
    pub fn by_priority(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.records.len()).collect();
        ids.sort_by(|&a, &b| by_priority(&self.records[a], &self.records[b]));
        ids
    }

    /// Grid of `glyph abbr` cells, `columns` per line.
    pub fn legend(&self, columns: usize) -> String {
        let columns = columns.max(1);
        let mut out = String::new();
        for row in self.records.chunks(columns) {
            for rec in row {
                out.push_str(&format!("{} {:<6}", rec.glyph(), rec.abbr()));
            }
            out.push('\n');
        }
        out
    }
}
