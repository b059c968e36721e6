//! # Session
//!
//! A catalog paired with an index built from it. Everything that needs
//! "the current entities" takes a `&Session` instead of reaching for
//! process-wide state.
//!
//! ```text
//! query("sun sun moon")  →  Equation(moon - sun)  →  nearest_excluding  →  Combination
//! ```

use std::fmt;

use hashbrown::HashSet;

use crate::catalog::EntityCatalog;
use crate::index::{nearest_excluding, ForestConfig, LinearScan, NearestNeighbors, ProjectionForest};
use crate::model::Equation;
use crate::{Error, Result};

/// Catalog plus nearest-neighbor index over its vectors.
pub struct Session<I: NearestNeighbors = ProjectionForest> {
    catalog: EntityCatalog,
    index: I,
}

impl<I: NearestNeighbors> Session<I> {
    /// Pair `catalog` with an `index` built from it.
    pub fn new(catalog: EntityCatalog, index: I) -> Result<Self> {
        if index.len() != catalog.len() {
            return Err(Error::InvalidConfig(format!(
                "index holds {} items, catalog holds {}",
                index.len(),
                catalog.len()
            )));
        }
        if !catalog.is_empty() && index.dimension() != catalog.dimension() {
            return Err(Error::DimensionMismatch { expected: catalog.dimension(), got: index.dimension() });
        }
        Ok(Self { catalog, index })
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Evaluate `abbrs` and find the nearest entity not among them.
    pub fn combine<S: AsRef<str>>(&self, abbrs: &[S]) -> Result<Combination> {
        if abbrs.is_empty() {
            return Err(Error::EmptyEquation);
        }
        for a in abbrs {
            if self.catalog.get(a.as_ref()).is_none() {
                return Err(Error::UnknownAbbreviation(a.as_ref().to_string()));
            }
        }

        let equation = Equation::new(abbrs);
        let value = equation.value(&self.catalog)?;
        let exclude: HashSet<&str> = abbrs.iter().map(AsRef::as_ref).collect();
        let hit = nearest_excluding(&self.catalog, &self.index, &value, &exclude)?;
        let result = self
            .catalog
            .record(hit.item)
            .ok_or_else(|| Error::NotFound(format!("catalog position {}", hit.item)))?;

        tracing::debug!(equation = %equation, result = result.abbr(), distance = hit.distance, "combined");
        Ok(Combination { equation, result: result.abbr().to_string(), distance: hit.distance })
    }

    /// One line of whitespace-separated abbreviations, any case.
    pub fn query(&self, line: &str) -> Result<Combination> {
        let abbrs: Vec<String> = line.split_whitespace().map(str::to_lowercase).collect();
        self.combine(&abbrs)
    }
}

impl Session<ProjectionForest> {
    pub fn with_forest(catalog: EntityCatalog, config: &ForestConfig) -> Result<Self> {
        let index = ProjectionForest::from_catalog(&catalog, config)?;
        Self::new(catalog, index)
    }
}

impl Session<LinearScan> {
    pub fn with_linear_scan(catalog: EntityCatalog) -> Result<Self> {
        let index = LinearScan::from_catalog(&catalog);
        Self::new(catalog, index)
    }
}

/// Answer to a single combination query.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub equation: Equation,
    /// Abbreviation of the nearest entity.
    pub result: String,
    pub distance: f32,
}

impl Combination {
    /// `"{equation} = {abbr}{glyph}"`, equation terms shown as glyphs.
    pub fn render(&self, catalog: &EntityCatalog) -> Result<String> {
        let glyph = catalog
            .get(&self.result)
            .map(|r| r.glyph())
            .ok_or_else(|| Error::UnknownAbbreviation(self.result.clone()))?;
        Ok(format!("{} = {}{}", self.equation.render(catalog)?, self.result, glyph))
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.equation, self.result)
    }
}
