//! # emoji-algebra: Mnemonic Emoji Abbreviations and Vector Equations
//!
//! Gives every emoji a short, unique, typeable abbreviation, then searches
//! its embedding space for equations such as `sun + snowman ≈ cloud`.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `NearestNeighbors` is the contract between explorer and index
//! 2. **Plain data**: `EntityRecord`, `Equation`, `Edge` cross all boundaries
//! 3. **Explicit context**: a `Session` owns the catalog and its index; no globals
//! 4. **Fatal authoring errors**: an abbreviation collision aborts the build
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emoji_algebra::{EntityCatalog, ExploreConfig, Explorer, Session, ForestConfig};
//!
//! # fn example() -> emoji_algebra::Result<()> {
//! let catalog = EntityCatalog::load_file("data/emoji.json")?;
//! let session = Session::with_forest(catalog, &ForestConfig::default())?;
//!
//! println!("{}", session.query("sun snowman")?.render(session.catalog())?);
//!
//! let mut explorer = Explorer::new(&session, ExploreConfig::default())?;
//! let report = explorer.run()?;
//! emoji_algebra::explore::write_edges_now(".", report.total, &report.edges)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Assign | `assign` | abbreviation ↔ name bijection |
//! | Build | `catalog` | `EntityCatalog` + zero-component warnings |
//! | Index | `index` | `LinearScan` or `ProjectionForest` |
//! | Explore | `explore` | frontier, edge log |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod source;
pub mod assign;
pub mod catalog;
pub mod index;
pub mod explore;
pub mod session;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{EntityRecord, Equation, Rank, Term, ZeroComponent};

// ============================================================================
// Re-exports: Build
// ============================================================================

pub use source::{NameEntry, RankingRecord, SourceInputs};
pub use assign::{assign, AbbreviationTable, AssignPolicy, Assignment, SkipReason};
pub use catalog::{CatalogBuild, CatalogEntry, CatalogFilter, EntityCatalog};

// ============================================================================
// Re-exports: Search
// ============================================================================

pub use index::{nearest_excluding, ForestConfig, LinearScan, NearestNeighbors, Neighbor, ProjectionForest};
pub use explore::{Edge, ExplorationReport, ExploreConfig, Explorer, Frontier};
pub use session::{Combination, Session};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no free abbreviation for '{name}' (candidates {candidates:?}, held by {holders:?}, {claimed} claimed)")]
    AssignmentExhausted {
        name: String,
        candidates: Vec<String>,
        /// `(candidate, holder)` for every candidate.
        holders: Vec<(String, String)>,
        claimed: usize,
    },

    #[error("component {index} of '{name}': {value} round-trips to {decoded} (relative error {relative_error})")]
    CodecPrecision { name: String, index: usize, value: f32, decoded: f32, relative_error: f32 },

    #[error("index returned {returned} of {requested} neighbors, all within the {excluded} excluded")]
    NeighborExhausted { requested: usize, excluded: usize, returned: usize },

    #[error("Unknown abbreviation: {0}")]
    UnknownAbbreviation(String),

    #[error("Empty equation")]
    EmptyEquation,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
