//! # Equation exploration
//!
//! Worklist search for equations whose nearest entity is new:
//!
//! ```text
//! have = work = top seed_size entities by priority
//! while work not empty:
//!     a = work.pop_front()
//!     for inputs in [a], [a, a], [a, x] for x in have (x != a):
//!         key = sorted inputs            skip if tried
//!         r = nearest(equation(inputs), excluding inputs)
//!         r new → have.push(r), work.push_back(r), edge r ← inputs
//!         tried.insert(key)
//! ```
//!
//! `have` only grows and each entity is queued once, so the loop reaches a
//! fixed point after at most `catalog.len()` steps. Entities still outside
//! `have` at that point are reported as missed.

mod edges;

use std::collections::VecDeque;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::index::{nearest_excluding, NearestNeighbors};
use crate::model::Equation;
use crate::session::Session;
use crate::{Error, Result};

pub use edges::{edge_file_name, edges_to_json, read_edges, write_edges, write_edges_now, Edge};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Highest-priority entities reachable from the start.
    pub seed_size: usize,
    /// Log an edge for every evaluated equation, not only discoveries.
    pub record_all_edges: bool,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self { seed_size: 10, record_all_edges: false }
    }
}

// ============================================================================
// Frontier
// ============================================================================

/// Search state owned by one exploration run.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    have: Vec<usize>,
    reached: HashSet<usize>,
    work: VecDeque<usize>,
    tried: HashSet<String>,
    edges: Vec<Edge>,
    evaluations: usize,
    steps: usize,
}

impl Frontier {
    fn seeded(seeds: &[usize]) -> Self {
        Self {
            have: seeds.to_vec(),
            reached: seeds.iter().copied().collect(),
            work: seeds.iter().copied().collect(),
            ..Default::default()
        }
    }

    /// Reached entities in discovery order.
    pub fn have(&self) -> &[usize] {
        &self.have
    }

    pub fn contains(&self, id: usize) -> bool {
        self.reached.contains(&id)
    }

    pub fn queued(&self) -> usize {
        self.work.len()
    }

    pub fn is_tried(&self, key: &str) -> bool {
        self.tried.contains(key)
    }

    pub fn tried_len(&self) -> usize {
        self.tried.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Equations evaluated against the index.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Entities popped from the work queue.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// What one attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Key already evaluated.
    Skipped,
    /// Nearest entity was already reached.
    Known(usize),
    /// Nearest entity joined the frontier.
    Discovered(usize),
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationReport {
    pub total: usize,
    /// Abbreviations reached, in discovery order.
    pub reached: Vec<String>,
    /// Abbreviations never reached, in catalog priority order.
    pub missed: Vec<String>,
    pub edges: Vec<Edge>,
    pub evaluations: usize,
    pub steps: usize,
}

// ============================================================================
// Explorer
// ============================================================================

/// Drives one exploration run over a session.
pub struct Explorer<'s, I: NearestNeighbors> {
    session: &'s Session<I>,
    config: ExploreConfig,
    frontier: Frontier,
}

impl<'s, I: NearestNeighbors> Explorer<'s, I> {
    pub fn new(session: &'s Session<I>, config: ExploreConfig) -> Result<Self> {
        if config.seed_size == 0 {
            return Err(Error::InvalidConfig("seed_size must be at least 1".into()));
        }
        let catalog = session.catalog();
        let seeds: Vec<usize> = catalog.by_priority().into_iter().take(config.seed_size).collect();

        tracing::info!(
            entities = catalog.len(),
            seeds = %seeds.iter().filter_map(|&i| catalog.record(i)).map(|r| r.abbr()).collect::<Vec<_>>().join(" "),
            "exploration started"
        );

        Ok(Self { session, config, frontier: Frontier::seeded(&seeds) })
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn into_frontier(self) -> Frontier {
        self.frontier
    }

    pub fn is_done(&self) -> bool {
        self.frontier.work.is_empty()
    }

    /// Expand the next queued entity. `None` once the queue is empty.
    pub fn step(&mut self) -> Result<Option<usize>> {
        let Some(a) = self.frontier.work.pop_front() else {
            return Ok(None);
        };
        self.frontier.steps += 1;

        self.attempt(&[a])?;
        self.attempt(&[a, a])?;
        // `have` may grow while pairing; later arrivals are paired too
        let mut i = 0;
        while i < self.frontier.have.len() {
            let x = self.frontier.have[i];
            if x != a {
                self.attempt(&[a, x])?;
            }
            i += 1;
        }
        Ok(Some(a))
    }

    /// Evaluate one combination of catalog positions.
    pub fn attempt(&mut self, inputs: &[usize]) -> Result<Attempt> {
        let session = self.session;
        let catalog = session.catalog();

        let mut abbrs = Vec::with_capacity(inputs.len());
        for &id in inputs {
            let rec = catalog
                .record(id)
                .ok_or_else(|| Error::NotFound(format!("catalog position {id}")))?;
            abbrs.push(rec.abbr());
        }
        abbrs.sort_unstable();

        let equation = Equation::new(&abbrs);
        let key = equation.key();
        if self.frontier.tried.contains(&key) {
            return Ok(Attempt::Skipped);
        }

        let value = equation.value(catalog)?;
        let exclude: HashSet<&str> = abbrs.iter().copied().collect();
        let hit = nearest_excluding(catalog, session.index(), &value, &exclude)?;
        let found = hit.item;
        let result = catalog
            .record(found)
            .ok_or_else(|| Error::NotFound(format!("catalog position {found}")))?;

        let discovered = self.frontier.reached.insert(found);
        if discovered {
            self.frontier.have.push(found);
            self.frontier.work.push_back(found);
            tracing::info!(
                reached = self.frontier.have.len(),
                total = catalog.len(),
                queued = self.frontier.work.len(),
                equation = %equation,
                result = result.abbr(),
                glyph = result.glyph(),
                "discovered"
            );
        } else {
            tracing::debug!(equation = %equation, result = result.abbr(), "known result");
        }

        if discovered || self.config.record_all_edges {
            self.frontier.edges.push(Edge::new(result.abbr(), abbrs.iter().copied()));
        }
        self.frontier.tried.insert(key);
        self.frontier.evaluations += 1;

        Ok(if discovered { Attempt::Discovered(found) } else { Attempt::Known(found) })
    }

    /// Run to the fixed point.
    ///
    /// On error the frontier is left as it was at the failing attempt.
    pub fn run(&mut self) -> Result<ExplorationReport> {
        while self.step()?.is_some() {}
        let report = self.report();
        tracing::info!(
            reached = report.reached.len(),
            total = report.total,
            missed = report.missed.len(),
            edges = report.edges.len(),
            evaluations = report.evaluations,
            "exploration finished"
        );
        Ok(report)
    }

    pub fn report(&self) -> ExplorationReport {
        let catalog = self.session.catalog();
        let abbr = |i: usize| catalog.record(i).map(|r| r.abbr().to_string());
        ExplorationReport {
            total: catalog.len(),
            reached: self.frontier.have.iter().filter_map(|&i| abbr(i)).collect(),
            missed: catalog
                .by_priority()
                .into_iter()
                .filter(|i| !self.frontier.contains(*i))
                .filter_map(abbr)
                .collect(),
            edges: self.frontier.edges.clone(),
            evaluations: self.frontier.evaluations,
            steps: self.frontier.steps,
        }
    }
}
