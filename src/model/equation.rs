//! # Equations over abbreviations
//!
//! An equation is built from a multiset of abbreviations. Each distinct
//! abbreviation gets a signed coefficient from its multiplicity `k`:
//!
//! ```text
//! c(k) = -(-1)^k * (1 + (k - 1) / 2)
//!
//! k   1   2   3   4   5   6   7
//! c  +1  -1  +2  -2  +3  -3  +4
//! ```
//!
//! So `a b` means "a plus b", `a a b` means "b minus a", and `a a a` means
//! "twice a".

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::EntityCatalog;
use crate::{Error, Result};

/// Signed coefficient for an abbreviation appearing `multiplicity` times.
pub fn coefficient(multiplicity: usize) -> i32 {
    debug_assert!(multiplicity >= 1);
    let magnitude = 1 + (multiplicity as i32 - 1) / 2;
    if multiplicity % 2 == 1 { magnitude } else { -magnitude }
}

/// One canonical term: `coefficient × entity(abbr)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub coefficient: i32,
    pub multiplicity: usize,
    pub abbr: String,
}

/// Canonical signed-coefficient combination of catalog entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equation {
    terms: SmallVec<[Term; 4]>,
}

impl Equation {
    pub fn new<I, S>(abbrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for a in abbrs {
            *counts.entry(a.as_ref().to_string()).or_default() += 1;
        }
        let mut terms: SmallVec<[Term; 4]> = counts
            .into_iter()
            .map(|(abbr, multiplicity)| Term {
                coefficient: coefficient(multiplicity),
                multiplicity,
                abbr,
            })
            .collect();
        terms.sort_by(canonical_order);
        Self { terms }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Distinct abbreviations in canonical order.
    pub fn abbrs(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.abbr.as_str())
    }

    /// Deduplication key: the input multiset, sorted and space-joined.
    pub fn key(&self) -> String {
        let mut sorted: Vec<&Term> = self.terms.iter().collect();
        sorted.sort_by(|a, b| a.abbr.cmp(&b.abbr));
        let mut parts = Vec::new();
        for t in sorted {
            parts.extend(std::iter::repeat_n(t.abbr.as_str(), t.multiplicity));
        }
        parts.join(" ")
    }

    /// Linear combination of the term vectors.
    pub fn value(&self, catalog: &EntityCatalog) -> Result<Vec<f32>> {
        let mut acc = vec![0.0f32; catalog.dimension()];
        for t in &self.terms {
            let rec = catalog
                .get(&t.abbr)
                .ok_or_else(|| Error::UnknownAbbreviation(t.abbr.clone()))?;
            let c = t.coefficient as f32;
            for (a, v) in acc.iter_mut().zip(rec.vector()) {
                *a += c * v;
            }
        }
        Ok(acc)
    }

    /// Human-facing form with each term shown as its glyph.
    pub fn render(&self, catalog: &EntityCatalog) -> Result<String> {
        let mut glyphs = Vec::with_capacity(self.terms.len());
        for t in &self.terms {
            let rec = catalog
                .get(&t.abbr)
                .ok_or_else(|| Error::UnknownAbbreviation(t.abbr.clone()))?;
            glyphs.push(rec.glyph());
        }
        let mut out = String::new();
        self.write_terms(&mut out, |i| glyphs[i])?;
        Ok(out)
    }

    fn write_terms<'a, W, F>(&self, out: &mut W, mut label: F) -> fmt::Result
    where
        W: fmt::Write,
        F: FnMut(usize) -> &'a str,
    {
        for (i, t) in self.terms.iter().enumerate() {
            if t.coefficient > 0 {
                if i > 0 {
                    out.write_str(" + ")?;
                }
            } else {
                out.write_str(if i > 0 { " - " } else { "-" })?;
            }
            if t.coefficient.abs() != 1 {
                write!(out, "{}", t.coefficient.abs())?;
            }
            out.write_str(label(i))?;
        }
        Ok(())
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_terms(f, |i| self.terms[i].abbr.as_str())
    }
}

/// Coefficient descending, then abbreviation descending.
pub fn canonical_order(a: &Term, b: &Term) -> std::cmp::Ordering {
    (b.coefficient, &b.abbr).cmp(&(a.coefficient, &a.abbr))
}
