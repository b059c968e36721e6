//! # Abbreviation assignment
//!
//! Greedy, rank-ordered assignment of short unique keys:
//!
//! ```text
//! names sorted by rank (unranked last)
//!   → eligibility filter (skip set, unsupported, no vector, category, pinned)
//!   → candidates(name)          ordered, first-fit
//!   → first candidate not held by another name is claimed
//!   → no free candidate: the whole run fails
//! ```
//!
//! Popular entities claim the short obvious keys first. A failure means the
//! tables in `AssignPolicy` need another manual override.

mod candidates;

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::source::SourceInputs;
use crate::{Error, Result};

pub use candidates::{candidates, CLOCK_PREFIX, FLAG_PREFIX};

// ============================================================================
// Policy
// ============================================================================

/// Manual tables and filters that steer assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignPolicy {
    /// abbreviation → name, claimed before anything else.
    pub pinned: BTreeMap<String, String>,
    /// name → the only abbreviation that name may take.
    pub alternates: BTreeMap<String, String>,
    /// Names excluded entirely.
    pub skip: BTreeSet<String>,
    /// Name prefixes of glyphs too new for the render targets.
    pub unsupported_prefixes: Vec<String>,
    /// Name prefixes of categories left out of the catalog.
    pub excluded_categories: Vec<String>,
}

impl AssignPolicy {
    /// The production tables for the emoji catalog.
    pub fn emoji() -> Self {
        let pairs = |xs: &[(&str, &str)]| -> BTreeMap<String, String> {
            xs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
        };
        Self {
            pinned: pairs(&[
                ("cat", "cat"),
                ("ft", "feet"),
                ("rat", "rat"),
                ("ship", "ship"),
                ("fax", "fax"),
                ("fist", "fist"),
            ]),
            alternates: pairs(&[
                ("house", "hom"),
                ("free", "zd"),
                ("fireworks", "fw"),
                ("corn", "mz"),
                ("chestnut", "cnt"),
                ("scroll", "sll"),
                ("flashlight", "fl"),
                ("fallen_leaf", "fall"),
                ("football", "ftbl"),
                ("four_leaf_clover", "flc"),
                ("large_blue_circle", "lbc"),
                ("large_blue_diamond", "lbd"),
                ("m", "lm"),
                ("b", "lb"),
                ("a", "lta"),
                ("sa", "jsa"),
                ("sparkler", "srk"),
                ("poodle", "pdl"),
                ("100", "hu"),
            ]),
            skip: ["sa".to_string()].into_iter().collect(),
            unsupported_prefixes: vec!["u5".into(), "u6".into(), "u7".into()],
            excluded_categories: vec!["family_".into()],
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for name in self.pinned.values() {
            if !seen.insert(name) {
                return Err(Error::InvalidConfig(format!("name '{name}' is pinned to two abbreviations")));
            }
            if self.skip.contains(name) {
                return Err(Error::InvalidConfig(format!("name '{name}' is both pinned and skipped")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Result table
// ============================================================================

/// Bijective abbreviation ↔ name table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbbreviationTable {
    by_abbr: HashMap<String, String>,
    by_name: BTreeMap<String, String>,
}

impl AbbreviationTable {
    pub fn name_of(&self, abbr: &str) -> Option<&str> {
        self.by_abbr.get(abbr).map(String::as_str)
    }

    pub fn abbr_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// `(name, abbr)` pairs ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_name.iter().map(|(n, a)| (n.as_str(), a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_abbr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_abbr.is_empty()
    }

    /// Bind `abbr` to `name`. A slot already held by `name` is reusable.
    fn try_claim(&mut self, abbr: &str, name: &str) -> bool {
        match self.by_abbr.get(abbr) {
            Some(holder) if holder != name => false,
            Some(_) => true,
            None => {
                self.by_abbr.insert(abbr.to_string(), name.to_string());
                self.by_name.insert(name.to_string(), abbr.to_string());
                true
            }
        }
    }
}

/// Why an entity did not go through candidate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    SkipSet,
    Unsupported,
    MissingEmbedding,
    ExcludedCategory,
    Pinned,
}

/// Outcome of one assignment run.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    pub table: AbbreviationTable,
    pub skipped: Vec<(String, SkipReason)>,
}

impl Assignment {
    pub fn skip_reason(&self, name: &str) -> Option<SkipReason> {
        self.skipped.iter().find(|(n, _)| n == name).map(|(_, r)| *r)
    }
}

// ============================================================================
// Assignment
// ============================================================================

fn skip_reason(policy: &AssignPolicy, inputs: &SourceInputs, glyph: &str, name: &str, table: &AbbreviationTable) -> Option<SkipReason> {
    if policy.skip.contains(name) {
        Some(SkipReason::SkipSet)
    } else if policy.unsupported_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
        Some(SkipReason::Unsupported)
    } else if inputs.embedding(glyph).is_none() {
        Some(SkipReason::MissingEmbedding)
    } else if policy.excluded_categories.iter().any(|p| name.starts_with(p.as_str())) {
        Some(SkipReason::ExcludedCategory)
    } else if table.abbr_of(name).is_some() {
        Some(SkipReason::Pinned)
    } else {
        None
    }
}

/// Assign an abbreviation to every eligible name in `inputs`.
pub fn assign(inputs: &SourceInputs, policy: &AssignPolicy) -> Result<Assignment> {
    policy.validate()?;

    let mut table = AbbreviationTable::default();
    for (abbr, name) in &policy.pinned {
        table.try_claim(abbr, name);
    }

    // Stable sort: equal ranks keep input order.
    let mut order: Vec<(&str, &str)> = inputs
        .names()
        .iter()
        .filter_map(|e| e.canonical().map(|n| (e.glyph.as_str(), n)))
        .collect();
    order.sort_by_key(|(glyph, _)| inputs.rank_of(glyph));

    let mut skipped = Vec::new();
    for (glyph, name) in order {
        if let Some(reason) = skip_reason(policy, inputs, glyph, name, &table) {
            tracing::debug!(name, ?reason, "skipping entity");
            skipped.push((name.to_string(), reason));
            continue;
        }

        let cands = candidates(name, policy);
        match cands.iter().find(|a| table.try_claim(a, name)) {
            Some(abbr) => tracing::debug!(name, abbr = abbr.as_str(), "assigned"),
            None => {
                let holders = cands
                    .iter()
                    .map(|a| (a.clone(), table.name_of(a).unwrap_or_default().to_string()))
                    .collect();
                return Err(Error::AssignmentExhausted {
                    name: name.to_string(),
                    candidates: cands,
                    holders,
                    claimed: table.len(),
                });
            }
        }
    }

    tracing::info!(assigned = table.len(), skipped = skipped.len(), "abbreviations assigned");
    Ok(Assignment { table, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NameEntry, RankingRecord};

    fn inputs(names: &[(&str, &str)], ranked: &[&str]) -> SourceInputs {
        let entries = names.iter().map(|(g, n)| NameEntry::new(*g, *n)).collect();
        let ranks = ranked.iter().enumerate().map(|(i, g)| (g.to_string(), i as u32)).collect();
        let vecs: Vec<(String, Vec<f32>)> = names.iter().map(|(g, _)| (g.to_string(), vec![1.0])).collect();
        SourceInputs::from_parts(entries, ranks, vecs).unwrap()
    }

    #[test]
    fn rank_order_decides_who_gets_the_short_key() {
        let src = inputs(&[("A", "cat"), ("B", "car")], &["A", "B"]);
        let first = assign(&src, &AssignPolicy::default()).unwrap();
        assert_eq!(first.table.abbr_of("cat"), Some("c"));
        assert_eq!(first.table.abbr_of("car"), Some("ca"));

        let src = inputs(&[("A", "cat"), ("B", "car")], &["B", "A"]);
        let second = assign(&src, &AssignPolicy::default()).unwrap();
        assert_eq!(second.table.abbr_of("car"), Some("c"));
        assert_eq!(second.table.abbr_of("cat"), Some("ca"));
    }

    #[test]
    fn unranked_names_come_after_ranked_ones() {
        // "cow" is listed first but unranked, so ranked "cat" wins "c"
        let src = inputs(&[("W", "cow"), ("A", "cat")], &["A"]);
        let out = assign(&src, &AssignPolicy::default()).unwrap();
        assert_eq!(out.table.abbr_of("cat"), Some("c"));
        assert_eq!(out.table.abbr_of("cow"), Some("co"));
    }

    #[test]
    fn pinned_names_keep_their_pin() {
        let mut policy = AssignPolicy::default();
        policy.pinned.insert("ft".into(), "feet".into());
        let src = inputs(&[("F", "feet")], &["F"]);
        let out = assign(&src, &policy).unwrap();
        assert_eq!(out.table.abbr_of("feet"), Some("ft"));
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.skip_reason("feet"), Some(SkipReason::Pinned));
    }

    #[test]
    fn alternate_is_the_only_candidate() {
        let mut policy = AssignPolicy::default();
        policy.alternates.insert("house".into(), "hom".into());
        policy.pinned.insert("hom".into(), "homer".into());
        let src = inputs(&[("H", "house")], &["H"]);
        let err = assign(&src, &policy).unwrap_err();
        match err {
            Error::AssignmentExhausted { name, candidates, holders, claimed } => {
                assert_eq!(name, "house");
                assert_eq!(candidates, vec!["hom".to_string()]);
                assert_eq!(holders, vec![("hom".to_string(), "homer".to_string())]);
                assert_eq!(claimed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn filters_apply_before_candidates() {
        let policy = AssignPolicy {
            skip: ["sa".to_string()].into_iter().collect(),
            unsupported_prefixes: vec!["u5".into()],
            excluded_categories: vec!["family_".into()],
            ..Default::default()
        };
        let src = inputs(&[("S", "sa"), ("U", "u5272"), ("F", "family_mwg"), ("D", "dog")], &[]);
        let out = assign(&src, &policy).unwrap();
        assert_eq!(out.skip_reason("sa"), Some(SkipReason::SkipSet));
        assert_eq!(out.skip_reason("u5272"), Some(SkipReason::Unsupported));
        assert_eq!(out.skip_reason("family_mwg"), Some(SkipReason::ExcludedCategory));
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.abbr_of("dog"), Some("d"));
    }

    #[test]
    fn missing_embedding_is_skipped_silently() {
        let entries = vec![NameEntry::new("A", "ant"), NameEntry::new("B", "bee")];
        let src = SourceInputs::new(entries, &[] as &[RankingRecord], vec![("B".to_string(), vec![0.5])]).unwrap();
        let out = assign(&src, &AssignPolicy::default()).unwrap();
        assert_eq!(out.skip_reason("ant"), Some(SkipReason::MissingEmbedding));
        assert_eq!(out.table.abbr_of("bee"), Some("b"));
    }

    #[test]
    fn double_pin_is_rejected() {
        let mut policy = AssignPolicy::default();
        policy.pinned.insert("a".into(), "x".into());
        policy.pinned.insert("b".into(), "x".into());
        assert!(matches!(assign(&SourceInputs::default(), &policy), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn pinned_name_cannot_also_be_skipped() {
        let mut policy = AssignPolicy::default();
        policy.pinned.insert("ft".into(), "feet".into());
        policy.skip.insert("feet".into());
        let src = inputs(&[("F", "feet")], &["F"]);
        match assign(&src, &policy) {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("feet"), "{msg}"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
        assert!(assign(&src, &AssignPolicy::emoji()).is_ok());
    }

    #[test]
    fn emoji_policy_tables() {
        let p = AssignPolicy::emoji();
        assert_eq!(p.pinned.len(), 6);
        assert_eq!(p.alternates.len(), 19);
        assert_eq!(p.alternates.get("100").map(String::as_str), Some("hu"));
        assert!(p.skip.contains("sa"));
    }
}
