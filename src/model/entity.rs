//! Entity record and popularity rank.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Popularity rank of an entity. Lower is more popular.
///
/// Ordering puts every ranked entity before every unranked one, so a plain
/// ascending sort visits popular entities first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rank {
    Ranked(u32),
    Unranked,
}

impl Rank {
    /// Sentinel used for unranked entities when a numeric key is needed.
    pub const UNRANKED_KEY: u32 = u32::MAX;

    pub fn is_ranked(&self) -> bool {
        matches!(self, Rank::Ranked(_))
    }

    pub fn position(&self) -> Option<u32> {
        match self {
            Rank::Ranked(r) => Some(*r),
            Rank::Unranked => None,
        }
    }

    pub fn sort_key(&self) -> u32 {
        self.position().unwrap_or(Self::UNRANKED_KEY)
    }
}

/// Negative values mean unranked; ranks beyond `u32` are rejected.
impl TryFrom<i64> for Rank {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self> {
        if raw < 0 {
            return Ok(Rank::Unranked);
        }
        u32::try_from(raw)
            .map(Rank::Ranked)
            .map_err(|_| Error::Decode(format!("rank {raw} out of range")))
    }
}

impl From<Rank> for i64 {
    fn from(rank: Rank) -> Self {
        match rank {
            Rank::Ranked(r) => i64::from(r),
            Rank::Unranked => -1,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// One catalog entry: a glyph with its name, abbreviation, rank and vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    glyph: String,
    name: String,
    abbr: String,
    rank: Rank,
    vector: Vec<f32>,
}

impl EntityRecord {
    pub fn new(
        glyph: impl Into<String>,
        name: impl Into<String>,
        abbr: impl Into<String>,
        rank: Rank,
        vector: Vec<f32>,
    ) -> Self {
        Self {
            glyph: glyph.into(),
            name: name.into(),
            abbr: abbr.into(),
            rank,
            vector,
        }
    }

    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbr(&self) -> &str {
        &self.abbr
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Rank ascending, unranked last, ties broken by abbreviation.
pub fn by_priority(a: &EntityRecord, b: &EntityRecord) -> Ordering {
    a.rank.cmp(&b.rank).then_with(|| a.abbr.cmp(&b.abbr))
}
