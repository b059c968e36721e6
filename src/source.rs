//! Input contracts for catalog construction.
//!
//! Reading the raw name, ranking and embedding files is done elsewhere;
//! this module only fixes the shapes they are handed over in and how glyphs
//! from the three sources are matched up.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::Rank;
use crate::{Error, Result};

/// Emoji presentation selector. Present in some sources, absent in others.
pub const VARIATION_SELECTOR_16: char = '\u{FE0F}';

/// Strip presentation selectors so glyphs compare equal across sources.
pub fn normalize_glyph(glyph: &str) -> String {
    glyph.chars().filter(|&c| c != VARIATION_SELECTOR_16).collect()
}

/// A glyph and its known names. The first name is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameEntry {
    pub glyph: String,
    pub names: Vec<String>,
}

impl NameEntry {
    pub fn new(glyph: impl Into<String>, name: impl Into<String>) -> Self {
        Self { glyph: glyph.into(), names: vec![name.into()] }
    }

    pub fn canonical(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

/// One row of the popularity ranking.
///
/// `id` is a hexadecimal code point. Multi-code-point sequences carry a
/// dash-separated `id` and are identified by their literal `char` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub id: String,
    #[serde(default)]
    pub char: Option<String>,
}

impl RankingRecord {
    pub fn glyph(&self) -> Result<String> {
        if self.id.contains('-') {
            return self
                .char
                .as_deref()
                .map(normalize_glyph)
                .ok_or_else(|| Error::Decode(format!("ranking id '{}' has no char", self.id)));
        }
        u32::from_str_radix(&self.id, 16)
            .ok()
            .and_then(char::from_u32)
            .map(|c| c.to_string())
            .ok_or_else(|| Error::Decode(format!("ranking id '{}' is not a code point", self.id)))
    }
}

/// Everything catalog construction consumes.
#[derive(Debug, Clone, Default)]
pub struct SourceInputs {
    names: Vec<NameEntry>,
    /// canonical name → position in `names`
    by_name: HashMap<String, usize>,
    /// normalized glyph → first ranking position
    ranks: HashMap<String, u32>,
    /// normalized glyph → embedding
    embeddings: HashMap<String, Vec<f32>>,
    dimension: Option<usize>,
}

impl SourceInputs {
    pub fn new(
        names: Vec<NameEntry>,
        ranking: &[RankingRecord],
        embeddings: impl IntoIterator<Item = (String, Vec<f32>)>,
    ) -> Result<Self> {
        let mut ranks = HashMap::new();
        for (pos, rec) in ranking.iter().enumerate() {
            ranks.entry(rec.glyph()?).or_insert(pos as u32);
        }
        Self::from_parts(names, ranks, embeddings)
    }

    /// Inputs whose ranking is already resolved to glyph positions.
    pub fn from_parts(
        names: Vec<NameEntry>,
        ranks: HashMap<String, u32>,
        embeddings: impl IntoIterator<Item = (String, Vec<f32>)>,
    ) -> Result<Self> {
        let mut dimension = None;
        let mut vecs = HashMap::new();
        for (glyph, v) in embeddings {
            match dimension {
                None => dimension = Some(v.len()),
                Some(d) if d != v.len() => {
                    return Err(Error::DimensionMismatch { expected: d, got: v.len() });
                }
                Some(_) => {}
            }
            vecs.insert(normalize_glyph(&glyph), v);
        }
        let ranks = ranks.into_iter().map(|(g, r)| (normalize_glyph(&g), r)).collect();
        let names: Vec<NameEntry> = names
            .into_iter()
            .map(|e| NameEntry { glyph: normalize_glyph(&e.glyph), names: e.names })
            .collect();
        let mut by_name = HashMap::new();
        for (i, e) in names.iter().enumerate() {
            if let Some(n) = e.canonical() {
                by_name.entry(n.to_string()).or_insert(i);
            }
        }
        Ok(Self { names, by_name, ranks, embeddings: vecs, dimension })
    }

    pub fn names(&self) -> &[NameEntry] {
        &self.names
    }

    pub fn rank_of(&self, glyph: &str) -> Rank {
        self.ranks.get(glyph).map_or(Rank::Unranked, |&r| Rank::Ranked(r))
    }

    pub fn embedding(&self, glyph: &str) -> Option<&[f32]> {
        self.embeddings.get(glyph).map(Vec::as_slice)
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Canonical name → glyph, for names that have one.
    pub fn glyph_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(|&i| self.names[i].glyph.as_str())
    }
}
