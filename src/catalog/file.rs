//! Catalog file: a JSON array of entries, one per line.
//!
//! ```text
//! [{"char":"🐈","abbr":"cat","name":"cat","rank":41,"vec":"PYqNvK9a..."},
//! {"char":"🐕","abbr":"d","name":"dog","rank":57,"vec":"vQmBPS7e..."}]
//! ```
//!
//! `vec` is the codec text of the embedding (4 base64 chars per component),
//! `rank` is `-1` for unranked entities.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::EntityCatalog;
use crate::model::codec;
use crate::model::{EntityRecord, Rank};
use crate::Result;

/// Serialized form of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub char: String,
    pub abbr: String,
    pub name: String,
    pub rank: Rank,
    pub vec: String,
}

impl CatalogEntry {
    pub fn from_record(rec: &EntityRecord) -> Self {
        Self {
            char: rec.glyph().to_string(),
            abbr: rec.abbr().to_string(),
            name: rec.name().to_string(),
            rank: rec.rank(),
            vec: codec::encode_vector(rec.vector()),
        }
    }

    pub fn into_record(self) -> Result<EntityRecord> {
        let vector = codec::decode_vector(&self.vec)?;
        Ok(EntityRecord::new(self.char, self.name, self.abbr, self.rank, vector))
    }
}

impl EntityCatalog {
    pub fn save(&self, writer: &mut dyn Write) -> Result<()> {
        writer.write_all(b"[")?;
        for (i, rec) in self.records.iter().enumerate() {
            if i > 0 {
                writer.write_all(b",\n")?;
            }
            serde_json::to_writer(&mut *writer, &CatalogEntry::from_record(rec))?;
        }
        writer.write_all(b"]")?;
        Ok(())
    }

    pub fn load(reader: impl Read) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_reader(reader)?;
        let records = entries
            .into_iter()
            .map(CatalogEntry::into_record)
            .collect::<Result<Vec<_>>>()?;
        Self::from_records(records)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        self.save(&mut w)?;
        w.flush()?;
        tracing::info!(path = %path.as_ref().display(), entities = self.len(), "catalog written");
        Ok(())
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let catalog = Self::load(BufReader::new(File::open(path.as_ref())?))?;
        tracing::info!(path = %path.as_ref().display(), entities = catalog.len(), "catalog loaded");
        Ok(catalog)
    }
}
