//! Edge log: `result input input...` strings, written as one JSON array.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Error, Result};

/// One logged equation: `inputs` combined land nearest to `result`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub result: String,
    /// Input abbreviations, sorted, duplicates kept.
    pub inputs: SmallVec<[String; 2]>,
}

impl Edge {
    pub fn new<I, S>(result: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { result: result.into(), inputs: inputs.into_iter().map(Into::into).collect() }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)?;
        for input in &self.inputs {
            write!(f, " {input}")?;
        }
        Ok(())
    }
}

impl FromStr for Edge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let result = parts.next().ok_or_else(|| Error::Decode("empty edge".into()))?;
        let inputs: SmallVec<[String; 2]> = parts.map(str::to_string).collect();
        if inputs.is_empty() {
            return Err(Error::Decode(format!("edge '{s}' has no inputs")));
        }
        Ok(Self { result: result.to_string(), inputs })
    }
}

/// `edges_{count}_{yymmdd_HHMMSS}.json`
pub fn edge_file_name<Tz>(count: usize, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("edges_{count}_{}.json", at.format("%y%m%d_%H%M%S"))
}

pub fn edges_to_json(edges: &[Edge]) -> Result<String> {
    let lines: Vec<String> = edges.iter().map(Edge::to_string).collect();
    Ok(serde_json::to_string(&lines)?)
}

/// Write `edges` under `dir`, named for a catalog of `count` entities.
pub fn write_edges<Tz>(dir: impl AsRef<Path>, count: usize, edges: &[Edge], at: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let path = dir.as_ref().join(edge_file_name(count, at));
    fs::write(&path, edges_to_json(edges)?)?;
    tracing::info!(path = %path.display(), edges = edges.len(), "edges written");
    Ok(path)
}

/// [`write_edges`] stamped with the local time.
pub fn write_edges_now(dir: impl AsRef<Path>, count: usize, edges: &[Edge]) -> Result<PathBuf> {
    write_edges(dir, count, edges, &Local::now())
}

pub fn read_edges(path: impl AsRef<Path>) -> Result<Vec<Edge>> {
    let text = fs::read_to_string(path)?;
    let lines: Vec<String> = serde_json::from_str(&text)?;
    lines.iter().map(|l| l.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn file_name_uses_short_timestamp() {
        assert_eq!(edge_file_name(251, &stamp()), "edges_251_240309_070501.json");
    }

    #[test]
    fn display_and_parse() {
        let e = Edge::new("c", ["a", "b"]);
        assert_eq!(e.to_string(), "c a b");
        assert_eq!("c a b".parse::<Edge>().unwrap(), e);
        assert!("c".parse::<Edge>().is_err());
        assert!("  ".parse::<Edge>().is_err());
    }

    #[test]
    fn json_is_an_array_of_strings() {
        let edges = vec![Edge::new("c", ["a", "b"]), Edge::new("d", ["a", "a"])];
        assert_eq!(edges_to_json(&edges).unwrap(), r#"["c a b","d a a"]"#);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let edges = vec![Edge::new("sun", ["hot", "sky"])];
        let path = write_edges(dir.path(), 3, &edges, &stamp()).unwrap();
        assert!(path.ends_with("edges_3_240309_070501.json"));
        assert_eq!(read_edges(&path).unwrap(), edges);
    }
}
