//! Best-known results table.
//!
//! A delimited text file keyed by instance name, one instance per line:
//!
//! ```text
//! # name;status;best
//! golomb_10;C;55
//! rcpsp_j60_3;S;77
//! open_shop_4;S;
//! ```
//!
//! The status marker is an opaque class string; a `C` in it denotes a
//! certificate of optimality. The best column is optional.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Default column delimiter.
pub const DEFAULT_DELIMITER: char = ';';

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestKnownEntry {
    pub status: String,
    pub best: Option<i64>,
}

impl BestKnownEntry {
    /// Whether the status marker denotes a certificate.
    pub fn is_certified(&self) -> bool {
        self.status.contains('C')
    }

    pub fn has_best(&self) -> bool {
        self.best.is_some()
    }
}

/// Parsed best-known table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestKnownTable {
    entries: HashMap<String, BestKnownEntry>,
}

impl BestKnownTable {
    pub fn load(path: &Path, delimiter: char) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, delimiter)
    }

    pub fn parse(text: &str, delimiter: char) -> Result<Self> {
        let mut entries = HashMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cols: Vec<&str> = line.split(delimiter).map(str::trim).collect();
            if cols.len() < 2 || cols[0].is_empty() {
                return Err(BenchError::MalformedBestKnown {
                    line: idx + 1,
                    reason: format!("expected name{delimiter}status[{delimiter}best]"),
                });
            }
            let best = cols
                .get(2)
                .and_then(|b| b.replace(',', "").parse::<i64>().ok());
            entries.insert(
                cols[0].to_string(),
                BestKnownEntry {
                    status: cols[1].to_string(),
                    best,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn get(&self, instance: &str) -> Option<&BestKnownEntry> {
        self.entries.get(instance)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
