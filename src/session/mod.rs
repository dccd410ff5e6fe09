use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::error::IndexError;
use crate::storage::index::BTreeIndex;

/// Outcome of a bulk load: how many pairs went in, and which lines were
/// skipped (1-based line number plus the offending content).
pub struct LoadReport {
    pub inserted: usize,
    pub skipped: Vec<(usize, String)>,
}

/// Owns at most one open index at a time and exposes the command surface
/// the front-end binds to. Operations that need an open index fail with
/// `NoSessionOpen`; overwrite decisions for create/extract belong to the
/// caller.
#[derive(Default)]
pub struct Session {
    index: Option<BTreeIndex>,
}

impl Session {
    pub fn new() -> Self {
        Self { index: None }
    }

    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    fn index_mut(&mut self) -> Result<&mut BTreeIndex, IndexError> {
        self.index.as_mut().ok_or(IndexError::NoSessionOpen)
    }

    /// Create a fresh index file and make it the open session. Truncates
    /// any existing file at `path`.
    pub fn create(&mut self, path: &Path) -> Result<(), IndexError> {
        self.index = Some(BTreeIndex::create(path)?);
        Ok(())
    }

    /// Open an existing index file, replacing any currently open one. The
    /// session keeps its previous index when validation fails.
    pub fn open(&mut self, path: &Path) -> Result<(), IndexError> {
        let index = BTreeIndex::open(path)?;
        self.index = Some(index);
        Ok(())
    }

    pub fn insert(&mut self, key: u64, value: u64) -> Result<(), IndexError> {
        self.index_mut()?.insert(key, value)
    }

    pub fn search(&mut self, key: u64) -> Result<Option<(u64, u64)>, IndexError> {
        self.index_mut()?.search(key)
    }

    /// Bulk-load `key,value` lines from a text file. Malformed lines are
    /// recorded and skipped; well-formed lines keep being inserted.
    pub fn load(&mut self, path: &Path) -> Result<LoadReport, IndexError> {
        if self.index.is_none() {
            return Err(IndexError::NoSessionOpen);
        }
        if !path.exists() {
            return Err(IndexError::FileNotFound(path.to_path_buf()));
        }

        let reader = BufReader::new(File::open(path)?);
        let mut report = LoadReport {
            inserted: 0,
            skipped: Vec::new(),
        };

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            match parse_pair(&line) {
                Ok((key, value)) => {
                    self.index_mut()?.insert(key, value)?;
                    report.inserted += 1;
                }
                Err(_) => report.skipped.push((number + 1, line)),
            }
        }

        Ok(report)
    }

    pub fn print(&mut self, out: &mut impl Write) -> Result<(), IndexError> {
        self.index_mut()?.dump(out)
    }

    /// Extract every pair in key order to a text file. Returns the pair
    /// count. Truncates any existing file at `path`.
    pub fn extract(&mut self, path: &Path) -> Result<usize, IndexError> {
        let index = self.index_mut()?;
        let mut out = BufWriter::new(File::create(path)?);
        let count = index.extract(&mut out)?;
        out.flush()?;
        Ok(count)
    }

    pub fn close(&mut self) {
        self.index = None;
    }
}

fn parse_pair(line: &str) -> Result<(u64, u64), IndexError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 2 {
        return Err(IndexError::InvalidInput(format!(
            "expected key,value: {:?}",
            line
        )));
    }
    let key = fields[0]
        .trim()
        .parse::<u64>()
        .map_err(|_| IndexError::InvalidInput(format!("bad key: {:?}", fields[0])))?;
    let value = fields[1]
        .trim()
        .parse::<u64>()
        .map_err(|_| IndexError::InvalidInput(format!("bad value: {:?}", fields[1])))?;
    Ok((key, value))
}
