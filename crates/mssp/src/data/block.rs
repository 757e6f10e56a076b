//! Pre-sampled training records stored as numbered JSON blocks.
//!
//! A block directory holds `0.json`, `1.json`, ... each containing a list of
//! [`SampleRecord`]s. Blocks are written atomically (write-then-rename).

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Errors raised while reading or writing sample blocks.
#[derive(Debug, thiserror::Error)]
pub enum BlockIoError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed block {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BlockIoError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One pre-sampled training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Raw inputs, `[n_rows, n_sets]`.
    pub x: Array2<f64>,
    /// Raw responses, `[n_rows, n_sets]`.
    pub y: Array2<f64>,
    /// Tokenized target skeleton (leading start sentinel included).
    #[serde(default)]
    pub tokens: Option<Vec<u32>>,
    /// The generating expression.
    pub expression: String,
    /// The expression actually sampled for each set (coefficients drawn).
    #[serde(default)]
    pub set_expressions: Vec<String>,
}

/// A file-sized group of records.
pub type SampleBlock = Vec<SampleRecord>;

/// Read one block.
pub fn read_block(path: &Path) -> Result<SampleBlock, BlockIoError> {
    let file = File::open(path).map_err(|e| BlockIoError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| BlockIoError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write one block atomically.
pub fn write_block(path: &Path, block: &[SampleRecord]) -> Result<(), BlockIoError> {
    let tmp = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp).map_err(|e| BlockIoError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, block).map_err(|source| BlockIoError::Json {
            path: tmp.clone(),
            source,
        })?;
        writer.flush().map_err(|e| BlockIoError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| BlockIoError::io(path, e))
}

/// List the `*.json` blocks of a directory, ordered by numeric file stem
/// (non-numeric stems sort last, by name).
pub fn list_blocks(dir: &Path) -> Result<Vec<PathBuf>, BlockIoError> {
    let entries = fs::read_dir(dir).map_err(|e| BlockIoError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BlockIoError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort_by_key(|p| {
        let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
        (stem.parse::<u64>().unwrap_or(u64::MAX), stem)
    });
    Ok(paths)
}

// =============================================================================
// BlockWriter
// =============================================================================

/// Accumulates records and flushes a numbered block every
/// `records_per_block` records.
#[derive(Debug)]
pub struct BlockWriter {
    dir: PathBuf,
    records_per_block: usize,
    pending: Vec<SampleRecord>,
    next_index: usize,
    written: Vec<PathBuf>,
}

impl BlockWriter {
    /// Default block size used for generated training data.
    pub const DEFAULT_RECORDS_PER_BLOCK: usize = 1000;

    /// Create a writer, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>, records_per_block: usize) -> Result<Self, BlockIoError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| BlockIoError::io(&dir, e))?;
        Ok(Self {
            dir,
            records_per_block: records_per_block.max(1),
            pending: Vec::new(),
            next_index: 0,
            written: Vec::new(),
        })
    }

    /// Add a record; returns the block path when this push completed a block.
    pub fn push(&mut self, record: SampleRecord) -> Result<Option<PathBuf>, BlockIoError> {
        self.pending.push(record);
        if self.pending.len() >= self.records_per_block {
            return self.flush().map(Some);
        }
        Ok(None)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Flush any partial block and return every block path written.
    pub fn finish(mut self) -> Result<Vec<PathBuf>, BlockIoError> {
        if !self.pending.is_empty() {
            self.flush()?;
        }
        Ok(self.written)
    }

    fn flush(&mut self) -> Result<PathBuf, BlockIoError> {
        let path = self.dir.join(format!("{}.json", self.next_index));
        write_block(&path, &self.pending)?;
        self.pending.clear();
        self.next_index += 1;
        self.written.push(path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn record(expression: &str) -> SampleRecord {
        SampleRecord {
            x: array![[0.0, 1.0], [2.0, 3.0]],
            y: array![[1.0, 1.5], [2.0, 2.5]],
            tokens: Some(vec![1, 5, 4, 2]),
            expression: expression.to_string(),
            set_expressions: vec![expression.to_string(); 2],
        }
    }

    #[test]
    fn block_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.json");
        let block = vec![record("x_1 + 1"), record("sin(x_1)")];
        write_block(&path, &block).unwrap();
        assert_eq!(read_block(&path).unwrap(), block);
    }

    #[test]
    fn writer_flushes_full_and_partial_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = BlockWriter::new(dir.path(), 2).unwrap();
        assert!(writer.push(record("a")).unwrap().is_none());
        let first = writer.push(record("b")).unwrap();
        assert_eq!(first, Some(dir.path().join("0.json")));
        writer.push(record("c")).unwrap();
        assert_eq!(writer.pending(), 1);
        let written = writer.finish().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(read_block(&written[1]).unwrap().len(), 1);
    }

    #[test]
    fn list_blocks_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for i in [10, 2, 1] {
            write_block(&dir.path().join(format!("{i}.json")), &[record("a")]).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let names: Vec<String> = list_blocks(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1.json", "2.json", "10.json"]);
    }

    #[test]
    fn missing_tokens_default_to_none() {
        let json = r#"[{"x":{"v":1,"dim":[1,1],"data":[0.0]},"y":{"v":1,"dim":[1,1],"data":[1.0]},"expression":"x_1"}]"#;
        let block: SampleBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block[0].tokens, None);
        assert!(block[0].set_expressions.is_empty());
    }
}
