//! File-backed album store.

use crate::codec;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::record::{PartialRecord, Record};
use crate::rewrite::{self, RewriteMode};
use crate::{MalformedReport, Result, StoreError};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Worker pool used by get, add and update
    pub pipeline: PipelineConfig,
    /// How delete and update replace the file
    pub rewrite: RewriteMode,
    /// Create an empty file on open if none exists
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            rewrite: RewriteMode::default(),
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_rewrite(mut self, rewrite: RewriteMode) -> Self {
        self.rewrite = rewrite;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

/// Album store over one flat file.
///
/// Cloning is cheap. Clones share a lock: `get` calls run concurrently, while
/// `add`, `delete` and `update` run one at a time. Stores opened separately on
/// the same path, or other processes, are not coordinated and can interleave
/// appends with rewrites.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    config: StoreConfig,
    lock: Arc<RwLock<()>>,
}

impl Store {
    /// Open with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, StoreConfig::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if config.create_if_missing {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            OpenOptions::new().create(true).append(true).open(&path)?;
        } else {
            File::open(&path)?;
        }

        trace_debug!(path = %path.display(), ?config, "store opened");
        Ok(Self {
            path,
            config,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.config.pipeline)
    }

    /// Read every well-formed record, in file order.
    ///
    /// Lines without exactly four fields, or that are not valid UTF-8, are
    /// skipped silently. Any line with a non-numeric price fails the whole
    /// call with [`StoreError::Malformed`].
    pub fn get(&self) -> Result<Vec<Record>> {
        let _guard = self.lock.read();

        let file = File::open(&self.path)?;
        let lines = codec::read_lines(BufReader::new(file)).map(|line| line.map_err(StoreError::from));
        let decoded = self.pipeline().run(lines, |_, line| codec::decode_bytes(&line))?;

        let mut records = Vec::with_capacity(decoded.len());
        let mut report = MalformedReport::default();
        let mut skipped = 0usize;

        for (idx, result) in decoded.into_iter().enumerate() {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => skipped += 1,
                Err(e) => report.push(idx + 1, e),
            }
        }

        if skipped > 0 {
            trace_debug!(skipped, "skipped noise lines");
        }
        if !report.is_empty() {
            trace_warn!(path = %self.path.display(), bad_lines = report.len(), "get failed");
        }
        report.into_result()?;

        Ok(records)
    }

    /// Number of well-formed records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.get()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Append records, assigning a UUID to each record without an id.
    ///
    /// Returns the records with their ids, in input order; lines are written
    /// in the same order with a single append. Nothing is written if any record
    /// holds a value containing the delimiter or a line break.
    pub fn add(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        let resolved: Vec<Record> = records
            .into_iter()
            .map(|record| {
                if record.has_id() {
                    record
                } else {
                    record.with_id(Uuid::new_v4().to_string())
                }
            })
            .collect();

        for record in &resolved {
            codec::validate(record)?;
        }
        if resolved.is_empty() {
            return Ok(resolved);
        }

        let _guard = self.lock.write();

        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let lines = self
            .pipeline()
            .run(resolved.iter().map(Ok), |_, record| codec::encode(record))?;

        let mut block = String::new();
        if missing_final_newline(&mut file)? {
            block.push('\n');
        }
        block.push_str(&lines.concat());
        file.write_all(block.as_bytes())?;

        trace_debug!(added = resolved.len(), "add committed");
        Ok(resolved)
    }

    /// Remove records by id. See [`RewriteMode`] for how the file is replaced.
    ///
    /// Returns the ids actually removed, in file order. If nothing matched the
    /// file is not touched.
    pub fn delete(&self, keys: Vec<String>) -> Result<Vec<String>> {
        let _guard = self.lock.write();
        rewrite::delete(&self.path, self.config.rewrite, &keys)
    }

    /// Apply partial updates to the records with matching ids.
    ///
    /// Returns the merged records in file order; partials whose id matches
    /// nothing are left out. If nothing matched the file is not touched.
    pub fn update(&self, partials: Vec<PartialRecord>) -> Result<Vec<Record>> {
        let _guard = self.lock.write();
        rewrite::update(&self.path, self.config.rewrite, &self.pipeline(), &partials)
    }
}

/// True if the file is non-empty and its last byte is not `\n`.
fn missing_final_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
