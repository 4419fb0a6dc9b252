//! Scan-and-rewrite engine for delete and update.
//!
//! Both operations read the whole file once, build the new contents in
//! memory, and only touch the file if at least one line changed.

use crate::codec::{self, CodecError};
use crate::pipeline::Pipeline;
use crate::record::{PartialRecord, Record};
use crate::{MalformedReport, Result, StoreError};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// How rebuilt contents replace the old file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RewriteMode {
    /// Truncate, seek to the start and write on the scanned handle.
    ///
    /// Not atomic: a failure after the truncate leaves the file empty or
    /// partially written.
    #[default]
    InPlace,
    /// Write a sibling temporary file, fsync it and rename it over the
    /// original. Readers see either the old or the new contents.
    Atomic,
}

/// Read-write handle held for one scan/rewrite cycle.
struct Rewriter<'a> {
    path: &'a Path,
    file: File,
    mode: RewriteMode,
}

impl<'a> Rewriter<'a> {
    fn open(path: &'a Path, mode: RewriteMode) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { path, file, mode })
    }

    fn lines(&self) -> impl Iterator<Item = Result<Vec<u8>>> + Send + '_ {
        codec::read_lines(BufReader::new(&self.file)).map(|line| line.map_err(StoreError::from))
    }

    fn commit(self, contents: &[u8]) -> Result<()> {
        let Self { path, mut file, mode } = self;

        match mode {
            RewriteMode::InPlace => {
                file.set_len(0)?;
                file.seek(SeekFrom::Start(0))?;
                file.write_all(contents)?;
            }
            RewriteMode::Atomic => {
                let permissions = file.metadata()?.permissions();
                drop(file);

                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };
                let mut tmp = NamedTempFile::new_in(dir)?;
                tmp.write_all(contents)?;
                tmp.as_file().set_permissions(permissions)?;
                tmp.as_file().sync_all()?;
                tmp.persist(path).map_err(|e| e.error)?;
            }
        }

        trace_debug!(path = %path.display(), bytes = contents.len(), ?mode, "file rewritten");
        Ok(())
    }
}

/// Remove every line whose leading id is in `keys`.
///
/// Returns the removed ids in file order, one entry per removed line. Unknown
/// keys are ignored. Lines are matched on the raw bytes of their first field
/// only, so a line with the wrong field count or invalid UTF-8 elsewhere can
/// still be removed. Other lines are written back byte for byte.
pub(crate) fn delete(path: &Path, mode: RewriteMode, keys: &[String]) -> Result<Vec<String>> {
    let mut deleted = Vec::new();
    if keys.is_empty() {
        return Ok(deleted);
    }

    let rewriter = Rewriter::open(path, mode)?;
    let wanted: HashSet<&[u8]> = keys.iter().map(String::as_bytes).collect();
    let mut kept = Vec::new();

    for line in rewriter.lines() {
        let line = line?;
        let id = codec::leading_id(&line);
        if wanted.contains(id) {
            // Matched a requested key, so it is valid UTF-8.
            deleted.push(String::from_utf8_lossy(id).into_owned());
        } else {
            kept.extend_from_slice(&line);
            kept.push(b'\n');
        }
    }

    if deleted.is_empty() {
        return Ok(deleted);
    }

    rewriter.commit(&kept)?;
    trace_debug!(requested = keys.len(), deleted = deleted.len(), "delete committed");
    Ok(deleted)
}

enum Merged {
    Unchanged(Vec<u8>),
    Updated(Record),
}

fn merge_line(line: Vec<u8>, patches: &HashMap<&str, &PartialRecord>) -> std::result::Result<Merged, CodecError> {
    let line = match String::from_utf8(line) {
        Ok(line) => line,
        Err(e) => return Ok(Merged::Unchanged(e.into_bytes())),
    };
    let Some([id, title, artist, price]) = codec::split_fields(&line) else {
        return Ok(Merged::Unchanged(line.into_bytes()));
    };
    let Some(patch) = patches.get(id) else {
        return Ok(Merged::Unchanged(line.into_bytes()));
    };

    // The stored price only has to parse if it survives the merge.
    let price = match patch.price {
        Some(price) => price,
        None => codec::parse_price(price)?,
    };
    let current = Record {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        price,
    };

    Ok(Merged::Updated(patch.apply(&current)))
}

/// Merge `partials` into the records with matching ids.
///
/// Every line carrying a matched id is updated. When two partials name the
/// same id, the first one wins. Returns the merged records in file order.
pub(crate) fn update(
    path: &Path,
    mode: RewriteMode,
    pipeline: &Pipeline,
    partials: &[PartialRecord],
) -> Result<Vec<Record>> {
    for partial in partials {
        codec::validate_partial(partial)?;
    }
    if partials.is_empty() {
        return Ok(Vec::new());
    }

    let mut patches: HashMap<&str, &PartialRecord> = HashMap::with_capacity(partials.len());
    for partial in partials {
        patches.entry(partial.id.as_str()).or_insert(partial);
    }

    let rewriter = Rewriter::open(path, mode)?;
    // Ordered fan-in: `merged` is complete only after every worker is joined.
    let merged = pipeline.run(rewriter.lines(), |_, line| merge_line(line, &patches))?;

    let mut contents = Vec::new();
    let mut updated = Vec::new();
    let mut report = MalformedReport::default();

    for (idx, line) in merged.into_iter().enumerate() {
        match line {
            Ok(Merged::Unchanged(line)) => {
                contents.extend_from_slice(&line);
                contents.push(b'\n');
            }
            Ok(Merged::Updated(record)) => {
                contents.extend_from_slice(codec::encode(&record).as_bytes());
                updated.push(record);
            }
            Err(e) => report.push(idx + 1, e),
        }
    }

    if !report.is_empty() {
        trace_warn!(path = %path.display(), bad_lines = report.len(), "update aborted");
    }
    report.into_result()?;

    if updated.is_empty() {
        return Ok(updated);
    }

    rewriter.commit(&contents)?;
    trace_debug!(requested = partials.len(), updated = updated.len(), "update committed");
    Ok(updated)
}
