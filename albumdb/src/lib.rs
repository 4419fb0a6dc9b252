//! Album record store backed by a single `;`-delimited flat file.
//!
//! - `Store::get` / `Store::add` - codec work fanned out over a bounded worker pool
//! - `Store::delete` / `Store::update` - single-pass scan, then rewrite the file
//!
//! Every call rescans the whole file; there is no index and no cache.
//!
//! ```rust,ignore
//! use albumdb::{PartialRecord, Record, Store};
//!
//! let store = Store::open("./data/albums")?;
//! let added = store.add(vec![Record::new("Blue Train", "John Coltrane", 56)])?;
//! store.update(vec![PartialRecord::new(&added[0].id).with_price(60)])?;
//! store.delete(vec![added[0].id.clone()])?;
//! ```

// Tracing macros - no-op when feature disabled
#[cfg(feature = "tracing")]
macro_rules! trace_debug { ($($arg:tt)*) => { tracing::debug!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug { ($($arg:tt)*) => {} }

#[cfg(feature = "tracing")]
macro_rules! trace_warn { ($($arg:tt)*) => { tracing::warn!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn { ($($arg:tt)*) => {} }

pub mod codec;
pub mod pipeline;
mod record;
mod rewrite;
mod store;

pub use codec::CodecError;
pub use pipeline::{Pipeline, PipelineConfig};
pub use record::{PartialRecord, Record};
pub use rewrite::RewriteMode;
pub use store::{Store, StoreConfig};

use std::fmt;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Config(&'static str),
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] CodecError),
    #[error("malformed data: {0}")]
    Malformed(MalformedReport),
    #[error("pipeline worker panicked")]
    WorkerPanicked,
}

impl StoreError {
    pub(crate) fn config(msg: &'static str) -> Self {
        Self::Config(msg)
    }
}

/// A line that could not be decoded, with its 1-based position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub error: CodecError,
}

/// Every undecodable line seen during one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MalformedReport {
    pub failures: Vec<LineError>,
}

impl MalformedReport {
    pub(crate) fn push(&mut self, line: usize, error: CodecError) {
        self.failures.push(LineError { line, error });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Malformed(self))
        }
    }
}

impl fmt::Display for MalformedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bad line(s)", self.failures.len())?;
        if let Some(first) = self.failures.first() {
            write!(f, ", first at line {}: {}", first.line, first.error)?;
        }
        Ok(())
    }
}
