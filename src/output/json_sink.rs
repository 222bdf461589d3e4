//! JSON document persistence
//!
//! Documents are always written whole: serialize to a temporary file in the
//! destination directory, then rename it over the destination. A reader (or
//! an interrupted crawl) therefore only ever sees a complete JSON array.

use crate::model::{CrawlResult, TopicDocument};
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Serializes `value` as JSON indented with four spaces
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> OutputResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Atomically replaces `path` with the given documents
///
/// Parent directories are created as needed.
pub fn write_documents(path: &Path, documents: &[TopicDocument]) -> OutputResult<()> {
    write_value(path, documents)
}

/// Loads a persisted document array
pub fn load_documents(path: &Path) -> OutputResult<Vec<TopicDocument>> {
    let content = fs::read_to_string(path).map_err(|source| OutputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| OutputError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_value<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let bytes = to_pretty_json(value)?;
    write_atomic(path, &bytes).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn output_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = output_dir(path);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Checks that a file can be placed next to `path` without touching `path`
fn ensure_writable(path: &Path) -> OutputResult<()> {
    let dir = output_dir(path);
    fs::create_dir_all(dir)
        .and_then(|()| NamedTempFile::new_in(dir))
        .map(drop)
        .map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Previously persisted documents followed by the current crawl result
struct Combined<'a> {
    kept: &'a [TopicDocument],
    crawled: &'a [TopicDocument],
}

impl Serialize for Combined<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.kept.iter().chain(self.crawled))
    }
}

/// Sink that keeps a JSON file in sync with the crawl result
///
/// Opening the sink checks that the destination directory is writable but
/// leaves the destination itself alone until the first write. The file is
/// rewritten every `checkpoint_every` topics and once more on close. In
/// append mode each write keeps the documents found when the sink opened.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    kept: Vec<TopicDocument>,
    checkpoint_every: u32,
    since_checkpoint: u32,
}

impl JsonFileSink {
    /// Opens a sink that replaces `path` with this crawl's documents
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file
    /// * `checkpoint_every` - Topics between rewrites; 0 writes only on close
    pub fn create(path: impl Into<PathBuf>, checkpoint_every: u32) -> OutputResult<Self> {
        let path = path.into();
        ensure_writable(&path)?;
        tracing::debug!("Opened output document {}", path.display());

        Ok(Self {
            path,
            kept: Vec::new(),
            checkpoint_every,
            since_checkpoint: 0,
        })
    }

    /// Opens a sink that appends this crawl's documents to those already in `path`
    ///
    /// A missing file starts empty. A file that is not a well-formed
    /// document array is an error and is left as it is.
    pub fn append(path: impl Into<PathBuf>, checkpoint_every: u32) -> OutputResult<Self> {
        let path = path.into();
        let kept = if path.exists() {
            load_documents(&path)?
        } else {
            Vec::new()
        };
        ensure_writable(&path)?;
        tracing::debug!(
            "Appending to output document {} ({} existing topics)",
            path.display(),
            kept.len()
        );

        Ok(Self {
            path,
            kept,
            checkpoint_every,
            since_checkpoint: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Documents that were in the file before this crawl
    pub fn kept(&self) -> &[TopicDocument] {
        &self.kept
    }

    fn write(&self, result: &CrawlResult) -> OutputResult<()> {
        write_value(
            &self.path,
            &Combined {
                kept: &self.kept,
                crawled: result.documents(),
            },
        )
    }
}

impl ResultSink for JsonFileSink {
    fn record(&mut self, result: &CrawlResult) -> OutputResult<()> {
        self.since_checkpoint += 1;

        if self.checkpoint_every > 0 && self.since_checkpoint >= self.checkpoint_every {
            self.write(result)?;
            self.since_checkpoint = 0;
            tracing::trace!(
                "Checkpointed {} topics to {}",
                self.kept.len() + result.len(),
                self.path.display()
            );
        }

        Ok(())
    }

    fn close(&mut self, result: &CrawlResult) -> OutputResult<()> {
        self.write(result)?;
        self.since_checkpoint = 0;
        tracing::info!(
            "Wrote {} topics to {} ({} from earlier runs)",
            self.kept.len() + result.len(),
            self.path.display(),
            self.kept.len()
        );
        Ok(())
    }
}
