use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::VecError;
use crate::flat::{check_batch, FlatIndex};
use crate::flat_io::{self, record_len, write_record, write_rows, HEADER_LEN};
use crate::vecstore::{Match, VecIndex};

/// Dimension of the face embeddings produced by the deployed model.
pub const DEFAULT_DIM: usize = 512;

/// File name used when no index path is configured.
pub const DEFAULT_INDEX_FILE: &str = "faiss_index.index";

/// How [`EmbeddingIndex::open`] obtained its initial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No file existed; the index started empty.
    Fresh,
    /// The file was read completely.
    Loaded { records: usize },
    /// The file ended in a partial record, which was discarded.
    Repaired { records: usize, dropped_bytes: usize },
    /// The file could not be used; the index started empty and the next
    /// insert replaces the file.
    Recovered { reason: String },
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Loaded { records } => write!(f, "loaded {records} records"),
            Self::Repaired {
                records,
                dropped_bytes,
            } => write!(f, "loaded {records} records, dropped {dropped_bytes} trailing bytes"),
            Self::Recovered { reason } => write!(f, "recovered empty: {reason}"),
        }
    }
}

struct Writer {
    next_id: u64,
    /// The file must be rewritten as a whole before records can be appended.
    needs_snapshot: bool,
    seen: HashSet<u64>,
}

/// EmbeddingIndex is a [`FlatIndex`] persisted to a single file.
///
/// Every accepted insert is written through to disk before it becomes
/// visible to searches. Writers are serialized by one mutex which also owns
/// sequential ID assignment ([`EmbeddingIndex::append`]); searches only
/// take the read side of the in-memory lock and are never blocked by disk
/// I/O.
pub struct EmbeddingIndex {
    path: PathBuf,
    index: FlatIndex,
    writer: Mutex<Writer>,
    outcome: LoadOutcome,
}

impl EmbeddingIndex {
    /// Open the index stored at `path`, or start empty.
    ///
    /// Never fails: a missing, unreadable or incompatible file yields an
    /// empty index of dimension `dim`, and the reason is logged and kept in
    /// [`EmbeddingIndex::load_outcome`]. Panics if `dim` is 0.
    pub fn open(path: impl AsRef<Path>, dim: usize) -> Self {
        let path = path.as_ref().to_path_buf();

        let (index, outcome) = match File::open(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no index file, starting empty");
                (FlatIndex::new(dim), LoadOutcome::Fresh)
            }
            Err(e) => recovered(&path, dim, VecError::from(e)),
            Ok(mut file) => match flat_io::load(&mut file, dim) {
                Err(e) => recovered(&path, dim, e),
                Ok((index, report)) if report.dropped_bytes > 0 => {
                    warn!(
                        path = %path.display(),
                        records = report.records,
                        dropped_bytes = report.dropped_bytes,
                        "index file ended in a partial record"
                    );
                    let outcome = LoadOutcome::Repaired {
                        records: report.records,
                        dropped_bytes: report.dropped_bytes,
                    };
                    (index, outcome)
                }
                Ok((index, report)) => {
                    info!(path = %path.display(), records = report.records, "index loaded");
                    (index, LoadOutcome::Loaded { records: report.records })
                }
            },
        };

        let seen: HashSet<u64> = index.read_inner().ids.iter().copied().collect();
        let writer = Writer {
            next_id: index.max_id().map_or(0, |id| id + 1),
            needs_snapshot: !matches!(outcome, LoadOutcome::Loaded { .. }),
            seen,
        };

        Self {
            path,
            index,
            writer: Mutex::new(writer),
            outcome,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the initial state was obtained.
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    /// Number of stored vectors.
    pub fn total_count(&self) -> usize {
        self.index.len()
    }

    /// The ID [`EmbeddingIndex::append`] will assign next.
    pub fn next_id(&self) -> u64 {
        self.writer.lock().next_id
    }

    /// Insert vectors under caller-supplied IDs and persist them.
    ///
    /// On error nothing is applied: the batch is validated first, and rows
    /// only become searchable after the file write succeeded. Duplicate IDs
    /// are accepted and logged.
    pub fn insert(&self, ids: &[u64], vectors: &[&[f32]]) -> Result<(), VecError> {
        let mut writer = self.writer.lock();
        self.insert_locked(&mut writer, ids, vectors)
    }

    /// Insert one vector under the next sequential ID and return that ID.
    ///
    /// ID assignment and the insert happen in the same critical section, so
    /// concurrent callers always receive distinct IDs.
    pub fn append(&self, vector: &[f32]) -> Result<u64, VecError> {
        let mut writer = self.writer.lock();
        let id = writer.next_id;
        self.insert_locked(&mut writer, &[id], &[vector])?;
        Ok(id)
    }

    /// Search for the `k` nearest stored vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Match>, VecError> {
        self.index.search(query, k)
    }

    fn insert_locked(
        &self,
        writer: &mut Writer,
        ids: &[u64],
        vectors: &[&[f32]],
    ) -> Result<(), VecError> {
        check_batch(self.index.dim(), ids, vectors)?;
        if ids.is_empty() {
            return Ok(());
        }

        for &id in ids {
            if writer.seen.contains(&id) {
                warn!(id, "inserting duplicate id");
            }
        }

        if !writer.needs_snapshot && !self.file_is_consistent() {
            warn!(path = %self.path.display(), "index file out of step with memory, rewriting");
            writer.needs_snapshot = true;
        }

        if writer.needs_snapshot {
            self.write_snapshot(ids, vectors)?;
            writer.needs_snapshot = false;
        } else if let Err(e) = self.append_records(ids, vectors) {
            // Part of the batch may have reached the file.
            writer.needs_snapshot = true;
            return Err(e);
        }

        self.index.batch_insert(ids, vectors)?;
        for &id in ids {
            writer.seen.insert(id);
            if id >= writer.next_id {
                writer.next_id = id.saturating_add(1);
            }
        }
        debug!(count = ids.len(), total = self.index.len(), "embeddings inserted");
        Ok(())
    }

    /// Whether the file holds exactly the header plus the in-memory rows.
    fn file_is_consistent(&self) -> bool {
        let want = HEADER_LEN + self.index.len() * record_len(self.index.dim());
        fs::metadata(&self.path).is_ok_and(|m| m.len() == want as u64)
    }

    fn append_records(&self, ids: &[u64], vectors: &[&[f32]]) -> Result<(), VecError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut bw = BufWriter::new(file);
        for (&id, v) in ids.iter().zip(vectors) {
            write_record(&mut bw, id, v)?;
        }
        let file = bw.into_inner().map_err(|e| VecError::from(e.into_error()))?;
        file.sync_data()?;
        Ok(())
    }

    /// Rewrite the whole file with the current rows plus the pending batch.
    /// Writes to a sibling temp file and renames it over the target.
    fn write_snapshot(&self, ids: &[u64], vectors: &[&[f32]]) -> Result<(), VecError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let written = (|| -> Result<(), VecError> {
            let mut file = File::create(&tmp_path)?;
            {
                let inner = self.index.read_inner();
                let pending = ids.iter().copied().zip(vectors.iter().copied());
                write_rows(&mut file, inner.dim, inner.rows().chain(pending))?;
            }
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        })();
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        info!(path = %self.path.display(), "index snapshot written");
        Ok(())
    }
}

fn recovered(path: &Path, dim: usize, e: VecError) -> (FlatIndex, LoadOutcome) {
    error!(path = %path.display(), error = %e, "failed to load index, starting empty");
    let outcome = LoadOutcome::Recovered {
        reason: e.to_string(),
    };
    (FlatIndex::new(dim), outcome)
}

impl VecIndex for EmbeddingIndex {
    fn dim(&self) -> usize {
        self.index.dim()
    }

    fn insert(&self, id: u64, vector: &[f32]) -> Result<(), VecError> {
        EmbeddingIndex::insert(self, &[id], &[vector])
    }

    fn batch_insert(&self, ids: &[u64], vectors: &[&[f32]]) -> Result<(), VecError> {
        EmbeddingIndex::insert(self, ids, vectors)
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError> {
        self.index.search(query, top_k)
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
