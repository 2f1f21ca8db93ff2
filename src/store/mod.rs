//! File-backed flat inner-product vector store.
//!
//! A store is a directory holding two files: a binary index of all vectors
//! (see [`format`]) and a parallel JSON array of metadata records. Position
//! `i` in the metadata array corresponds to the `i`-th vector ever added;
//! entries are append-only and never reordered.
//!
//! All vectors are L2-normalized on insertion, so inner product equals
//! cosine similarity. Writers are serialized through an internal `RwLock`
//! (one `add` at a time); `search` and `get` are pure reads and may run
//! concurrently with each other. Every successful `add` has persisted both
//! files via an atomic temp-file rename before it returns.

pub mod format;

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const INDEX_FILE: &str = "index.bin";
const META_FILE: &str = "meta.json";

/// Errors raised by vector store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("dimension mismatch: store holds {expected}-d vectors, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("index {index} out of range for store of {len} entries")]
    OutOfRange { index: usize, len: usize },

    #[error("batch length mismatch: {vectors} vectors but {metadatas} metadata records")]
    LengthMismatch { vectors: usize, metadatas: usize },

    #[error("corrupt store: index holds {vectors} vectors but metadata holds {metadatas} records")]
    CorruptStore { vectors: usize, metadatas: usize },

    #[error("invalid index file: {0}")]
    InvalidIndexFile(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata stored alongside each vector: the chunk text plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub text: String,
    pub source: String,
    pub offset: usize,
}

/// A single nearest-neighbor result: position in the store plus cosine
/// similarity in `[-1, 1]`. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub score: f32,
}

struct Inner {
    /// Fixed once set, either by `load` or by the first `add` batch.
    dim: Option<usize>,
    /// Flat row-major buffer, `count * dim` values.
    vectors: Vec<f32>,
    meta: Vec<ChunkMetadata>,
}

/// A vector store rooted at one directory.
pub struct VectorStore {
    index_path: PathBuf,
    meta_path: PathBuf,
    inner: RwLock<Inner>,
}

impl VectorStore {
    /// Open a store at `dir`, creating the directory if absent. No vector
    /// data is read until [`load`](Self::load) or the first
    /// [`add`](Self::add).
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            index_path: dir.join(INDEX_FILE),
            meta_path: dir.join(META_FILE),
            inner: RwLock::new(Inner {
                dim: None,
                vectors: Vec::new(),
                meta: Vec::new(),
            }),
        })
    }

    /// Load the on-disk index and metadata, or initialize an empty store of
    /// dimensionality `dim` if no index file exists yet.
    ///
    /// Fails with [`StoreError::DimensionMismatch`] if the stored index was
    /// built with a different dimensionality, and with
    /// [`StoreError::CorruptStore`] if the index and metadata files have
    /// diverged (e.g. one was replaced or truncated out-of-band).
    pub fn load(&self, dim: usize) -> Result<(), StoreError> {
        let mut inner = write_lock(&self.inner);
        self.load_locked(&mut inner, dim)
    }

    fn load_locked(&self, inner: &mut Inner, dim: usize) -> Result<(), StoreError> {
        if !self.index_path.exists() {
            info!("no index at {}, starting empty ({dim}-d)", self.index_path.display());
            inner.dim = Some(dim);
            inner.vectors.clear();
            inner.meta.clear();
            return Ok(());
        }

        let bytes = fs::read(&self.index_path)?;
        let (stored_dim, vectors) = format::decode(&bytes)?;
        if stored_dim != dim {
            return Err(StoreError::DimensionMismatch {
                expected: stored_dim,
                got: dim,
            });
        }

        let meta: Vec<ChunkMetadata> = if self.meta_path.exists() {
            serde_json::from_slice(&fs::read(&self.meta_path)?)?
        } else {
            Vec::new()
        };

        let count = vectors.len() / stored_dim;
        if count != meta.len() {
            return Err(StoreError::CorruptStore {
                vectors: count,
                metadatas: meta.len(),
            });
        }

        info!("loaded {count} vectors ({stored_dim}-d) from {}", self.index_path.display());
        inner.dim = Some(stored_dim);
        inner.vectors = vectors;
        inner.meta = meta;
        Ok(())
    }

    /// Append a batch of vectors and their metadata, then persist both files.
    ///
    /// Vectors are L2-normalized in place before insertion. Calling `add`
    /// before `load` first loads any existing on-disk state, using the
    /// dimensionality of the first vector in the batch. On any error the
    /// store (memory and disk) is left unchanged.
    pub fn add(
        &self,
        vectors: &[Vec<f32>],
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<(), StoreError> {
        if vectors.len() != metadatas.len() {
            return Err(StoreError::LengthMismatch {
                vectors: vectors.len(),
                metadatas: metadatas.len(),
            });
        }
        if vectors.is_empty() {
            return Ok(());
        }

        let mut inner = write_lock(&self.inner);

        let dim = match inner.dim {
            Some(d) => d,
            None => {
                let d = vectors[0].len();
                debug!("auto-loading store at {d}-d from first batch");
                self.load_locked(&mut inner, d)?;
                d
            }
        };
        for v in vectors {
            if v.len() != dim {
                return Err(StoreError::DimensionMismatch {
                    expected: dim,
                    got: v.len(),
                });
            }
        }

        // Build the new state aside, persist it, then commit in memory. A
        // failed write never leaves a half-appended store behind.
        let mut new_vectors = inner.vectors.clone();
        new_vectors.reserve(vectors.len() * dim);
        for v in vectors {
            let mut v = v.clone();
            normalize(&mut v);
            new_vectors.extend_from_slice(&v);
        }
        let mut new_meta = inner.meta.clone();
        new_meta.extend(metadatas);

        write_atomic(&self.index_path, &format::encode(dim, &new_vectors))?;
        write_atomic(&self.meta_path, &serde_json::to_vec(&new_meta)?)?;

        debug!("persisted {} vectors to {}", new_meta.len(), self.index_path.display());
        inner.vectors = new_vectors;
        inner.meta = new_meta;
        Ok(())
    }

    /// Return up to `k` nearest stored vectors to `query` by inner product,
    /// descending by score. Ties keep insertion order. A store holding fewer
    /// than `k` vectors returns everything it has.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, StoreError> {
        let inner = read_lock(&self.inner);

        let Some(dim) = inner.dim else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(StoreError::DimensionMismatch {
                expected: dim,
                got: query.len(),
            });
        }
        if inner.meta.is_empty() {
            return Ok(Vec::new());
        }

        let mut q = query.to_vec();
        normalize(&mut q);

        let mut hits: Vec<Hit> = inner
            .vectors
            .chunks_exact(dim)
            .enumerate()
            .map(|(index, row)| Hit {
                index,
                score: dot(&q, row),
            })
            .collect();
        // Stable sort: equal scores keep insertion order
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    /// Search several query vectors in one call.
    pub fn search_batch(
        &self,
        queries: &[Vec<f32>],
        k: usize,
    ) -> Result<Vec<Vec<Hit>>, StoreError> {
        queries.iter().map(|q| self.search(q, k)).collect()
    }

    /// Return the metadata stored at position `i`.
    pub fn get(&self, i: usize) -> Result<ChunkMetadata, StoreError> {
        let inner = read_lock(&self.inner);
        inner
            .meta
            .get(i)
            .cloned()
            .ok_or(StoreError::OutOfRange {
                index: i,
                len: inner.meta.len(),
            })
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        read_lock(&self.inner).meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scale `v` to unit L2 norm. Zero vectors are left untouched, which also
/// makes the operation idempotent: normalizing twice is a no-op.
pub fn normalize(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv = 1.0 / norm_sq.sqrt();
        for x in v {
            *x *= inv;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Write `bytes` to a sibling temp file, fsync, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_lock(lock: &RwLock<Inner>) -> RwLockReadGuard<'_, Inner> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock(lock: &RwLock<Inner>) -> RwLockWriteGuard<'_, Inner> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
