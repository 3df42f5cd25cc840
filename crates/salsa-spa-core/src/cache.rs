//! On-disk cache of built vocabulary indices.
//!
//! Lemmatizing a large word list dominates startup. The cache stores the
//! finished [`VocabularyIndex`] next to a description of what it was built
//! from: the source file's size and modification time, the lemmatizer
//! fingerprint and the accent policy. Any mismatch means the entry is stale
//! and the index is rebuilt from the source.
//!
//! Whether or not the cache is used, grading results are the same.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::time::UNIX_EPOCH;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{CacheError, CacheResult, VocabResult};
use crate::lemma::Lemmatizer;
use crate::text::AccentPolicy;
use crate::vocab::VocabularyIndex;

/// Bumped whenever the cache layout changes.
const CACHE_FORMAT: u32 = 1;

/// How a vocabulary index was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Loaded from a fresh cache entry.
    Hit,
    /// Built from the source (and written to the cache when possible).
    Rebuilt,
    /// Built from the source with caching turned off.
    Disabled,
    /// Built from the word list embedded in the crate.
    Embedded,
}

/// Identifies the inputs an index was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SourceStamp {
    source: Utf8PathBuf,
    len: u64,
    modified_secs: u64,
    modified_nanos: u32,
    lemmatizer: String,
    accents: AccentPolicy,
}

impl SourceStamp {
    fn capture(
        source: &Utf8Path,
        lemmatizer: String,
        accents: AccentPolicy,
    ) -> std::io::Result<Self> {
        let meta = std::fs::metadata(source.as_std_path())?;
        let modified = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Ok(Self {
            source: source.to_path_buf(),
            len: meta.len(),
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
            lemmatizer,
            accents,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    format: u32,
    stamp: SourceStamp,
    index: VocabularyIndex,
}

/// A directory of cached vocabulary indices.
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: Utf8PathBuf,
}

impl IndexCache {
    /// Cache rooted at `dir`. The directory is created on first write.
    pub fn new<P: AsRef<Utf8Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Cache in the platform cache directory (`~/.cache/salsa-spa/` on Linux).
    pub fn in_user_cache_dir() -> Option<Self> {
        crate::config::user_cache_dir().map(Self::new)
    }

    /// Cache selected by `config`, or `None` when caching is disabled or no
    /// cache directory can be determined.
    pub fn from_config(config: &Config) -> Option<Self> {
        if config.disable_index_cache {
            return None;
        }
        config
            .cache_dir
            .as_deref()
            .map(Self::new)
            .or_else(Self::in_user_cache_dir)
    }

    /// The cache directory.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Cache file used for `source`.
    pub fn entry_path(&self, source: &Utf8Path) -> Utf8PathBuf {
        let stem = source.file_stem().unwrap_or("vocab");
        self.dir
            .join(format!("{stem}-{:016x}.index.json", fnv1a(source.as_str())))
    }

    /// Load the cached index for `source`, or `None` if missing or stale.
    pub fn load(
        &self,
        source: &Utf8Path,
        lemmatizer: &str,
        accents: AccentPolicy,
    ) -> CacheResult<Option<VocabularyIndex>> {
        let path = self.entry_path(source);
        if !path.is_file() {
            return Ok(None);
        }
        let current = match SourceStamp::capture(source, lemmatizer.to_string(), accents) {
            Ok(stamp) => stamp,
            Err(_) => return Ok(None),
        };
        let file = File::open(path.as_std_path()).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        let entry: CacheEntry = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| CacheError::Json { path, source })?;
        if entry.format != CACHE_FORMAT || entry.stamp != current {
            tracing::debug!(source = %current.source, "cache entry is stale");
            return Ok(None);
        }
        Ok(Some(entry.index))
    }

    /// Write `index` as the cache entry for `source`.
    ///
    /// The entry is written to a temporary file and renamed into place.
    pub fn store(
        &self,
        source: &Utf8Path,
        lemmatizer: &str,
        accents: AccentPolicy,
        index: &VocabularyIndex,
    ) -> CacheResult<Utf8PathBuf> {
        let path = self.entry_path(source);
        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        let stamp =
            SourceStamp::capture(source, lemmatizer.to_string(), accents).map_err(io_err)?;
        std::fs::create_dir_all(self.dir.as_std_path()).map_err(io_err)?;

        let temp = NamedTempFile::new_in(self.dir.as_std_path()).map_err(io_err)?;
        let entry = CacheEntry {
            format: CACHE_FORMAT,
            stamp,
            index: index.clone(),
        };
        {
            let mut writer = BufWriter::new(&temp);
            serde_json::to_writer(&mut writer, &entry).map_err(|source| CacheError::Json {
                path: path.clone(),
                source,
            })?;
            writer.flush().map_err(io_err)?;
        }
        temp.persist(path.as_std_path())
            .map_err(|e| io_err(e.error))?;
        Ok(path)
    }

    /// Load `source` through the cache, rebuilding it when stale.
    ///
    /// Cache read and write failures are logged and otherwise ignored; only
    /// failures to build the index from `source` are returned.
    #[tracing::instrument(skip(self, lemmatizer, accents), fields(cache_dir = %self.dir))]
    pub fn load_or_build<L: Lemmatizer + ?Sized>(
        &self,
        source: &Utf8Path,
        lemmatizer: &L,
        accents: AccentPolicy,
    ) -> VocabResult<(VocabularyIndex, CacheStatus)> {
        let fingerprint = lemmatizer.fingerprint();
        match self.load(source, &fingerprint, accents) {
            Ok(Some(index)) => {
                tracing::info!(entries = index.len(), "vocabulary loaded from cache");
                return Ok((index, CacheStatus::Hit));
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable index cache"),
        }

        let index = VocabularyIndex::from_path(source, lemmatizer, accents)?;
        match self.store(source, &fingerprint, accents, &index) {
            Ok(path) => tracing::debug!(path = %path, "index cache written"),
            Err(err) => tracing::warn!(error = %err, "failed to write index cache"),
        }
        Ok((index, CacheStatus::Rebuilt))
    }

    /// Remove the cache entry for `source`, if any.
    pub fn invalidate(&self, source: &Utf8Path) -> CacheResult<bool> {
        let path = self.entry_path(source);
        match std::fs::remove_file(path.as_std_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }
}

pub(crate) const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

/// One FNV-1a round.
pub(crate) fn fnv1a_step(hash: u64, byte: u8) -> u64 {
    (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
}

/// 64-bit FNV-1a, stable across builds and platforms.
fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(FNV_OFFSET, fnv1a_step)
}
