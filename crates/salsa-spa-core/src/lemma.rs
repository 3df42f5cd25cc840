//! Lemmatization.
//!
//! The matcher and the vocabulary loader only see the [`Lemmatizer`] trait.
//! Two backends ship with the crate:
//!
//! - [`LookupLemmatizer`] maps each word through a `form,lemma` table, either
//!   the built-in Spanish table or one loaded from disk.
//! - [`IdentityLemmatizer`] returns its input with whitespace collapsed.
//!
//! [`CachedLemmatizer`] memoizes any backend. Lemmatizing is the dominant
//! per-request cost, since the matcher calls it once per window length at
//! every position.

use std::collections::HashMap;
use std::io::Read;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use camino::Utf8Path;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::cache::{FNV_OFFSET, fnv1a_step};
use crate::error::{LemmaError, LemmaResult};
use crate::text::{AccentPolicy, clean_word};

/// Built-in Spanish lemma table (`form,lemma`).
const BUILTIN_LEMMAS: &str = include_str!("../data/lemmas.csv");

/// Default number of phrases memoized by [`CachedLemmatizer`].
pub const DEFAULT_LEMMA_CACHE_SIZE: usize = 16_384;

/// Maps a word or multi-word phrase to its canonical form.
///
/// Implementations must be deterministic: the same input always yields the
/// same output. Multi-word input yields space-joined output.
pub trait Lemmatizer: Send + Sync {
    /// Lemmatize `text`.
    fn lemmatize(&self, text: &str) -> LemmaResult<String>;

    /// Identifies the lemmatizer configuration.
    ///
    /// Stored alongside cached vocabulary indices so an index built with one
    /// lemmatizer is never reused with another.
    fn fingerprint(&self) -> String;
}

/// Lemmatizer backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LemmatizerKind {
    /// Word-by-word table lookup (default).
    #[default]
    Lookup,
    /// No lemmatization; words match only in their surface form.
    Identity,
}

impl LemmatizerKind {
    /// Returns the backend name as used in configuration files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Identity => "identity",
        }
    }
}

/// Returns its input with runs of whitespace collapsed to single spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize(&self, text: &str) -> LemmaResult<String> {
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn fingerprint(&self) -> String {
        "identity".to_string()
    }
}

/// Table-driven lemmatizer.
///
/// Each whitespace-separated word is looked up independently; words missing
/// from the table are their own lemma.
#[derive(Debug, Clone)]
pub struct LookupLemmatizer {
    table: HashMap<String, String>,
    fingerprint: String,
}

#[derive(Debug, Deserialize)]
struct LemmaRow {
    form: String,
    lemma: String,
}

impl LookupLemmatizer {
    /// Build from the table embedded in the crate.
    pub fn builtin(accents: AccentPolicy) -> LemmaResult<Self> {
        let table = parse_table(BUILTIN_LEMMAS.as_bytes(), accents)?;
        Ok(Self {
            fingerprint: format!(
                "lookup:builtin:{:016x}:{}",
                table_digest(&table),
                accents.as_str()
            ),
            table,
        })
    }

    /// Load a `form,lemma` CSV table from disk.
    ///
    /// Fails with [`LemmaError::ModelUnavailable`] when the file cannot be
    /// opened.
    #[tracing::instrument(skip(accents))]
    pub fn from_path(path: &Utf8Path, accents: AccentPolicy) -> LemmaResult<Self> {
        let unavailable = |source| LemmaError::ModelUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path.as_std_path()).map_err(unavailable)?;
        let table = parse_table(file, accents)?;
        tracing::info!(entries = table.len(), "lemma table loaded");
        Ok(Self {
            fingerprint: format!(
                "lookup:{path}:{:016x}:{}",
                table_digest(&table),
                accents.as_str()
            ),
            table,
        })
    }

    /// Build from an in-memory list of `(form, lemma)` pairs.
    pub fn from_pairs<I, F, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, L)>,
        F: Into<String>,
        L: Into<String>,
    {
        let table: HashMap<String, String> = pairs
            .into_iter()
            .map(|(f, l)| (f.into(), l.into()))
            .collect();
        Self {
            fingerprint: format!("lookup:pairs:{:016x}", table_digest(&table)),
            table,
        }
    }

    /// Number of forms in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Lemmatizer for LookupLemmatizer {
    fn lemmatize(&self, text: &str) -> LemmaResult<String> {
        let lemmas: Vec<&str> = text
            .split_whitespace()
            .map(|word| self.table.get(word).map_or(word, String::as_str))
            .collect();
        Ok(lemmas.join(" "))
    }

    fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }
}

fn parse_table<R: Read>(reader: R, accents: AccentPolicy) -> LemmaResult<HashMap<String, String>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut table = HashMap::new();
    for result in rdr.deserialize::<LemmaRow>() {
        let row = result.map_err(|e| LemmaError::MalformedTable {
            line: e.position().map_or(0, csv::Position::line),
            message: e.to_string(),
        })?;
        let form = clean_word(&row.form, accents);
        let lemma = clean_word(&row.lemma, accents);
        if form.is_empty() || lemma.is_empty() {
            continue;
        }
        table.insert(form, lemma);
    }
    Ok(table)
}

/// Content digest of a lemma table, independent of insertion order.
fn table_digest(table: &HashMap<String, String>) -> u64 {
    let mut rows: Vec<(&String, &String)> = table.iter().collect();
    rows.sort_unstable();
    rows.iter().fold(FNV_OFFSET, |hash, (form, lemma)| {
        [form.as_bytes(), &b"\x1f"[..], lemma.as_bytes(), &b"\x1e"[..]]
            .into_iter()
            .flatten()
            .fold(hash, |h, b| fnv1a_step(h, *b))
    })
}

/// Memoizing wrapper around another lemmatizer.
///
/// The memo is a bounded LRU, so a long-lived grader holds at most
/// `capacity` phrases no matter how much distinct text it sees. A capacity
/// of 0 turns memoization off.
#[derive(Debug)]
pub struct CachedLemmatizer<L> {
    inner: L,
    memo: Option<Mutex<LruCache<String, String>>>,
}

impl<L: Lemmatizer> CachedLemmatizer<L> {
    /// Wrap `inner`, remembering up to `capacity` phrases.
    pub fn new(inner: L, capacity: usize) -> Self {
        Self {
            inner,
            memo: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Number of memoized phrases.
    pub fn cached(&self) -> usize {
        self.memo
            .as_ref()
            .map_or(0, |memo| memo.lock().unwrap_or_else(|e| e.into_inner()).len())
    }

    /// Maximum number of memoized phrases (0 when disabled).
    pub fn capacity(&self) -> usize {
        self.memo.as_ref().map_or(0, |memo| {
            memo.lock().unwrap_or_else(|e| e.into_inner()).cap().get()
        })
    }
}

impl<L: Lemmatizer> Lemmatizer for CachedLemmatizer<L> {
    fn lemmatize(&self, text: &str) -> LemmaResult<String> {
        let Some(memo) = &self.memo else {
            return self.inner.lemmatize(text);
        };
        if let Some(hit) = memo.lock().unwrap_or_else(|e| e.into_inner()).get(text) {
            return Ok(hit.clone());
        }
        // Lock released while the inner lemmatizer runs
        let lemma = self.inner.lemmatize(text)?;
        memo.lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(text.to_string(), lemma.clone());
        Ok(lemma)
    }

    fn fingerprint(&self) -> String {
        self.inner.fingerprint()
    }
}

/// Initialize the configured lemmatizer.
///
/// Call once at startup, before any grading. A configured `table` that cannot
/// be read is reported here rather than on first use. The lookup backend is
/// memoized with room for `cache_size` phrases (0 disables the memo).
#[tracing::instrument(skip_all, fields(kind = kind.as_str()))]
pub fn initialize(
    kind: LemmatizerKind,
    table: Option<&Utf8Path>,
    accents: AccentPolicy,
    cache_size: usize,
) -> LemmaResult<Arc<dyn Lemmatizer>> {
    let lemmatizer: Arc<dyn Lemmatizer> = match kind {
        LemmatizerKind::Identity => Arc::new(IdentityLemmatizer),
        LemmatizerKind::Lookup => {
            let lookup = match table {
                Some(path) => LookupLemmatizer::from_path(path, accents)?,
                None => LookupLemmatizer::builtin(accents)?,
            };
            Arc::new(CachedLemmatizer::new(lookup, cache_size))
        }
    };
    tracing::debug!(fingerprint = %lemmatizer.fingerprint(), "lemmatizer initialized");
    Ok(lemmatizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn identity_collapses_whitespace() {
        let lem = IdentityLemmatizer;
        assert_eq!(lem.lemmatize("  tener   en cuenta ").unwrap(), "tener en cuenta");
    }

    #[test]
    fn lookup_maps_each_word() {
        let lem = LookupLemmatizer::from_pairs([("tengo", "tener"), ("bailamos", "bailar")]);
        assert_eq!(lem.lemmatize("tengo en cuenta").unwrap(), "tener en cuenta");
        assert_eq!(lem.lemmatize("bailamos").unwrap(), "bailar");
        assert_eq!(lem.lemmatize("xyzabc").unwrap(), "xyzabc");
    }

    #[test]
    fn builtin_table_loads_and_folds_accents() {
        let lem = LookupLemmatizer::builtin(AccentPolicy::Strip).unwrap();
        assert!(!lem.is_empty());
        // "bailó" is stored accent-stripped under the strip policy
        assert_eq!(lem.lemmatize("bailo").unwrap(), "bailar");
    }

    #[test]
    fn from_path_reports_missing_model() {
        let err = LookupLemmatizer::from_path(
            Utf8Path::new("/definitely/not/here/lemmas.csv"),
            AccentPolicy::Strip,
        )
        .unwrap_err();
        assert!(matches!(err, LemmaError::ModelUnavailable { .. }));
    }

    #[test]
    fn from_path_reads_custom_table() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "form,lemma\nCanté,cantar\n").unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap();
        let lem = LookupLemmatizer::from_path(path, AccentPolicy::Strip).unwrap();
        assert_eq!(lem.len(), 1);
        assert_eq!(lem.lemmatize("cante").unwrap(), "cantar");
    }

    #[test]
    fn malformed_table_is_rejected() {
        let result = parse_table("form,lemma\nuno\n".as_bytes(), AccentPolicy::Strip);
        assert!(matches!(result, Err(LemmaError::MalformedTable { .. })));
    }

    struct Counting(AtomicUsize);

    impl Lemmatizer for Counting {
        fn lemmatize(&self, text: &str) -> LemmaResult<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_uppercase())
        }

        fn fingerprint(&self) -> String {
            "counting".to_string()
        }
    }

    #[test]
    fn cached_lemmatizer_calls_inner_once_per_phrase() {
        let cached = CachedLemmatizer::new(Counting(AtomicUsize::new(0)), 8);
        assert_eq!(cached.lemmatize("hola").unwrap(), "HOLA");
        assert_eq!(cached.lemmatize("hola").unwrap(), "HOLA");
        assert_eq!(cached.lemmatize("adios").unwrap(), "ADIOS");
        assert_eq!(cached.inner.0.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached(), 2);
        assert_eq!(cached.fingerprint(), "counting");
    }

    #[test]
    fn memo_never_exceeds_capacity() {
        let cached = CachedLemmatizer::new(IdentityLemmatizer, 64);
        for i in 0..10_000 {
            cached.lemmatize(&format!("palabra{i}")).unwrap();
            assert!(cached.cached() <= 64);
        }
        assert_eq!(cached.cached(), 64);
        assert_eq!(cached.capacity(), 64);
    }

    #[test]
    fn memo_evicts_least_recently_used() {
        let cached = CachedLemmatizer::new(Counting(AtomicUsize::new(0)), 2);
        cached.lemmatize("uno").unwrap();
        cached.lemmatize("dos").unwrap();
        cached.lemmatize("uno").unwrap();
        // "dos" is now the oldest and gets evicted
        cached.lemmatize("tres").unwrap();
        cached.lemmatize("uno").unwrap();
        assert_eq!(cached.inner.0.load(Ordering::SeqCst), 3);
        cached.lemmatize("dos").unwrap();
        assert_eq!(cached.inner.0.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn zero_capacity_disables_memo() {
        let cached = CachedLemmatizer::new(Counting(AtomicUsize::new(0)), 0);
        cached.lemmatize("hola").unwrap();
        cached.lemmatize("hola").unwrap();
        assert_eq!(cached.inner.0.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached(), 0);
        assert_eq!(cached.capacity(), 0);
    }

    #[test]
    fn fingerprint_tracks_table_contents() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap();

        std::fs::write(tmp.path(), "form,lemma
cante,cantar
").unwrap();
        let before = LookupLemmatizer::from_path(path, AccentPolicy::Strip).unwrap();
        // Same row count, rewritten immediately
        std::fs::write(tmp.path(), "form,lemma
cante,encantar
").unwrap();
        let after = LookupLemmatizer::from_path(path, AccentPolicy::Strip).unwrap();
        assert_ne!(before.fingerprint(), after.fingerprint());

        std::fs::write(tmp.path(), "form,lemma
cante,cantar
").unwrap();
        let again = LookupLemmatizer::from_path(path, AccentPolicy::Strip).unwrap();
        assert_eq!(before.fingerprint(), again.fingerprint());
    }

    #[test]
    fn pair_fingerprint_ignores_insertion_order() {
        let a = LookupLemmatizer::from_pairs([("tengo", "tener"), ("fui", "ir")]);
        let b = LookupLemmatizer::from_pairs([("fui", "ir"), ("tengo", "tener")]);
        let c = LookupLemmatizer::from_pairs([("tengo", "tener"), ("fui", "ser")]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn initialize_identity() {
        let lem = initialize(LemmatizerKind::Identity, None, AccentPolicy::Strip, 0).unwrap();
        assert_eq!(lem.fingerprint(), "identity");
    }

    #[test]
    fn initialize_missing_table_fails_fast() {
        let result = initialize(
            LemmatizerKind::Lookup,
            Some(Utf8Path::new("/no/such/table.csv")),
            AccentPolicy::Strip,
            DEFAULT_LEMMA_CACHE_SIZE,
        );
        assert!(matches!(result, Err(LemmaError::ModelUnavailable { .. })));
    }
}
