use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::{ModelIntelError, Result};
use crate::pricing::PricingPage;
use crate::source::{Document, DocumentSource, PricingSource};

/// Return the cache directory for model-intel data files.
/// Creates it if it doesn't exist.
pub fn cache_dir() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("model-intel");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).ok()?;
    }
    Some(dir)
}

/// Files under one directory, fresh for `ttl` after they were written.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entry file for `key`: the hex SHA-256 of the key, so names stay the
    /// same across builds and never exceed filesystem limits.
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{:x}.cache", Sha256::digest(key.as_bytes())))
    }

    /// When `key` was last written, if it is cached at all.
    pub fn written_at(&self, key: &str) -> Option<SystemTime> {
        std::fs::metadata(self.path_for(key)).ok()?.modified().ok()
    }

    /// Cached contents for `key`, unless missing or older than the TTL.
    pub fn get(&self, key: &str) -> Option<String> {
        let written = self.written_at(key)?;
        let age = written.elapsed().unwrap_or(Duration::ZERO);
        if age >= self.ttl {
            return None;
        }
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    pub fn put(&self, key: &str, contents: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ModelIntelError::Io(format!("failed to create {}: {e}", self.dir.display())))?;
        std::fs::write(self.path_for(key), contents)
            .map_err(|e| ModelIntelError::Io(format!("failed to write cache entry: {e}")))
    }

    /// Remove every cached entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(ModelIntelError::Io(e.to_string())),
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "cache") {
                std::fs::remove_file(&path).map_err(|e| ModelIntelError::Io(e.to_string()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// A document source memoized through a [`DiskCache`].
pub struct CachedDocuments<S> {
    inner: S,
    cache: DiskCache,
}

impl<S: DocumentSource> CachedDocuments<S> {
    pub fn new(inner: S, cache: DiskCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }
}

impl<S: DocumentSource> DocumentSource for CachedDocuments<S> {
    async fn fetch_document(&self, url: &str) -> Result<String> {
        if let Some(text) = self.cache.get(url) {
            tracing::debug!(url, "document cache hit");
            return Ok(text);
        }
        let text = self.inner.fetch_document(url).await?;
        if let Err(e) = self.cache.put(url, &text) {
            tracing::warn!(error = %e, "could not cache document");
        }
        Ok(text)
    }
}

/// Outcome of [`refresh_documents`].
#[derive(Debug, Default)]
pub struct RefreshResult {
    pub cleared: usize,
    pub fetched: Vec<Document>,
    pub failed: Vec<(Document, String)>,
}

/// Drop every cached entry, then fetch the three Learn pages again.
pub async fn refresh_documents<S: DocumentSource>(
    docs: &CachedDocuments<S>,
    config: &Config,
) -> Result<RefreshResult> {
    let cleared = docs.cache.clear()?;

    // All three in parallel.
    let (retirements, availability, whats_new) = tokio::join!(
        docs.fetch_document(Document::Retirements.url(config)),
        docs.fetch_document(Document::Availability.url(config)),
        docs.fetch_document(Document::WhatsNew.url(config)),
    );

    let mut result = RefreshResult {
        cleared,
        ..Default::default()
    };
    for (doc, outcome) in [
        (Document::Retirements, retirements),
        (Document::Availability, availability),
        (Document::WhatsNew, whats_new),
    ] {
        match outcome {
            Ok(_) => result.fetched.push(doc),
            Err(e) => {
                tracing::warn!(?doc, error = %e, "refresh fetch failed");
                result.failed.push((doc, e.to_string()));
            }
        }
    }
    Ok(result)
}

/// A pricing source whose pages are memoized through a [`DiskCache`].
pub struct CachedPricing<S> {
    inner: S,
    cache: DiskCache,
}

impl<S: PricingSource> CachedPricing<S> {
    pub fn new(inner: S, cache: DiskCache) -> Self {
        Self { inner, cache }
    }
}

impl<S: PricingSource> PricingSource for CachedPricing<S> {
    async fn pricing_page(&self, region: Option<&str>, cursor: Option<&str>) -> Result<PricingPage> {
        let key = format!(
            "pricing|{}|{}",
            region.unwrap_or("*"),
            cursor.unwrap_or("")
        );
        if let Some(page) = self
            .cache
            .get(&key)
            .and_then(|s| serde_json::from_str::<PricingPage>(&s).ok())
        {
            tracing::debug!(key = %key, "pricing cache hit");
            return Ok(page);
        }
        let page = self.inner.pricing_page(region, cursor).await?;
        match serde_json::to_string(&page) {
            Ok(json) => {
                if let Err(e) = self.cache.put(&key, &json) {
                    tracing::warn!(error = %e, "could not cache pricing page");
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not serialize pricing page"),
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDocs(AtomicUsize);

    impl DocumentSource for CountingDocs {
        async fn fetch_document(&self, url: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("body of {url}"))
        }
    }

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Duration::from_secs(60));
        assert!(cache.get("k").is_none());
        cache.put("k", "v").unwrap();
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert!(cache.written_at("k").is_some());
    }

    #[test]
    fn entry_names_are_stable() {
        let cache = DiskCache::new("/tmp/model-intel-test", Duration::from_secs(60));
        assert_eq!(
            cache.path_for("abc"),
            Path::new("/tmp/model-intel-test")
                .join("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.cache")
        );
        let long_key = format!("pricing|*|https://prices.azure.com/api/retail/prices?{}", "x".repeat(400));
        let name = cache.path_for(&long_key);
        assert_eq!(name.file_name().unwrap().len(), 64 + ".cache".len());
    }

    #[test]
    fn zero_ttl_never_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Duration::ZERO);
        cache.put("k", "v").unwrap();
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Duration::from_secs(60));
        cache.put("a", "1").unwrap();
        cache.put("b", "2").unwrap();
        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn clear_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("nope"), Duration::from_secs(60));
        assert_eq!(cache.clear().unwrap(), 0);
    }

    struct FlakyDocs;

    impl DocumentSource for FlakyDocs {
        async fn fetch_document(&self, url: &str) -> Result<String> {
            if url.contains("whats-new") {
                Err(ModelIntelError::Http("timed out".into()))
            } else {
                Ok("# page".into())
            }
        }
    }

    #[tokio::test]
    async fn refresh_clears_and_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), Duration::from_secs(60));
        cache.put("stale", "old").unwrap();
        let docs = CachedDocuments::new(FlakyDocs, cache.clone());

        let config = Config::default();
        let result = refresh_documents(&docs, &config).await.unwrap();
        assert_eq!(result.cleared, 1);
        assert_eq!(result.fetched, vec![Document::Retirements, Document::Availability]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, Document::WhatsNew);
        assert!(cache.get("stale").is_none());
        assert!(cache.get(Document::Retirements.url(&config)).is_some());
    }

    #[tokio::test]
    async fn cached_documents_fetch_once() {
        let dir = tempfile::tempdir().unwrap();
        let docs = CachedDocuments::new(
            CountingDocs(AtomicUsize::new(0)),
            DiskCache::new(dir.path(), Duration::from_secs(60)),
        );
        let a = docs.fetch_document("https://x/a").await.unwrap();
        let b = docs.fetch_document("https://x/a").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(docs.inner.0.load(Ordering::SeqCst), 1);
        assert_eq!(docs.cache().get("https://x/a").as_deref(), Some("body of https://x/a"));

        docs.fetch_document("https://x/b").await.unwrap();
        assert_eq!(docs.inner.0.load(Ordering::SeqCst), 2);
    }
}
