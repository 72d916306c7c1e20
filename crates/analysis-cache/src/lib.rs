//! Deduplicating TTL cache for the analysis pipeline.
//!
//! Three independent namespaces: fetched articles (content-keyed, for batch
//! dedup), per-symbol analysis results, and arbitrary keyed blobs. Entries
//! expire after a per-namespace TTL; persistence is optional and fail-open —
//! a broken cache file only costs redundant recompute, never a wrong result.

mod store;

use analysis_core::{AnalysisError, NewsArticle};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use store::Store;

/// Cache namespaces. TTLs are configured independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Namespace {
    Articles,
    Analysis,
    Blobs,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory for persisted namespaces; `None` keeps the cache in memory.
    pub cache_dir: Option<PathBuf>,
    pub articles_ttl_hours: i64,
    pub analysis_ttl_hours: i64,
    pub blobs_ttl_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        // 7-day retention matches the strategy's holding period: a symbol
        // scored this week should not be re-scored on every feed pass.
        Self {
            cache_dir: None,
            articles_ttl_hours: 168,
            analysis_ttl_hours: 168,
            blobs_ttl_hours: 168,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("CACHE_DIR") {
            if !dir.is_empty() {
                config.cache_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(hours) = std::env::var("CACHE_TTL_HOURS").ok().and_then(|s| s.parse().ok()) {
            config.articles_ttl_hours = hours;
            config.analysis_ttl_hours = hours;
            config.blobs_ttl_hours = hours;
        }
        config
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, ttl) in [
            ("articles", self.articles_ttl_hours),
            ("analysis", self.analysis_ttl_hours),
            ("blobs", self.blobs_ttl_hours),
        ] {
            if ttl <= 0 {
                return Err(AnalysisError::Configuration(format!(
                    "{} TTL must be positive, got {}",
                    name, ttl
                )));
            }
        }
        Ok(())
    }
}

/// Live-entry counts per namespace (expired entries swept first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub articles: usize,
    pub analysis: usize,
    pub blobs: usize,
    pub articles_ttl_hours: i64,
    pub analysis_ttl_hours: i64,
    pub blobs_ttl_hours: i64,
}

/// Content-based article key: the same article re-fetched from a different
/// feed pass still hashes identically.
pub fn article_key(article: &NewsArticle) -> String {
    let mut hasher = Sha256::new();
    hasher.update(article.url.as_bytes());
    hasher.update(b"\n");
    hasher.update(article.title.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct AnalysisCache {
    config: CacheConfig,
    articles: Store<NewsArticle>,
    analysis: Store<serde_json::Value>,
    blobs: Store<serde_json::Value>,
}

impl AnalysisCache {
    pub fn new(config: CacheConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let dir = config.cache_dir.as_ref();
        let cache = Self {
            articles: Store::new("articles", Duration::hours(config.articles_ttl_hours), dir),
            analysis: Store::new("analysis", Duration::hours(config.analysis_ttl_hours), dir),
            blobs: Store::new("blobs", Duration::hours(config.blobs_ttl_hours), dir),
            config,
        };
        tracing::info!("Analysis cache initialized");
        Ok(cache)
    }

    /// Partition a fetched batch into already-seen and new articles,
    /// caching the new subset. Calling twice with the same batch returns
    /// everything the first time and nothing the second.
    pub fn dedupe_new_articles(&self, batch: &[NewsArticle]) -> Vec<NewsArticle> {
        let mut new_articles = Vec::new();
        for article in batch {
            let key = article_key(article);
            if self.articles.contains_live(&key) {
                tracing::debug!("Article already cached: {}", article.title);
            } else {
                self.articles.insert_only(key, article.clone());
                new_articles.push(article.clone());
            }
        }
        self.articles.persist();
        tracing::info!(
            "Cached {} new articles out of {} fetched",
            new_articles.len(),
            batch.len()
        );
        new_articles
    }

    pub fn put_analysis(&self, symbol: &str, value: serde_json::Value) {
        self.analysis.put(symbol.to_uppercase(), value);
    }

    pub fn get_analysis(&self, symbol: &str) -> Option<serde_json::Value> {
        self.analysis.get(&symbol.to_uppercase())
    }

    pub fn put_blob(&self, key: &str, value: serde_json::Value) {
        self.blobs.put(key.to_string(), value);
    }

    pub fn get_blob(&self, key: &str) -> Option<serde_json::Value> {
        self.blobs.get(key)
    }

    pub fn sweep_expired(&self, namespace: Namespace) -> usize {
        match namespace {
            Namespace::Articles => self.articles.sweep_expired(),
            Namespace::Analysis => self.analysis.sweep_expired(),
            Namespace::Blobs => self.blobs.sweep_expired(),
        }
    }

    pub fn clear(&self, namespace: Namespace) {
        match namespace {
            Namespace::Articles => self.articles.clear(),
            Namespace::Analysis => self.analysis.clear(),
            Namespace::Blobs => self.blobs.clear(),
        }
    }

    pub fn clear_all(&self) {
        self.articles.clear();
        self.analysis.clear();
        self.blobs.clear();
    }

    pub fn stats(&self) -> CacheStats {
        // Sweep first so reported counts only cover live entries
        self.articles.sweep_expired();
        self.analysis.sweep_expired();
        self.blobs.sweep_expired();
        CacheStats {
            articles: self.articles.len(),
            analysis: self.analysis.len(),
            blobs: self.blobs.len(),
            articles_ttl_hours: self.config.articles_ttl_hours,
            analysis_ttl_hours: self.config.analysis_ttl_hours,
            blobs_ttl_hours: self.config.blobs_ttl_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(title: &str, url: &str) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            url: url.to_string(),
            source: "feed".to_string(),
            published_at: None,
            summary: None,
            symbols: vec![],
        }
    }

    fn cache() -> AnalysisCache {
        AnalysisCache::new(CacheConfig::default()).unwrap()
    }

    #[test]
    fn dedupe_is_idempotent() {
        let cache = cache();
        let batch = vec![
            article("RBI cuts rates", "https://news.example/a"),
            article("TCS wins contract", "https://news.example/b"),
        ];

        let first = cache.dedupe_new_articles(&batch);
        assert_eq!(first.len(), 2);

        let second = cache.dedupe_new_articles(&batch);
        assert!(second.is_empty());
    }

    #[test]
    fn dedupe_recognizes_same_content_across_passes() {
        let cache = cache();
        cache.dedupe_new_articles(&[article("Q1 results", "https://news.example/q1")]);

        // Same URL and title, re-fetched with different incidental fields
        let mut repeat = article("Q1 results", "https://news.example/q1");
        repeat.source = "other-feed".to_string();
        repeat.summary = Some("expanded".to_string());
        assert!(cache.dedupe_new_articles(&[repeat]).is_empty());
    }

    #[test]
    fn distinct_content_gets_distinct_keys() {
        let a = article("Title", "https://x/1");
        let b = article("Title", "https://x/2");
        assert_ne!(article_key(&a), article_key(&b));
    }

    #[test]
    fn analysis_namespace_uppercases_symbols() {
        let cache = cache();
        cache.put_analysis("tcs", json!({"composite": 0.61}));
        assert_eq!(cache.get_analysis("TCS"), Some(json!({"composite": 0.61})));
    }

    #[test]
    fn namespaces_are_independent() {
        let cache = cache();
        cache.put_analysis("TCS", json!(1));
        cache.put_blob("market_trend", json!("bullish"));

        cache.clear(Namespace::Analysis);
        assert!(cache.get_analysis("TCS").is_none());
        assert_eq!(cache.get_blob("market_trend"), Some(json!("bullish")));
    }

    #[test]
    fn stats_reports_live_counts() {
        let cache = cache();
        cache.dedupe_new_articles(&[article("A", "https://x/a")]);
        cache.put_blob("k", json!(null));

        let stats = cache.stats();
        assert_eq!(stats.articles, 1);
        assert_eq!(stats.analysis, 0);
        assert_eq!(stats.blobs, 1);
        assert_eq!(stats.articles_ttl_hours, 168);
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let config = CacheConfig {
            analysis_ttl_hours: 0,
            ..CacheConfig::default()
        };
        assert!(matches!(
            AnalysisCache::new(config),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn corrupt_cache_file_degrades_to_empty() {
        let dir = std::env::temp_dir().join(format!("analysis-cache-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("blobs.json"), b"not json at all").unwrap();

        let cache = AnalysisCache::new(CacheConfig {
            cache_dir: Some(dir.clone()),
            ..CacheConfig::default()
        })
        .unwrap();
        assert!(cache.get_blob("anything").is_none());

        // Still writable after the failed load
        cache.put_blob("k", json!(42));
        assert_eq!(cache.get_blob("k"), Some(json!(42)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn persisted_entries_survive_reconstruction() {
        let dir = std::env::temp_dir().join(format!(
            "analysis-cache-persist-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let config = CacheConfig {
            cache_dir: Some(dir.clone()),
            ..CacheConfig::default()
        };

        {
            let cache = AnalysisCache::new(config.clone()).unwrap();
            cache.put_analysis("INFY", json!({"composite": 0.44}));
        }

        let reopened = AnalysisCache::new(config).unwrap();
        assert_eq!(
            reopened.get_analysis("INFY"),
            Some(json!({"composite": 0.44}))
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
