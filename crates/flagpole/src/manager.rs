//! # Flag Manager
//!
//! Orchestrates rule loading, per-request evaluation and default fallback.
//!
//! ## Resolution order
//!
//! For `single(key, default)`:
//!
//! 1. a flag loaded from the rule set (its rules evaluated against the
//!    current context) always wins,
//! 2. then the per-call default,
//! 3. then the manager's [`DefaultsCollection`],
//! 4. otherwise [`FlagpoleError::FlagNotFound`].
//!
//! ## Configured variants
//!
//! [`FlagManager::with_context`] and [`FlagManager::with_defaults`] return
//! new manager instances; nothing is mutated in place, so differently
//! configured managers can be held concurrently. Variants share the
//! loaded-rules slot and the cache/fetch collaborators, so a refresh
//! through one is visible to its siblings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::cache::{FilesystemCache, FlagCache, MemoryCache, NullCache};
use crate::config::{CacheBackend, Config};
use crate::engine;
use crate::error::FlagpoleError;
use crate::fetch::{HttpFetcher, RuleFetcher};
use crate::model::{Context, DefaultsCollection, Flag, FlagValue, RuleSet};

/// Fixed cache key the serialized rule-set document is stored under.
pub const RULES_CACHE_KEY: &str = "rules";

/// Root client object: loads rules (cache first, then remote), evaluates
/// flags against the current context and reports usage.
#[derive(Debug, Clone)]
pub struct FlagManager {
    fetcher: Arc<dyn RuleFetcher>,
    cache: Arc<dyn FlagCache>,
    cache_ttl: Duration,
    report_usage_enabled: bool,
    flags: Arc<RwLock<Option<Vec<Flag>>>>,
    context: Context,
    defaults: DefaultsCollection,
}

impl FlagManager {
    /// Wires a manager from a validated [`Config`]: picks the cache backend
    /// and builds the HTTP fetcher for the configured environment.
    pub fn new(config: Config) -> Result<Self, FlagpoleError> {
        let cache: Arc<dyn FlagCache> = match config.cache_backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Filesystem => {
                let dir = config.cache_dir.as_ref().ok_or_else(|| {
                    FlagpoleError::Config(
                        "the filesystem cache backend requires a cache directory".to_string(),
                    )
                })?;
                Arc::new(FilesystemCache::new(dir))
            }
            CacheBackend::Null => Arc::new(NullCache::new()),
        };
        let fetcher = Arc::new(HttpFetcher::new(&config.api_url, &config.token)?);
        Ok(Self::with_collaborators(
            fetcher,
            cache,
            config.cache_ttl,
            config.report_usage,
        ))
    }

    /// Assembles a manager from explicit collaborators.
    pub fn with_collaborators(
        fetcher: Arc<dyn RuleFetcher>,
        cache: Arc<dyn FlagCache>,
        cache_ttl: Duration,
        report_usage: bool,
    ) -> Self {
        FlagManager {
            fetcher,
            cache,
            cache_ttl,
            report_usage_enabled: report_usage,
            flags: Arc::new(RwLock::new(None)),
            context: Context::default(),
            defaults: DefaultsCollection::new(),
        }
    }

    /// A copy of this manager evaluating against `context`. The original is
    /// untouched.
    pub fn with_context(&self, context: Context) -> Self {
        FlagManager {
            context,
            ..self.clone()
        }
    }

    /// A copy of this manager with `defaults` as its fallback collection.
    /// The original is untouched.
    pub fn with_defaults(&self, defaults: DefaultsCollection) -> Self {
        FlagManager {
            defaults,
            ..self.clone()
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn defaults(&self) -> &DefaultsCollection {
        &self.defaults
    }

    /// Loads rules if they have not been loaded yet: cache first, remote on
    /// a miss. An unreadable cached document falls through to the remote
    /// load. Idempotent once rules are in memory.
    pub async fn ensure_rules_loaded(&self) -> Result<(), FlagpoleError> {
        if self.flags.read().await.is_some() {
            return Ok(());
        }
        if let Some(raw) = self.cache.get(RULES_CACHE_KEY).await {
            match RuleSet::parse(&raw) {
                Ok(document) => {
                    debug!(
                        flags = document.flags.len(),
                        version = %document.version,
                        "loaded rules from cache"
                    );
                    *self.flags.write().await = Some(document.flags);
                    return Ok(());
                }
                Err(error) => {
                    warn!(%error, "cached rules are unreadable, falling back to remote");
                }
            }
        }
        self.load_rules_from_api().await
    }

    /// Unconditionally reloads from the remote source, bypassing the cache
    /// read but still writing through on success.
    pub async fn refresh_rules(&self) -> Result<(), FlagpoleError> {
        self.load_rules_from_api().await
    }

    async fn load_rules_from_api(&self) -> Result<(), FlagpoleError> {
        match self.fetcher.get_rules().await {
            Ok(fetched) => {
                self.cache
                    .set(RULES_CACHE_KEY, &fetched.raw, Some(self.cache_ttl))
                    .await;
                *self.flags.write().await = Some(fetched.document.flags);
                Ok(())
            }
            Err(error) => {
                // a failed load still transitions to loaded, with an empty list
                *self.flags.write().await = Some(Vec::new());
                Err(error)
            }
        }
    }

    /// Resolves one flag by key against the current context.
    #[instrument(skip(self, default), fields(flag_key = %key))]
    pub async fn single(
        &self,
        key: &str,
        default: Option<FlagValue>,
    ) -> Result<Flag, FlagpoleError> {
        self.ensure_rules_loaded().await?;

        let loaded = {
            let flags = self.flags.read().await;
            flags
                .as_ref()
                .and_then(|list| list.iter().find(|flag| flag.key == key))
                .cloned()
        };
        if let Some(flag) = loaded {
            self.report_usage(key, Some(self.context.clone()));
            return Ok(self.evaluate_flag(&flag));
        }

        if let Some(value) = default {
            self.report_usage(key, Some(self.context.clone()));
            return Ok(Flag::synthesized(key, value));
        }

        if let Some(value) = self.defaults.get(key) {
            self.report_usage(key, Some(self.context.clone()));
            return Ok(Flag::synthesized(key, value.clone()));
        }

        Err(FlagpoleError::FlagNotFound(key.to_string()))
    }

    /// Evaluates every loaded flag against the current context, in load
    /// order.
    pub async fn all(&self) -> Result<Vec<Flag>, FlagpoleError> {
        self.ensure_rules_loaded().await?;
        let flags = self.flags.read().await;
        Ok(flags
            .as_ref()
            .map(|list| list.iter().map(|flag| self.evaluate_flag(flag)).collect())
            .unwrap_or_default())
    }

    fn evaluate_flag(&self, flag: &Flag) -> Flag {
        if flag.rules.is_empty() {
            return flag.clone();
        }
        match engine::evaluate(&flag.rules, &self.context) {
            Some(rule) => flag.with_target_value(rule.value.clone()),
            // the baseline target stands as the implicit default rule
            None => flag.clone(),
        }
    }

    /// Fires a usage report without awaiting it. Reporting failures are
    /// logged and swallowed; they never affect flag evaluation.
    pub fn report_usage(&self, key: &str, context: Option<Context>) {
        if !self.report_usage_enabled {
            return;
        }
        let fetcher = Arc::clone(&self.fetcher);
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(error) = fetcher.report_usage(&key, context.as_ref()).await {
                debug!(flag_key = %key, %error, "usage report failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct StaticFetcher {
        raw: String,
        fetches: AtomicUsize,
        usage_reports: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(document: serde_json::Value) -> Self {
            StaticFetcher {
                raw: document.to_string(),
                fetches: AtomicUsize::new(0),
                usage_reports: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RuleFetcher for StaticFetcher {
        async fn get_rules(&self) -> Result<crate::fetch::FetchedRules, FlagpoleError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(crate::fetch::FetchedRules {
                raw: self.raw.clone(),
                document: RuleSet::parse(&self.raw)?,
            })
        }

        async fn report_usage(
            &self,
            _key: &str,
            _context: Option<&Context>,
        ) -> Result<(), FlagpoleError> {
            self.usage_reports.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingFetcher;

    #[async_trait]
    impl RuleFetcher for FailingFetcher {
        async fn get_rules(&self) -> Result<crate::fetch::FetchedRules, FlagpoleError> {
            Err(FlagpoleError::fetch("distribution unreachable", Some(503)))
        }

        async fn report_usage(
            &self,
            _key: &str,
            _context: Option<&Context>,
        ) -> Result<(), FlagpoleError> {
            Ok(())
        }
    }

    fn country_gated_document() -> serde_json::Value {
        serde_json::json!({
            "version": "1",
            "flags": [{
                "version": "1",
                "type": "boolean",
                "key": "checkout",
                "name": "New checkout",
                "target": {"value": {"value": {"boolean": false}}},
                "rules": [{
                    "clauses": [
                        {"attribute": "country", "operator": "equals", "value": "US"}
                    ],
                    "value": {"value": {"boolean": true}}
                }]
            }]
        })
    }

    fn manager_over(fetcher: Arc<dyn RuleFetcher>) -> FlagManager {
        FlagManager::with_collaborators(
            fetcher,
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
            true,
        )
    }

    #[tokio::test]
    async fn test_rule_match_overrides_target() {
        let manager = manager_over(Arc::new(StaticFetcher::new(country_gated_document())));

        let us = manager.with_context(Context::new("user").with_attribute("country", ["US"]));
        assert!(us.single("checkout", None).await.unwrap().is_enabled());

        let ca = manager.with_context(Context::new("user").with_attribute("country", ["CA"]));
        assert!(!ca.single("checkout", None).await.unwrap().is_enabled());
    }

    #[tokio::test]
    async fn test_default_priority_order() {
        let manager = manager_over(Arc::new(StaticFetcher::new(serde_json::json!({
            "version": "1",
            "flags": []
        }))))
        .with_defaults(DefaultsCollection::new().with("x", "B"));

        let per_call = manager
            .single("x", Some(FlagValue::String("A".to_string())))
            .await
            .unwrap();
        assert_eq!(per_call.as_string(), Some("A".to_string()));

        let from_collection = manager.single("x", None).await.unwrap();
        assert_eq!(from_collection.as_string(), Some("B".to_string()));

        assert!(matches!(
            manager.single("y", None).await,
            Err(FlagpoleError::FlagNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_loaded_flag_beats_both_default_sources() {
        let manager = manager_over(Arc::new(StaticFetcher::new(serde_json::json!({
            "version": "1",
            "flags": [{
                "version": "1",
                "type": "string",
                "key": "x",
                "name": "x",
                "target": {"value": {"value": {"string": "loaded"}}}
            }]
        }))))
        .with_defaults(DefaultsCollection::new().with("x", "B"));

        let flag = manager
            .single("x", Some(FlagValue::String("A".to_string())))
            .await
            .unwrap();
        assert_eq!(flag.as_string(), Some("loaded".to_string()));
    }

    #[tokio::test]
    async fn test_ensure_loaded_is_idempotent_and_cache_backed() {
        let fetcher = Arc::new(StaticFetcher::new(country_gated_document()));
        let cache = Arc::new(MemoryCache::new());
        let manager = FlagManager::with_collaborators(
            fetcher.clone(),
            cache.clone(),
            Duration::from_secs(60),
            false,
        );

        manager.single("checkout", None).await.unwrap();
        manager.single("checkout", None).await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);

        // a fresh manager over the same cache loads without fetching
        let warm = FlagManager::with_collaborators(
            fetcher.clone(),
            cache,
            Duration::from_secs(60),
            false,
        );
        warm.single("checkout", None).await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_remote() {
        let fetcher = Arc::new(StaticFetcher::new(country_gated_document()));
        let cache = Arc::new(MemoryCache::new());
        cache.set(RULES_CACHE_KEY, "{corrupt", None).await;

        let manager = FlagManager::with_collaborators(
            fetcher.clone(),
            cache.clone(),
            Duration::from_secs(60),
            false,
        );
        manager.ensure_rules_loaded().await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
        // write-through replaced the corrupt entry
        assert!(RuleSet::parse(&cache.get(RULES_CACHE_KEY).await.unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_failed_load_leaves_empty_flags_and_propagates() {
        let manager = manager_over(Arc::new(FailingFetcher))
            .with_defaults(DefaultsCollection::new().with("x", true));

        assert!(matches!(
            manager.single("x", None).await,
            Err(FlagpoleError::FetchRules { status: Some(503), .. })
        ));

        // flags are now loaded-but-empty, so defaults serve without refetch
        let flag = manager.single("x", None).await.unwrap();
        assert!(flag.is_enabled());
        assert!(manager.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache_read() {
        let fetcher = Arc::new(StaticFetcher::new(country_gated_document()));
        let manager = manager_over(fetcher.clone());

        manager.ensure_rules_loaded().await.unwrap();
        manager.refresh_rules().await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_preserves_load_order() {
        let manager = manager_over(Arc::new(StaticFetcher::new(serde_json::json!({
            "version": "1",
            "flags": [
                {
                    "version": "1", "type": "number", "key": "b", "name": "b",
                    "target": {"value": {"value": {"number": 2}}}
                },
                {
                    "version": "1", "type": "number", "key": "a", "name": "a",
                    "target": {"value": {"value": {"number": 1}}}
                }
            ]
        }))));

        let all = manager.all().await.unwrap();
        assert_eq!(
            all.iter().map(|f| f.key.as_str()).collect::<Vec<_>>(),
            ["b", "a"]
        );
    }

    #[tokio::test]
    async fn test_variants_share_loaded_rules() {
        let fetcher = Arc::new(StaticFetcher::new(country_gated_document()));
        let base = manager_over(fetcher.clone());
        let us = base.with_context(Context::new("user").with_attribute("country", ["US"]));

        base.ensure_rules_loaded().await.unwrap();
        us.single("checkout", None).await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);

        // and the variant's context did not leak back
        assert!(base.context().attributes.is_empty());
    }

    #[tokio::test]
    async fn test_usage_reports_fire_per_resolution() {
        let fetcher = Arc::new(StaticFetcher::new(country_gated_document()));
        let manager = manager_over(fetcher.clone())
            .with_defaults(DefaultsCollection::new().with("absent", 5.0));

        manager.single("checkout", None).await.unwrap();
        manager.single("absent", None).await.unwrap();
        // fire-and-forget: give the spawned tasks a tick to land
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.usage_reports.load(Ordering::SeqCst), 2);
    }
}
