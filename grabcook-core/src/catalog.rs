//! Ingredient catalog with a short-lived local cache.
//!
//! The catalog is reference data that changes rarely, so a successful fetch
//! is kept in storage for [`CACHE_TTL`]. When the network fails the caller
//! still gets a usable built-in list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::api::RecipeApi;
use crate::error::ApiError;
use crate::storage::{self, KeyValueStore, INGREDIENTS_CACHE_KEY};
use crate::types::{CatalogIngredient, IngredientQuery, UnitType};

/// How long a fetched catalog stays valid.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Page size used when downloading the whole catalog.
pub const FETCH_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched in one load.
const MAX_PAGES: u32 = 50;

pub const FETCH_FAILED_MESSAGE: &str =
    "Nie udało się pobrać listy składników. Wyświetlono listę domyślną.";

/// Catalog as stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCatalog {
    pub ingredients: Vec<CatalogIngredient>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedCatalog {
    /// Fresh while younger than `ttl`. Timestamps in the future count as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .map(|age| age < ttl)
            .unwrap_or(false)
    }
}

/// Where a loaded catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Cache,
    Network,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub ingredients: Vec<CatalogIngredient>,
    pub source: CatalogSource,
    /// User-facing message when the fallback list is in use.
    pub error: Option<String>,
}

pub struct IngredientCatalog<A: RecipeApi, S: KeyValueStore> {
    api: Arc<A>,
    store: Arc<S>,
}

impl<A: RecipeApi, S: KeyValueStore> IngredientCatalog<A, S> {
    pub fn new(api: Arc<A>, store: Arc<S>) -> Self {
        Self { api, store }
    }

    /// Serve from cache when fresh, otherwise fetch (falling back on failure).
    pub async fn load(&self) -> CatalogLoad {
        if let Some(cached) = self.read_cache() {
            tracing::debug!(count = cached.len(), "ingredient catalog: cache hit");
            return CatalogLoad {
                ingredients: cached,
                source: CatalogSource::Cache,
                error: None,
            };
        }
        tracing::debug!("ingredient catalog: cache miss");
        self.fetch_and_store().await
    }

    /// Ignore the cache and fetch again.
    pub async fn refetch(&self) -> CatalogLoad {
        self.fetch_and_store().await
    }

    fn read_cache(&self) -> Option<Vec<CatalogIngredient>> {
        let cached: CachedCatalog = match storage::get_json(&*self.store, INGREDIENTS_CACHE_KEY) {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "ingredient catalog: unreadable cache");
                return None;
            }
        };

        if cached.is_fresh(Utc::now(), CACHE_TTL) {
            Some(cached.ingredients)
        } else {
            tracing::debug!(fetched_at = %cached.fetched_at, "ingredient catalog: cache expired");
            None
        }
    }

    async fn fetch_and_store(&self) -> CatalogLoad {
        match self.fetch_all().await {
            Ok(ingredients) => {
                let entry = CachedCatalog {
                    ingredients,
                    fetched_at: Utc::now(),
                };
                if let Err(e) = storage::set_json(&*self.store, INGREDIENTS_CACHE_KEY, &entry) {
                    tracing::warn!(error = %e, "ingredient catalog: failed to write cache");
                }
                CatalogLoad {
                    ingredients: entry.ingredients,
                    source: CatalogSource::Network,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "ingredient catalog: fetch failed, using fallback list");
                CatalogLoad {
                    ingredients: fallback_ingredients(),
                    source: CatalogSource::Fallback,
                    error: Some(FETCH_FAILED_MESSAGE.to_string()),
                }
            }
        }
    }

    async fn fetch_all(&self) -> Result<Vec<CatalogIngredient>, ApiError> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let query = IngredientQuery {
                search: None,
                page,
                limit: FETCH_PAGE_SIZE,
            };
            let result = self.api.list_ingredients(&query).await?;
            let done = result.data.is_empty()
                || page >= result.pagination.total_pages
                || page >= MAX_PAGES;
            all.extend(result.data);
            if done {
                break;
            }
            page += 1;
        }
        tracing::debug!(count = all.len(), pages = page, "ingredient catalog: fetched");
        Ok(all)
    }
}

/// Case-insensitive name filter for type-ahead.
pub fn filter_ingredients<'a>(
    ingredients: &'a [CatalogIngredient],
    term: &str,
) -> Vec<&'a CatalogIngredient> {
    let term = term.trim().to_lowercase();
    ingredients
        .iter()
        .filter(|i| term.is_empty() || i.name.to_lowercase().contains(&term))
        .collect()
}

/// Built-in list used when the catalog cannot be fetched.
pub fn fallback_ingredients() -> Vec<CatalogIngredient> {
    const FALLBACK: &[(&str, &str, UnitType)] = &[
        ("1", "Mąka pszenna", UnitType::G),
        ("2", "Cukier", UnitType::G),
        ("3", "Sól", UnitType::G),
        ("4", "Jajka", UnitType::Szt),
        ("5", "Mleko", UnitType::Ml),
        ("6", "Masło", UnitType::G),
        ("7", "Olej", UnitType::Ml),
        ("8", "Cebula", UnitType::Szt),
        ("9", "Czosnek", UnitType::Szt),
        ("10", "Pomidory", UnitType::Szt),
        ("11", "Ziemniaki", UnitType::G),
        ("12", "Marchew", UnitType::Szt),
        ("13", "Ryż", UnitType::G),
        ("14", "Makaron", UnitType::G),
        ("15", "Pierś z kurczaka", UnitType::G),
        ("16", "Ser żółty", UnitType::G),
        ("17", "Śmietana", UnitType::Ml),
        ("18", "Woda", UnitType::Ml),
    ];

    FALLBACK
        .iter()
        .map(|(id, name, unit)| CatalogIngredient {
            id: id.to_string(),
            name: name.to_string(),
            unit_type: *unit,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockCall};
    use crate::storage::MemoryStore;

    fn flour() -> CatalogIngredient {
        CatalogIngredient {
            id: "flour".to_string(),
            name: "Mąka".to_string(),
            unit_type: UnitType::G,
        }
    }

    fn ingredient_calls(api: &MockApi) -> usize {
        api.count(|c| matches!(c, MockCall::ListIngredients(_)))
    }

    #[test]
    fn test_freshness_window() {
        let now = Utc::now();
        let entry = |age_secs: i64| CachedCatalog {
            ingredients: vec![],
            fetched_at: now - chrono::Duration::seconds(age_secs),
        };
        assert!(entry(0).is_fresh(now, CACHE_TTL));
        assert!(entry(299).is_fresh(now, CACHE_TTL));
        assert!(!entry(300).is_fresh(now, CACHE_TTL));
        assert!(!entry(-60).is_fresh(now, CACHE_TTL));
    }

    #[tokio::test]
    async fn test_first_load_fetches_and_caches() {
        let api = Arc::new(MockApi::new().with_ingredients(vec![flour()]));
        let store = Arc::new(MemoryStore::new());
        let catalog = IngredientCatalog::new(api.clone(), store.clone());

        let first = catalog.load().await;
        assert_eq!(first.source, CatalogSource::Network);
        assert_eq!(first.ingredients, vec![flour()]);

        let second = catalog.load().await;
        assert_eq!(second.source, CatalogSource::Cache);
        assert_eq!(ingredient_calls(&api), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_uses_fallback_without_caching() {
        let api = Arc::new(MockApi::new().with_failing_ingredients(500));
        let store = Arc::new(MemoryStore::new());
        let catalog = IngredientCatalog::new(api, store.clone());

        let load = catalog.load().await;
        assert_eq!(load.source, CatalogSource::Fallback);
        assert_eq!(load.ingredients, fallback_ingredients());
        assert_eq!(load.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(store.get(INGREDIENTS_CACHE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupted_cache_is_deleted_and_refetched() {
        let api = Arc::new(MockApi::new().with_ingredients(vec![flour()]));
        let store = Arc::new(MemoryStore::new());
        store.set(INGREDIENTS_CACHE_KEY, "][").unwrap();
        let catalog = IngredientCatalog::new(api.clone(), store.clone());

        let load = catalog.load().await;
        assert_eq!(load.source, CatalogSource::Network);
        assert_eq!(ingredient_calls(&api), 1);
        let cached: CachedCatalog =
            serde_json::from_str(&store.get(INGREDIENTS_CACHE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(cached.ingredients, vec![flour()]);
    }

    #[tokio::test]
    async fn test_refetch_bypasses_cache() {
        let api = Arc::new(MockApi::new().with_ingredients(vec![flour()]));
        let catalog = IngredientCatalog::new(api.clone(), Arc::new(MemoryStore::new()));
        catalog.load().await;
        catalog.refetch().await;
        assert_eq!(ingredient_calls(&api), 2);
    }

    #[tokio::test]
    async fn test_fetches_every_page() {
        let many: Vec<CatalogIngredient> = (0..250)
            .map(|i| CatalogIngredient {
                id: i.to_string(),
                name: format!("Składnik {}", i),
                unit_type: UnitType::G,
            })
            .collect();
        let api = Arc::new(MockApi::new().with_ingredients(many));
        let catalog = IngredientCatalog::new(api.clone(), Arc::new(MemoryStore::new()));

        let load = catalog.load().await;
        assert_eq!(load.ingredients.len(), 250);
        assert_eq!(ingredient_calls(&api), 3);
    }

    #[test]
    fn test_filter_ingredients() {
        let list = fallback_ingredients();
        let hits = filter_ingredients(&list, "ser");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ser żółty");
        assert_eq!(filter_ingredients(&list, "  ").len(), list.len());
        assert_eq!(filter_ingredients(&list, "MĄKA").len(), 1);
    }
}
