//! Debounced search with cancellation of superseded requests.
//!
//! Each new query restarts the debounce window and aborts whatever the
//! previous query was still doing, whether it was waiting or already on the
//! network. Results are published on a watch channel so any number of views
//! can follow the same search.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::RecipeApi;
use crate::error::ApiError;
use crate::types::{CatalogIngredient, IngredientQuery, Page, RecipeQuery, RecipeSummary};

/// Something that answers paged queries.
#[async_trait]
pub trait SearchSource: Send + Sync + 'static {
    type Query: Clone + Debug + PartialEq + Send + Sync + 'static;
    type Item: Clone + Debug + Send + Sync + 'static;

    /// Shown when a fetch fails.
    const FAILURE_MESSAGE: &'static str;

    async fn fetch(&self, query: &Self::Query) -> Result<Page<Self::Item>, ApiError>;

    /// The same query, asking for another page, or `None` when the query is
    /// not paged.
    fn with_page(query: &Self::Query, page: u32) -> Option<Self::Query>;

    /// Blank queries clear the results without a request.
    fn is_blank(_query: &Self::Query) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct SearchState<Q, T> {
    pub query: Option<Q>,
    pub loading: bool,
    pub results: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u32,
    pub error: Option<String>,
    seq: u64,
}

impl<Q, T> Default for SearchState<Q, T> {
    fn default() -> Self {
        Self {
            query: None,
            loading: false,
            results: Vec::new(),
            page: 0,
            total_pages: 0,
            total_items: 0,
            error: None,
            seq: 0,
        }
    }
}

impl<Q, T> SearchState<Q, T> {
    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

type StateSender<S> =
    watch::Sender<SearchState<<S as SearchSource>::Query, <S as SearchSource>::Item>>;

pub struct SearchController<S: SearchSource> {
    source: Arc<S>,
    debounce: Duration,
    state: Arc<StateSender<S>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: SearchSource> SearchController<S> {
    pub fn new(source: S, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            source: Arc::new(source),
            debounce,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SearchState<S::Query, S::Item> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState<S::Query, S::Item>> {
        self.state.subscribe()
    }

    /// Search after the debounce window. Must be called within a Tokio runtime.
    pub fn search(&self, query: S::Query) {
        self.start(query, self.debounce);
    }

    /// Search without waiting, e.g. for a page change.
    pub fn search_now(&self, query: S::Query) {
        self.start(query, Duration::ZERO);
    }

    /// Re-run the current query on `page`. False when there is no such page.
    pub fn go_to_page(&self, page: u32) -> bool {
        let query = {
            let state = self.state.borrow();
            match &state.query {
                Some(query) if page >= 1 && page <= state.total_pages => {
                    S::with_page(query, page)
                }
                _ => None,
            }
        };
        match query {
            Some(query) => {
                self.search_now(query);
                true
            }
            None => false,
        }
    }

    pub fn next_page(&self) -> bool {
        let page = self.state.borrow().page;
        self.go_to_page(page + 1)
    }

    pub fn previous_page(&self) -> bool {
        let page = self.state.borrow().page;
        page > 1 && self.go_to_page(page - 1)
    }

    /// Drop the query and its results.
    pub fn clear(&self) {
        self.abort();
        self.state.send_modify(|state| {
            let seq = state.seq + 1;
            *state = SearchState {
                seq,
                ..SearchState::default()
            };
        });
    }

    /// Wait until the current query has finished loading.
    pub async fn settled(&self) -> SearchState<S::Query, S::Item> {
        let mut receiver = self.state.subscribe();
        let result = match receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        result
    }

    fn start(&self, query: S::Query, delay: Duration) {
        self.abort();

        let blank = S::is_blank(&query);
        let mut seq = 0;
        self.state.send_modify(|state| {
            state.seq += 1;
            seq = state.seq;
            state.query = Some(query.clone());
            state.error = None;
            state.loading = !blank;
            if blank {
                state.results.clear();
                state.page = 0;
                state.total_pages = 0;
                state.total_items = 0;
            }
        });
        if blank {
            return;
        }

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::debug!(?query, "search: fetching");
            let result = source.fetch(&query).await;
            if let Err(e) = &result {
                tracing::warn!(?query, error = %e, "search: fetch failed");
            }

            // A newer query may have started while this one was finishing.
            state.send_if_modified(|state| {
                if state.seq != seq {
                    return false;
                }
                state.loading = false;
                match result {
                    Ok(page) => {
                        state.results = page.data;
                        state.page = page.pagination.page;
                        state.total_pages = page.pagination.total_pages;
                        state.total_items = page.pagination.total_items;
                    }
                    Err(_) => {
                        state.results.clear();
                        state.error = Some(S::FAILURE_MESSAGE.to_string());
                    }
                }
                true
            });
        });
        *lock(&self.task) = Some(handle);
    }

    fn abort(&self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

impl<S: SearchSource> Drop for SearchController<S> {
    fn drop(&mut self) {
        self.abort();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// What to look recipes up by.
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeSearch {
    Text(RecipeQuery),
    /// Catalog ingredient ids the recipes should use.
    Ingredients(Vec<String>),
}

pub struct RecipeSource<A: RecipeApi + ?Sized> {
    api: Arc<A>,
}

impl<A: RecipeApi + ?Sized> RecipeSource<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: RecipeApi + ?Sized + 'static> SearchSource for RecipeSource<A> {
    type Query = RecipeSearch;
    type Item = RecipeSummary;

    const FAILURE_MESSAGE: &'static str = "Nie udało się wyszukać przepisów. Spróbuj ponownie.";

    async fn fetch(&self, query: &RecipeSearch) -> Result<Page<RecipeSummary>, ApiError> {
        match query {
            RecipeSearch::Text(query) => self.api.list_recipes(query).await,
            RecipeSearch::Ingredients(ids) => self.api.find_by_ingredients(ids).await,
        }
    }

    fn with_page(query: &RecipeSearch, page: u32) -> Option<RecipeSearch> {
        match query {
            RecipeSearch::Text(query) => Some(RecipeSearch::Text(RecipeQuery {
                page,
                ..query.clone()
            })),
            // find-by-ingredients takes no page parameter.
            RecipeSearch::Ingredients(_) => None,
        }
    }

    fn is_blank(query: &RecipeSearch) -> bool {
        matches!(query, RecipeSearch::Ingredients(ids) if ids.is_empty())
    }
}

/// Type-ahead over the ingredient catalog.
pub struct IngredientSource<A: RecipeApi + ?Sized> {
    api: Arc<A>,
}

impl<A: RecipeApi + ?Sized> IngredientSource<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: RecipeApi + ?Sized + 'static> SearchSource for IngredientSource<A> {
    type Query = IngredientQuery;
    type Item = CatalogIngredient;

    const FAILURE_MESSAGE: &'static str = "Nie udało się wyszukać składników. Spróbuj ponownie.";

    async fn fetch(&self, query: &IngredientQuery) -> Result<Page<CatalogIngredient>, ApiError> {
        self.api.list_ingredients(query).await
    }

    fn with_page(query: &IngredientQuery, page: u32) -> Option<IngredientQuery> {
        Some(IngredientQuery {
            page,
            ..query.clone()
        })
    }

    fn is_blank(query: &IngredientQuery) -> bool {
        query.search.as_deref().map_or(true, |s| s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockCall};
    use crate::types::{Complexity, RecipeDetail, RecipeIngredientDetail, UnitType};
    use chrono::Utc;
    use tokio::time::sleep;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn recipe(id: &str, name: &str) -> RecipeSummary {
        RecipeSummary {
            id: id.to_string(),
            name: name.to_string(),
            preparation_time_minutes: 20,
            complexity_level: Complexity::Easy,
            author_id: "u1".to_string(),
            average_rating: 4.5,
            total_votes: 2,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn text(search: &str) -> RecipeSearch {
        RecipeSearch::Text(RecipeQuery {
            search: Some(search.to_string()),
            ..RecipeQuery::default()
        })
    }

    fn api() -> MockApi {
        MockApi::new()
            .with_recipe(recipe("1", "Pierogi ruskie"))
            .with_recipe(recipe("2", "Pierogi z mięsem"))
            .with_recipe(recipe("3", "Placki ziemniaczane"))
    }

    fn names(state: &SearchState<RecipeSearch, RecipeSummary>) -> Vec<&str> {
        state.results.iter().map(|r| r.name.as_str()).collect()
    }

    fn searched_texts(api: &MockApi) -> Vec<String> {
        api.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::ListRecipes(q) => q.search,
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_within_window_send_one_request() {
        let api = Arc::new(api());
        let search = SearchController::new(RecipeSource::new(api.clone()), DEBOUNCE);

        search.search(text("p"));
        sleep(Duration::from_millis(100)).await;
        search.search(text("pie"));
        sleep(Duration::from_millis(100)).await;
        search.search(text("pierogi"));
        assert!(search.state().loading);

        let state = search.settled().await;
        assert_eq!(searched_texts(&api), vec!["pierogi".to_string()]);
        assert_eq!(names(&state), vec!["Pierogi ruskie", "Pierogi z mięsem"]);
        assert_eq!(state.page, 1);
        assert_eq!(state.total_items, 2);
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_request_is_superseded() {
        let api = Arc::new(api().with_delay(Duration::from_secs(2)));
        let search = SearchController::new(RecipeSource::new(api.clone()), DEBOUNCE);
        let mut updates = search.subscribe();

        search.search(text("placki"));
        // Past the debounce, so the first request is on the wire.
        sleep(Duration::from_millis(500)).await;
        assert_eq!(searched_texts(&api), vec!["placki".to_string()]);

        search.search(text("pierogi"));
        let state = search.settled().await;
        assert_eq!(names(&state), vec!["Pierogi ruskie", "Pierogi z mięsem"]);
        assert_eq!(state.query, Some(text("pierogi")));

        // The aborted request never published its results.
        sleep(Duration::from_secs(5)).await;
        let last = updates.borrow_and_update().clone();
        assert_eq!(names(&last), vec!["Pierogi ruskie", "Pierogi z mięsem"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination() {
        let mut mock = MockApi::new();
        for i in 0..25 {
            mock = mock.with_recipe(recipe(&i.to_string(), &format!("Zupa {}", i)));
        }
        let search = SearchController::new(RecipeSource::new(Arc::new(mock)), DEBOUNCE);

        search.search(text("zupa"));
        let state = search.settled().await;
        assert_eq!(state.results.len(), 10);
        assert_eq!(state.total_pages, 3);
        assert!(!state.has_previous_page());

        assert!(search.next_page());
        let state = search.settled().await;
        assert_eq!(state.page, 2);
        assert!(state.has_previous_page());

        assert!(search.go_to_page(3));
        let state = search.settled().await;
        assert_eq!(state.page, 3);
        assert_eq!(state.results.len(), 5);
        assert!(!state.has_next_page());
        assert!(!search.go_to_page(4));
        assert!(!search.next_page());
        assert!(search.previous_page());
        assert_eq!(search.settled().await.page, 2);
    }

    fn detail_using(recipe: &RecipeSummary, ingredient_ids: &[&str]) -> RecipeDetail {
        RecipeDetail {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            preparation_time_minutes: recipe.preparation_time_minutes,
            complexity_level: recipe.complexity_level,
            author_id: recipe.author_id.clone(),
            average_rating: recipe.average_rating,
            total_votes: recipe.total_votes,
            steps: Vec::new(),
            ingredients: ingredient_ids
                .iter()
                .enumerate()
                .map(|(index, id)| RecipeIngredientDetail {
                    id: format!("{}-{}", recipe.id, index),
                    ingredient_id: id.to_string(),
                    name: id.to_string(),
                    unit_type: UnitType::Szt,
                    amount: 1.0,
                    is_optional: false,
                    substitute_recommendation: None,
                })
                .collect(),
            created_at: recipe.created_at,
            updated_at: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingredient_search_and_empty_selection() {
        let ruskie = recipe("1", "Pierogi ruskie");
        let placki = recipe("3", "Placki ziemniaczane");
        let api = Arc::new(
            api()
                .with_detail(detail_using(&ruskie, &["ziemniaki", "twarog"]))
                .with_detail(detail_using(&placki, &["ziemniaki", "jajko"])),
        );
        let search = SearchController::new(RecipeSource::new(api.clone()), DEBOUNCE);

        search.search(RecipeSearch::Ingredients(Vec::new()));
        assert!(!search.state().loading);
        assert!(api.calls().is_empty());

        search.search(RecipeSearch::Ingredients(vec!["jajko".to_string()]));
        let state = search.settled().await;
        assert_eq!(
            api.calls(),
            vec![MockCall::FindByIngredients(vec!["jajko".to_string()])]
        );
        assert_eq!(names(&state), vec!["Placki ziemniaczane"]);

        search.search(RecipeSearch::Ingredients(vec!["ziemniaki".to_string()]));
        let state = search.settled().await;
        assert_eq!(names(&state), vec!["Pierogi ruskie", "Placki ziemniaczane"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingredient_search_is_not_paged() {
        let ruskie = recipe("1", "Pierogi ruskie");
        let api = Arc::new(api().with_detail(detail_using(&ruskie, &["twarog"])));
        let search = SearchController::new(RecipeSource::new(api.clone()), DEBOUNCE);

        search.search_now(RecipeSearch::Ingredients(vec!["twarog".to_string()]));
        let state = search.settled().await;
        assert_eq!(state.total_pages, 1);

        assert!(!search.go_to_page(1));
        assert!(!search.next_page());
        assert_eq!(api.count(|c| matches!(c, MockCall::FindByIngredients(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_error() {
        let api = Arc::new(MockApi::new().with_failing_ingredients(500));
        let search = SearchController::new(IngredientSource::new(api), DEBOUNCE);

        search.search(IngredientQuery {
            search: Some("mąka".to_string()),
            ..IngredientQuery::default()
        });
        let state = search.settled().await;
        assert!(!state.loading);
        assert!(state.results.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some(<IngredientSource<MockApi> as SearchSource>::FAILURE_MESSAGE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingredient_type_ahead() {
        let api = Arc::new(MockApi::new().with_ingredients(vec![
            CatalogIngredient {
                id: "1".to_string(),
                name: "Mąka pszenna".to_string(),
                unit_type: UnitType::G,
            },
            CatalogIngredient {
                id: "2".to_string(),
                name: "Mleko".to_string(),
                unit_type: UnitType::Ml,
            },
        ]));
        let search = SearchController::new(IngredientSource::new(api.clone()), DEBOUNCE);

        search.search(IngredientQuery {
            search: Some("mle".to_string()),
            ..IngredientQuery::default()
        });
        let state = search.settled().await;
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].id, "2");

        search.search(IngredientQuery {
            search: Some("  ".to_string()),
            ..IngredientQuery::default()
        });
        assert!(search.state().results.is_empty());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_search() {
        let api = Arc::new(api());
        let search = SearchController::new(RecipeSource::new(api.clone()), DEBOUNCE);
        search.search(text("pierogi"));
        search.clear();

        sleep(Duration::from_secs(1)).await;
        let state = search.state();
        assert!(state.query.is_none());
        assert!(!state.loading);
        assert!(api.calls().is_empty());
    }
}
