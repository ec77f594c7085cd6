//! In-process fake of the recipe API for tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::RecipeApi;
use crate::error::ApiError;
use crate::image::AttachedImage;
use crate::types::{
    AuthResponse, CatalogIngredient, CreateRecipeRequest, IngredientQuery, LoginRequest, Page,
    Pagination, PantryIngredient, PantryIngredientAdded, RatingUpdate, RecipeDetail,
    RecipeIngredientDetail, RecipeQuery, RecipeSummary, RecipeView, RegisterRequest, UnitType,
    UserProfile,
};

const TOKEN_PREFIX: &str = "token-for-";

/// Recorded request against the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    ListRecipes(RecipeQuery),
    FindByIngredients(Vec<String>),
    GetRecipe(String),
    CreateRecipe {
        token: String,
        request: CreateRecipeRequest,
        with_image: bool,
    },
    RateRecipe {
        id: String,
        rating: u8,
    },
    ListIngredients(IngredientQuery),
    Login(String),
    Register(String),
    CurrentUser,
    RecipeViews {
        page: u32,
        limit: u32,
    },
    Pantry,
    AddToPantry(String),
    RemoveFromPantry(String),
}

/// How the mock answers recipe creation.
#[derive(Debug, Clone)]
pub enum MockCreate {
    /// Echo the request back as a stored recipe with this id.
    Created(String),
    /// Fail with an HTTP status.
    Status(u16),
    /// Fail before any response arrives.
    Network,
}

/// Mock API client for testing.
pub struct MockApi {
    recipes: Vec<RecipeSummary>,
    details: HashMap<String, RecipeDetail>,
    ingredients: Result<Vec<CatalogIngredient>, u16>,
    create: MockCreate,
    views: Vec<RecipeView>,
    pantry: Mutex<Vec<PantryIngredient>>,
    delay: Duration,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Create a new mock with no recipes and an empty catalog.
    pub fn new() -> Self {
        Self {
            recipes: Vec::new(),
            details: HashMap::new(),
            ingredients: Ok(Vec::new()),
            create: MockCreate::Created("recipe-1".to_string()),
            views: Vec::new(),
            pantry: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a recipe to list and search results.
    pub fn with_recipe(mut self, recipe: RecipeSummary) -> Self {
        self.recipes.push(recipe);
        self
    }

    pub fn with_detail(mut self, detail: RecipeDetail) -> Self {
        self.details.insert(detail.id.clone(), detail);
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<CatalogIngredient>) -> Self {
        self.ingredients = Ok(ingredients);
        self
    }

    /// Make every ingredient request fail with `status`.
    pub fn with_failing_ingredients(mut self, status: u16) -> Self {
        self.ingredients = Err(status);
        self
    }

    /// Add an entry to the view history, oldest first.
    pub fn with_view(mut self, view: RecipeView) -> Self {
        self.views.push(view);
        self
    }

    /// Current pantry, sorted by name as the server returns it.
    pub fn pantry_ids(&self) -> Vec<String> {
        lock(&self.pantry)
            .iter()
            .map(|p| p.ingredient_id.clone())
            .collect()
    }

    pub fn with_create(mut self, create: MockCreate) -> Self {
        self.create = create;
        self
    }

    /// Delay every response, to observe requests in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.lock().iter().filter(|c| predicate(c)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        lock(&self.calls)
    }

    async fn record(&self, call: MockCall) {
        self.lock().push(call);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
        let limit = limit.max(1);
        let total_items = items.len() as u32;
        let total_pages = total_items.div_ceil(limit);
        let start = ((page.max(1) - 1) * limit) as usize;
        let data = items
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Page {
            data,
            pagination: Pagination {
                page,
                limit,
                total_items,
                total_pages,
            },
        }
    }

    fn fake_user(email: &str) -> AuthResponse {
        AuthResponse {
            access_token: format!("{}{}", TOKEN_PREFIX, email),
            token_type: "bearer".to_string(),
            user: Self::profile(email),
        }
    }

    fn profile(email: &str) -> UserProfile {
        UserProfile {
            id: "user-1".to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn status(status: u16, detail: &str) -> ApiError {
        ApiError::Status {
            status,
            detail: detail.to_string(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RecipeApi for MockApi {
    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Page<RecipeSummary>, ApiError> {
        self.record(MockCall::ListRecipes(query.clone())).await;
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        let matching: Vec<RecipeSummary> = self
            .recipes
            .iter()
            .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
            .filter(|r| query.complexity.map_or(true, |c| r.complexity_level == c))
            .cloned()
            .collect();
        Ok(Self::paginate(&matching, query.page, query.limit))
    }

    async fn find_by_ingredients(
        &self,
        ingredient_ids: &[String],
    ) -> Result<Page<RecipeSummary>, ApiError> {
        self.record(MockCall::FindByIngredients(ingredient_ids.to_vec()))
            .await;
        let matching: Vec<RecipeSummary> = self
            .recipes
            .iter()
            .filter(|r| {
                self.details.get(&r.id).is_some_and(|d| {
                    d.ingredients
                        .iter()
                        .any(|i| ingredient_ids.contains(&i.ingredient_id))
                })
            })
            .cloned()
            .collect();
        let count = matching.len() as u32;
        Ok(Self::paginate(&matching, 1, count))
    }

    async fn get_recipe(&self, id: &str) -> Result<RecipeDetail, ApiError> {
        self.record(MockCall::GetRecipe(id.to_string())).await;
        self.details.get(id).cloned().ok_or(ApiError::Status {
            status: 404,
            detail: "Recipe not found".to_string(),
        })
    }

    async fn create_recipe(
        &self,
        token: &str,
        request: &CreateRecipeRequest,
        image: Option<&AttachedImage>,
    ) -> Result<RecipeDetail, ApiError> {
        self.record(MockCall::CreateRecipe {
            token: token.to_string(),
            request: request.clone(),
            with_image: image.is_some(),
        })
        .await;

        match &self.create {
            MockCreate::Created(id) => Ok(RecipeDetail {
                id: id.clone(),
                name: request.name.clone(),
                preparation_time_minutes: request.preparation_time_minutes,
                complexity_level: request.complexity_level,
                author_id: "user-1".to_string(),
                average_rating: 0.0,
                total_votes: 0,
                steps: request.steps.clone(),
                ingredients: request
                    .ingredients
                    .iter()
                    .enumerate()
                    .map(|(index, line)| RecipeIngredientDetail {
                        id: format!("{}-ing-{}", id, index),
                        ingredient_id: line.ingredient_id.clone(),
                        name: line.ingredient_id.clone(),
                        unit_type: UnitType::G,
                        amount: line.amount,
                        is_optional: line.is_optional,
                        substitute_recommendation: line.substitute_recommendation.clone(),
                    })
                    .collect(),
                created_at: Utc::now(),
                updated_at: None,
            }),
            MockCreate::Status(status) => Err(ApiError::Status {
                status: *status,
                detail: format!("mock status {}", status),
            }),
            MockCreate::Network => Err(ApiError::Network("connection refused".to_string())),
        }
    }

    async fn rate_recipe(
        &self,
        _token: &str,
        id: &str,
        rating: u8,
    ) -> Result<RatingUpdate, ApiError> {
        self.record(MockCall::RateRecipe {
            id: id.to_string(),
            rating,
        })
        .await;
        Ok(RatingUpdate {
            average_rating: rating as f64,
            total_votes: 1,
        })
    }

    async fn list_ingredients(
        &self,
        query: &IngredientQuery,
    ) -> Result<Page<CatalogIngredient>, ApiError> {
        self.record(MockCall::ListIngredients(query.clone())).await;
        let ingredients = match &self.ingredients {
            Ok(list) => list,
            Err(status) => {
                return Err(ApiError::Status {
                    status: *status,
                    detail: "mock ingredient failure".to_string(),
                })
            }
        };
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        let matching: Vec<CatalogIngredient> = ingredients
            .iter()
            .filter(|i| needle.is_empty() || i.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(Self::paginate(&matching, query.page, query.limit))
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.record(MockCall::Login(request.email.clone())).await;
        if request.password.is_empty() {
            return Err(ApiError::Status {
                status: 401,
                detail: "Incorrect email or password".to_string(),
            });
        }
        Ok(Self::fake_user(&request.email))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.record(MockCall::Register(request.email.clone())).await;
        Ok(Self::fake_user(&request.email))
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.record(MockCall::CurrentUser).await;
        match token.strip_prefix(TOKEN_PREFIX) {
            Some(email) => Ok(Self::profile(email)),
            None => Err(Self::status(401, "Authentication required")),
        }
    }

    async fn recipe_views(
        &self,
        _token: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<RecipeView>, ApiError> {
        self.record(MockCall::RecipeViews { page, limit }).await;
        let newest_first: Vec<RecipeView> = self.views.iter().rev().cloned().collect();
        Ok(Self::paginate(&newest_first, page, limit))
    }

    async fn pantry(
        &self,
        _token: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<PantryIngredient>, ApiError> {
        self.record(MockCall::Pantry).await;
        let pantry = lock(&self.pantry).clone();
        Ok(Self::paginate(&pantry, page, limit))
    }

    async fn add_to_pantry(
        &self,
        _token: &str,
        ingredient_id: &str,
    ) -> Result<PantryIngredientAdded, ApiError> {
        self.record(MockCall::AddToPantry(ingredient_id.to_string()))
            .await;
        let ingredient = self
            .ingredients
            .as_ref()
            .ok()
            .and_then(|list| list.iter().find(|i| i.id == ingredient_id))
            .ok_or_else(|| {
                Self::status(404, &format!("Składnik o ID {} nie istnieje", ingredient_id))
            })?;

        let mut pantry = lock(&self.pantry);
        if pantry.iter().any(|p| p.ingredient_id == ingredient_id) {
            return Err(Self::status(
                409,
                &format!("Składnik '{}' już jest w domyślnych", ingredient.name),
            ));
        }
        let created_at = Utc::now();
        pantry.push(PantryIngredient {
            ingredient_id: ingredient.id.clone(),
            name: ingredient.name.clone(),
            unit_type: ingredient.unit_type,
            created_at,
        });
        pantry.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(PantryIngredientAdded {
            user_id: "user-1".to_string(),
            ingredient_id: ingredient.id.clone(),
            created_at,
        })
    }

    async fn remove_from_pantry(&self, _token: &str, ingredient_id: &str) -> Result<(), ApiError> {
        self.record(MockCall::RemoveFromPantry(ingredient_id.to_string()))
            .await;
        let mut pantry = lock(&self.pantry);
        let before = pantry.len();
        pantry.retain(|p| p.ingredient_id != ingredient_id);
        if pantry.len() == before {
            return Err(Self::status(
                404,
                "Składnik nie jest w domyślnych użytkownika",
            ));
        }
        Ok(())
    }
}
