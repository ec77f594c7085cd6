//! Access to the recipe backend.
//!
//! Everything that talks to the server goes through [`RecipeApi`], so flows
//! can be exercised against [`MockApi`] without a network.

mod client;
mod mock;

pub use client::{HttpApiClient, HttpApiClientBuilder};
pub use mock::{MockApi, MockCall, MockCreate};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::image::AttachedImage;
use crate::types::{
    AuthResponse, CatalogIngredient, CreateRecipeRequest, IngredientQuery, LoginRequest, Page,
    PantryIngredient, PantryIngredientAdded, RatingUpdate, RecipeDetail, RecipeQuery,
    RecipeSummary, RecipeView, RegisterRequest, UserProfile,
};

/// Trait for recipe API clients, enabling mockability in tests.
#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// Paginated recipe list, optionally filtered by free text and complexity.
    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Page<RecipeSummary>, ApiError>;

    /// Recipes that use the given catalog ingredients, best matches first.
    async fn find_by_ingredients(
        &self,
        ingredient_ids: &[String],
    ) -> Result<Page<RecipeSummary>, ApiError>;

    async fn get_recipe(&self, id: &str) -> Result<RecipeDetail, ApiError>;

    /// Create a recipe. Sent as multipart when an image is attached.
    async fn create_recipe(
        &self,
        token: &str,
        request: &CreateRecipeRequest,
        image: Option<&AttachedImage>,
    ) -> Result<RecipeDetail, ApiError>;

    async fn rate_recipe(&self, token: &str, id: &str, rating: u8)
        -> Result<RatingUpdate, ApiError>;

    async fn list_ingredients(
        &self,
        query: &IngredientQuery,
    ) -> Result<Page<CatalogIngredient>, ApiError>;

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// Profile of the user the token belongs to.
    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError>;

    /// Recipes the user has opened, most recent first.
    async fn recipe_views(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<RecipeView>, ApiError>;

    /// Ingredients the user keeps at home, by name.
    async fn pantry(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<PantryIngredient>, ApiError>;

    async fn add_to_pantry(
        &self,
        token: &str,
        ingredient_id: &str,
    ) -> Result<PantryIngredientAdded, ApiError>;

    async fn remove_from_pantry(&self, token: &str, ingredient_id: &str) -> Result<(), ApiError>;
}
