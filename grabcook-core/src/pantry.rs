//! The signed-in user's default ingredients.
//!
//! The server caps the pantry at 100 entries and returns it sorted by name.

use std::sync::Arc;

use crate::api::RecipeApi;
use crate::error::ApiError;
use crate::selection::IngredientSelection;
use crate::types::{PantryIngredient, PantryIngredientAdded};

/// Largest page the server accepts.
pub const PANTRY_PAGE_SIZE: u32 = 100;

const MAX_PAGES: u32 = 10;

pub struct Pantry<A: RecipeApi + ?Sized> {
    api: Arc<A>,
    token: String,
}

impl<A: RecipeApi + ?Sized> Pantry<A> {
    pub fn new(api: Arc<A>, token: impl Into<String>) -> Self {
        Self {
            api,
            token: token.into(),
        }
    }

    /// Every pantry entry, across all pages.
    pub async fn list(&self) -> Result<Vec<PantryIngredient>, ApiError> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let result = self.api.pantry(&self.token, page, PANTRY_PAGE_SIZE).await?;
            let done = result.data.is_empty()
                || page >= result.pagination.total_pages
                || page >= MAX_PAGES;
            all.extend(result.data);
            if done {
                break;
            }
            page += 1;
        }
        tracing::debug!(count = all.len(), "pantry: fetched");
        Ok(all)
    }

    pub async fn add(&self, ingredient_id: &str) -> Result<PantryIngredientAdded, ApiError> {
        self.api
            .add_to_pantry(&self.token, ingredient_id.trim())
            .await
    }

    pub async fn remove(&self, ingredient_id: &str) -> Result<(), ApiError> {
        self.api
            .remove_from_pantry(&self.token, ingredient_id.trim())
            .await
    }

    /// Add every pantry ingredient to `selection`. Returns how many were new.
    pub async fn seed(&self, selection: &mut IngredientSelection) -> Result<usize, ApiError> {
        let before = selection.len();
        for entry in self.list().await? {
            selection.add(&entry.ingredient_id);
        }
        Ok(selection.len() - before)
    }
}
