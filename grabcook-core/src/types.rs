//! Request and response shapes of the recipe API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recipe difficulty as understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

impl Complexity {
    pub const ALL: &'static [Complexity] =
        &[Complexity::Easy, Complexity::Medium, Complexity::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Easy => "easy",
            Complexity::Medium => "medium",
            Complexity::Hard => "hard",
        }
    }

    /// Polish label shown next to the level.
    pub fn label(&self) -> &'static str {
        match self {
            Complexity::Easy => "Łatwy",
            Complexity::Medium => "Średni",
            Complexity::Hard => "Trudny",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Complexity::Easy),
            "medium" => Ok(Complexity::Medium),
            "hard" => Ok(Complexity::Hard),
            other => Err(format!(
                "unknown complexity '{}', expected easy, medium or hard",
                other
            )),
        }
    }
}

/// Unit a catalog ingredient is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Ml,
    G,
    Szt,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Ml => "ml",
            UnitType::G => "g",
            UnitType::Szt => "szt",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference ingredient from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogIngredient {
    pub id: String,
    pub name: String,
    pub unit_type: UnitType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_items: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Recipe as returned by list and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
    pub preparation_time_minutes: u32,
    pub complexity_level: Complexity,
    pub author_id: String,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_votes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub step: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: String,
    pub ingredient_id: String,
    pub name: String,
    pub unit_type: UnitType,
    pub amount: f64,
    #[serde(default)]
    pub is_optional: bool,
    pub substitute_recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: String,
    pub name: String,
    pub preparation_time_minutes: u32,
    pub complexity_level: Complexity,
    pub author_id: String,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_votes: u32,
    pub steps: Vec<RecipeStep>,
    pub ingredients: Vec<RecipeIngredientDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Wrapper the backend puts around single records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecipeIngredient {
    pub ingredient_id: String,
    pub amount: f64,
    pub is_optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitute_recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub preparation_time_minutes: u32,
    pub complexity_level: Complexity,
    pub steps: Vec<RecipeStep>,
    pub ingredients: Vec<CreateRecipeIngredient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub average_rating: f64,
    pub total_votes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

/// One entry of the signed-in user's recipe view history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeView {
    pub id: String,
    pub recipe_id: String,
    pub recipe_name: String,
    pub view_start: DateTime<Utc>,
    pub view_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Ingredient the user always has at hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryIngredient {
    pub ingredient_id: String,
    pub name: String,
    pub unit_type: UnitType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddPantryIngredient {
    pub ingredient_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryIngredientAdded {
    pub user_id: String,
    pub ingredient_id: String,
    pub created_at: DateTime<Utc>,
}

/// Error body of a failed request (`{"detail": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Flatten `detail`, which is either a string or a list of field errors.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    Rating,
    PrepTime,
    #[default]
    CreatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Rating => "rating",
            SortField::PrepTime => "prep_time",
            SortField::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "rating" => Ok(SortField::Rating),
            "prep_time" => Ok(SortField::PrepTime),
            "created_at" => Ok(SortField::CreatedAt),
            other => Err(format!("unknown sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Parameters for the recipe list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub complexity: Option<Complexity>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for RecipeQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            limit: 10,
            complexity: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl RecipeQuery {
    /// Query-string pairs in the form the backend expects.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.as_str().to_string()),
            ("sortOrder", self.sort_order.as_str().to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search", search.to_string()));
            }
        }
        if let Some(complexity) = self.complexity {
            pairs.push(("complexity", complexity.as_str().to_string()));
        }
        pairs
    }
}

/// Parameters for the ingredient list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientQuery {
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for IngredientQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            limit: 100,
        }
    }
}

impl IngredientQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search", search.to_string()));
            }
        }
        pairs
    }
}
