pub mod api;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod form;
pub mod image;
pub mod pantry;
pub mod persistence;
pub mod search;
pub mod selection;
pub mod session;
pub mod storage;
pub mod submit;
pub mod types;
pub mod validation;

pub use api::{HttpApiClient, HttpApiClientBuilder, MockApi, MockCall, MockCreate, RecipeApi};
pub use catalog::{CatalogLoad, CatalogSource, IngredientCatalog, CACHE_TTL};
pub use config::ClientConfig;
pub use draft::{DraftIngredient, DraftPatch, DraftRecipe, DraftSnapshot, DraftStep};
pub use error::{ApiError, ConfigError, ImageError, SessionError, StorageError};
pub use form::{FormProgress, FormProgressTracker, IngredientPatch, RecipeForm};
pub use image::{AttachedImage, ImageUpload, MAX_DIMENSION, MAX_FILE_SIZE};
pub use pantry::Pantry;
pub use persistence::DraftPersistence;
pub use search::{
    IngredientSource, RecipeSearch, RecipeSource, SearchController, SearchSource, SearchState,
};
pub use selection::IngredientSelection;
pub use session::{AuthSession, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use submit::{RecipeSubmitter, SubmissionState, SubmitOutcome};
pub use types::{
    CatalogIngredient, Complexity, PantryIngredient, RecipeDetail, RecipeQuery, RecipeSummary,
    RecipeView, SortField, SortOrder, UnitType, UserProfile,
};
pub use validation::{validate_draft, ValidationErrors};
