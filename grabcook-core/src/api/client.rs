//! reqwest-backed implementation of [`RecipeApi`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::RecipeApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::image::AttachedImage;
use crate::types::{
    AddPantryIngredient, AuthResponse, CatalogIngredient, CreateRecipeRequest, DataEnvelope,
    ErrorBody, IngredientQuery, LoginRequest, Page, PantryIngredient, PantryIngredientAdded,
    RatingUpdate, RecipeDetail, RecipeQuery, RecipeSummary, RecipeView, RegisterRequest,
    UserProfile,
};

const RECIPES: [&str; 2] = ["api", "recipes"];
const PANTRY: [&str; 4] = ["api", "users", "me", "default-ingredients"];

/// Configuration for HttpApiClient.
#[derive(Clone)]
pub struct HttpApiClientBuilder {
    base_url: Url,
    timeout: Duration,
    user_agent: String,
}

impl HttpApiClientBuilder {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("grabcook/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Start from a loaded [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_url.clone()).timeout(config.timeout)
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build the HttpApiClient.
    pub fn build(self) -> Result<HttpApiClient, ApiError> {
        if self.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{} cannot be used as an API base",
                self.base_url
            )));
        }

        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(HttpApiClient {
            inner: Arc::new(inner),
            base_url: self.base_url,
        })
    }
}

/// Production API client.
#[derive(Clone)]
pub struct HttpApiClient {
    /// Shared reqwest client for connection pooling.
    inner: Arc<reqwest::Client>,
    base_url: Url,
}

impl HttpApiClient {
    pub fn builder(base_url: Url) -> HttpApiClientBuilder {
        HttpApiClientBuilder::new(base_url)
    }

    /// Base URL extended by `segments`, each percent-encoded as a single
    /// path segment. A trailing `""` keeps a trailing slash.
    fn endpoint<I>(&self, segments: I) -> Result<Url, ApiError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn recipe_endpoint(&self, id: &str, action: Option<&str>) -> Result<Url, ApiError> {
        self.endpoint(RECIPES.into_iter().chain([id]).chain(action))
    }

    /// `POST /api/recipes/`: JSON without an image, multipart with a `recipe`
    /// JSON part and an `image` file part otherwise.
    fn create_request(
        &self,
        token: &str,
        request: &CreateRecipeRequest,
        image: Option<&AttachedImage>,
    ) -> Result<Request, ApiError> {
        let url = self.endpoint(RECIPES.into_iter().chain([""]))?;
        let builder = self.inner.post(url).bearer_auth(token);

        let builder = match image {
            None => builder.json(request),
            Some(image) => {
                let recipe_json = serde_json::to_string(request)
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
                let recipe_part = Part::text(recipe_json).mime_str("application/json")?;
                let image_part = Part::bytes(image.data.clone())
                    .file_name(image.file_name.clone())
                    .mime_str(&image.content_type)?;
                let form = Form::new()
                    .part("recipe", recipe_part)
                    .part("image", image_part);
                builder.multipart(form)
            }
        };
        Ok(builder.build()?)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        self.execute(builder.build()?).await
    }

    async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        self.inner
            .execute(request)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Turn an error response into `ApiError::Status` with the server's detail.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let bytes = response.bytes().await?;
        let detail = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.message())
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        tracing::debug!(url, status = %status, detail, "api: request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    /// Turn a response into `T`, or into `ApiError::Status` with the server's detail.
    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check(response).await?;
        let status = response.status();
        let url = response.url().to_string();
        let bytes = response.bytes().await?;
        tracing::debug!(url, status = %status, "api: ok");
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RecipeApi for HttpApiClient {
    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Page<RecipeSummary>, ApiError> {
        let url = self.endpoint(RECIPES.into_iter().chain([""]))?;
        let response = self
            .send(self.inner.get(url).query(&query.to_pairs()))
            .await?;
        Self::parse(response).await
    }

    async fn find_by_ingredients(
        &self,
        ingredient_ids: &[String],
    ) -> Result<Page<RecipeSummary>, ApiError> {
        let url = self.endpoint(RECIPES.into_iter().chain(["find-by-ingredients"]))?;
        let ids = ingredient_ids.join(",");
        let response = self
            .send(self.inner.get(url).query(&[("ingredientIds", ids)]))
            .await?;
        Self::parse(response).await
    }

    async fn get_recipe(&self, id: &str) -> Result<RecipeDetail, ApiError> {
        let url = self.recipe_endpoint(id, None)?;
        let response = self.send(self.inner.get(url)).await?;
        let envelope: DataEnvelope<RecipeDetail> = Self::parse(response).await?;
        Ok(envelope.data)
    }

    async fn create_recipe(
        &self,
        token: &str,
        request: &CreateRecipeRequest,
        image: Option<&AttachedImage>,
    ) -> Result<RecipeDetail, ApiError> {
        let request = self.create_request(token, request, image)?;
        let response = self.execute(request).await?;
        let envelope: DataEnvelope<RecipeDetail> = Self::parse(response).await?;
        Ok(envelope.data)
    }

    async fn rate_recipe(
        &self,
        token: &str,
        id: &str,
        rating: u8,
    ) -> Result<RatingUpdate, ApiError> {
        let url = self.recipe_endpoint(id, Some("rate"))?;
        let response = self
            .send(
                self.inner
                    .post(url)
                    .bearer_auth(token)
                    .json(&serde_json::json!({ "rating": rating })),
            )
            .await?;
        Self::parse(response).await
    }

    async fn list_ingredients(
        &self,
        query: &IngredientQuery,
    ) -> Result<Page<CatalogIngredient>, ApiError> {
        let url = self.endpoint(["api", "ingredients", ""])?;
        let response = self
            .send(self.inner.get(url).query(&query.to_pairs()))
            .await?;
        Self::parse(response).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(["api", "auth", "login"])?;
        let response = self.send(self.inner.post(url).json(request)).await?;
        Self::parse(response).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(["api", "auth", "register"])?;
        let response = self.send(self.inner.post(url).json(request)).await?;
        Self::parse(response).await
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        let url = self.endpoint(["api", "users", "me"])?;
        let response = self.send(self.inner.get(url).bearer_auth(token)).await?;
        Self::parse(response).await
    }

    async fn recipe_views(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<RecipeView>, ApiError> {
        let url = self.endpoint(["api", "users", "me", "recipe-views"])?;
        let response = self
            .send(
                self.inner
                    .get(url)
                    .bearer_auth(token)
                    .query(&[("page", page), ("limit", limit)]),
            )
            .await?;
        Self::parse(response).await
    }

    async fn pantry(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<PantryIngredient>, ApiError> {
        let url = self.endpoint(PANTRY)?;
        let response = self
            .send(
                self.inner
                    .get(url)
                    .bearer_auth(token)
                    .query(&[("page", page), ("limit", limit)]),
            )
            .await?;
        Self::parse(response).await
    }

    async fn add_to_pantry(
        &self,
        token: &str,
        ingredient_id: &str,
    ) -> Result<PantryIngredientAdded, ApiError> {
        let url = self.endpoint(PANTRY)?;
        let body = AddPantryIngredient {
            ingredient_id: ingredient_id.to_string(),
        };
        let response = self
            .send(self.inner.post(url).bearer_auth(token).json(&body))
            .await?;
        Self::parse(response).await
    }

    async fn remove_from_pantry(&self, token: &str, ingredient_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(PANTRY.into_iter().chain([ingredient_id]))?;
        let response = self.send(self.inner.delete(url).bearer_auth(token)).await?;
        let response = Self::check(response).await?;
        tracing::debug!(status = %response.status(), ingredient_id, "api: pantry entry removed");
        Ok(())
    }
}
