//! Sending a finished draft to the server.
//!
//! A submission passes the validation gate, then the session gate, and only
//! then goes to the network. The server's answer is mapped onto a fixed set
//! of user-facing messages; nothing is retried.

use std::sync::Arc;
use tokio::sync::watch;

use crate::api::RecipeApi;
use crate::draft::DraftRecipe;
use crate::error::ApiError;
use crate::form::RecipeForm;
use crate::persistence::DraftPersistence;
use crate::session::SessionStore;
use crate::storage::KeyValueStore;
use crate::types::{CreateRecipeIngredient, CreateRecipeRequest, RecipeDetail, RecipeStep};
use crate::validation::ValidationErrors;

pub const LOGIN_REDIRECT: &str = "/login";

pub mod messages {
    pub const LOGIN_REQUIRED: &str = "Zaloguj się, aby dodać przepis.";
    pub const BAD_REQUEST: &str =
        "Nieprawidłowe dane przepisu. Sprawdź formularz i spróbuj ponownie.";
    pub const SESSION_EXPIRED: &str = "Sesja wygasła. Zaloguj się ponownie.";
    pub const FORBIDDEN: &str = "Nie masz uprawnień do dodania przepisu.";
    pub const SERVER_ERROR: &str = "Błąd serwera. Spróbuj ponownie później.";
    pub const SAVE_FAILED: &str = "Nie udało się zapisać przepisu. Spróbuj ponownie.";
    pub const CONNECTION_FAILED: &str =
        "Błąd połączenia z serwerem. Sprawdź połączenie internetowe.";
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success {
        recipe_id: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Saved. The form is empty again and the backup is gone.
    Created {
        recipe: RecipeDetail,
        redirect: String,
    },
    /// The draft did not pass validation. Nothing was sent.
    Invalid(ValidationErrors),
    /// No session, or the server rejected the token.
    Unauthorized {
        message: &'static str,
        redirect: &'static str,
    },
    Failed {
        status: Option<u16>,
        message: &'static str,
    },
    /// Another submission is still running.
    Busy,
}

/// Where to go after a recipe was created.
pub fn recipe_redirect(recipe_id: &str) -> String {
    format!("/recipes/{}", recipe_id)
}

pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => messages::BAD_REQUEST,
        401 => messages::SESSION_EXPIRED,
        403 => messages::FORBIDDEN,
        500 => messages::SERVER_ERROR,
        _ => messages::SAVE_FAILED,
    }
}

fn failure_message(error: &ApiError) -> &'static str {
    match error {
        ApiError::Network(_) => messages::CONNECTION_FAILED,
        ApiError::RequestFailed(e) if e.status().is_none() => messages::CONNECTION_FAILED,
        other => other
            .status()
            .map(status_message)
            .unwrap_or(messages::SAVE_FAILED),
    }
}

/// Request body for a validated draft.
///
/// Strings are trimmed, steps renumbered from 1 and blank substitutes left
/// out. Returns `None` when a required scalar is missing or out of range.
pub fn build_request(draft: &DraftRecipe) -> Option<CreateRecipeRequest> {
    let preparation_time_minutes = u32::try_from(draft.preparation_time_minutes?).ok()?;
    let complexity_level = draft.complexity_level?;

    let steps = draft
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| RecipeStep {
            step: index as u32 + 1,
            description: step.description.trim().to_string(),
        })
        .collect();

    let ingredients = draft
        .ingredients
        .iter()
        .map(|line| {
            let substitute = line.substitute_recommendation.trim();
            CreateRecipeIngredient {
                ingredient_id: line.ingredient_id.trim().to_string(),
                amount: line.amount,
                is_optional: line.is_optional,
                substitute_recommendation: (!substitute.is_empty())
                    .then(|| substitute.to_string()),
            }
        })
        .collect();

    Some(CreateRecipeRequest {
        name: draft.name.trim().to_string(),
        preparation_time_minutes,
        complexity_level,
        steps,
        ingredients,
    })
}

pub struct RecipeSubmitter<A: RecipeApi + ?Sized> {
    api: Arc<A>,
    state: watch::Sender<SubmissionState>,
}

impl<A: RecipeApi + ?Sized> RecipeSubmitter<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self { api, state }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Validate and send the form's draft.
    pub async fn submit<P, L, S>(
        &self,
        form: &mut RecipeForm,
        sessions: &SessionStore<P>,
        persistence: &DraftPersistence<L, S>,
    ) -> SubmitOutcome
    where
        P: KeyValueStore,
        L: KeyValueStore + 'static,
        S: KeyValueStore,
    {
        let started = self.state.send_if_modified(|state| {
            if *state == SubmissionState::Submitting {
                false
            } else {
                *state = SubmissionState::Submitting;
                true
            }
        });
        if !started {
            return SubmitOutcome::Busy;
        }

        if !form.validate() {
            self.state.send_replace(SubmissionState::Idle);
            return SubmitOutcome::Invalid(form.errors().clone());
        }

        let Some(token) = sessions.token() else {
            self.state.send_replace(SubmissionState::Idle);
            return SubmitOutcome::Unauthorized {
                message: messages::LOGIN_REQUIRED,
                redirect: LOGIN_REDIRECT,
            };
        };

        let Some(request) = build_request(form.draft()) else {
            self.state.send_replace(SubmissionState::Idle);
            return SubmitOutcome::Invalid(form.errors().clone());
        };
        let image = form.draft().image.clone();

        tracing::debug!(
            name = %request.name,
            steps = request.steps.len(),
            ingredients = request.ingredients.len(),
            with_image = image.is_some(),
            "submitting recipe"
        );

        match self
            .api
            .create_recipe(&token, &request, image.as_deref())
            .await
        {
            Ok(recipe) => {
                if let Err(e) = persistence.clear() {
                    tracing::warn!(error = %e, "submit: failed to clear draft backup");
                }
                form.reset();
                tracing::info!(recipe_id = %recipe.id, "recipe created");
                self.state.send_replace(SubmissionState::Success {
                    recipe_id: recipe.id.clone(),
                });
                SubmitOutcome::Created {
                    redirect: recipe_redirect(&recipe.id),
                    recipe,
                }
            }
            Err(e) => {
                let status = e.status();
                let message = failure_message(&e);
                tracing::error!(error = %e, status = ?status, "recipe submission failed");
                self.state.send_replace(SubmissionState::Error {
                    message: message.to_string(),
                });

                if status == Some(401) {
                    if let Err(e) = sessions.clear() {
                        tracing::warn!(error = %e, "submit: failed to clear session");
                    }
                    return SubmitOutcome::Unauthorized {
                        message,
                        redirect: LOGIN_REDIRECT,
                    };
                }
                SubmitOutcome::Failed { status, message }
            }
        }
    }
}
