//! Client-side validation of a recipe draft.
//!
//! All rules are pure functions of the draft. Messages are user-facing and
//! in Polish, matching what the rest of the application shows.

use crate::draft::{DraftIngredient, DraftRecipe, DraftStep};
use crate::types::Complexity;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_PREPARATION_MINUTES: i32 = 999;
pub const MAX_STEP_CHARS: usize = 500;
pub const MAX_SUBSTITUTE_CHARS: usize = 100;

pub mod messages {
    pub const NAME_REQUIRED: &str = "Nazwa przepisu jest wymagana";
    pub const NAME_TOO_LONG: &str = "Nazwa przepisu nie może przekraczać 100 znaków";
    pub const TIME_REQUIRED: &str = "Czas przygotowania jest wymagany";
    pub const TIME_NOT_POSITIVE: &str = "Czas przygotowania musi być większy od 0";
    pub const TIME_TOO_LONG: &str = "Czas przygotowania nie może przekraczać 999 minut";
    pub const COMPLEXITY_REQUIRED: &str = "Wybierz poziom trudności";
    pub const NO_INGREDIENTS: &str = "Przepis musi zawierać co najmniej jeden składnik";
    pub const NO_STEPS: &str = "Przepis musi zawierać co najmniej jeden krok";
    pub const INGREDIENT_REQUIRED: &str = "Wybierz składnik";
    pub const AMOUNT_NOT_POSITIVE: &str = "Ilość musi być większa od 0";
    pub const SUBSTITUTE_TOO_LONG: &str = "Zamiennik nie może przekraczać 100 znaków";
    pub const STEP_REQUIRED: &str = "Opis kroku jest wymagany";
    pub const STEP_TOO_LONG: &str = "Opis kroku nie może przekraczać 500 znaków";
}

/// Per-field errors of one ingredient line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientErrors {
    pub ingredient_id: Option<String>,
    pub amount: Option<String>,
    pub substitute_recommendation: Option<String>,
}

impl IngredientErrors {
    pub fn is_empty(&self) -> bool {
        self.ingredient_id.is_none()
            && self.amount.is_none()
            && self.substitute_recommendation.is_none()
    }
}

/// Which part of an ingredient line was edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientField {
    IngredientId,
    Amount,
    Substitute,
}

/// A single clearable slot in the error bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    PreparationTime,
    Complexity,
    General,
    Step(usize),
    Ingredient(usize, IngredientField),
}

/// Error bag mirroring the shape of the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub name: Option<String>,
    pub preparation_time_minutes: Option<String>,
    pub complexity_level: Option<String>,
    /// Parallel to `DraftRecipe::ingredients`.
    pub ingredients: Vec<IngredientErrors>,
    /// Parallel to `DraftRecipe::steps`.
    pub steps: Vec<Option<String>>,
    pub general: Option<String>,
}

impl ValidationErrors {
    pub fn is_valid(&self) -> bool {
        self.name.is_none()
            && self.preparation_time_minutes.is_none()
            && self.complexity_level.is_none()
            && self.general.is_none()
            && self.ingredients.iter().all(IngredientErrors::is_empty)
            && self.steps.iter().all(Option::is_none)
    }

    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Name => self.name = None,
            Field::PreparationTime => self.preparation_time_minutes = None,
            Field::Complexity => self.complexity_level = None,
            Field::General => self.general = None,
            Field::Step(index) => {
                if let Some(slot) = self.steps.get_mut(index) {
                    *slot = None;
                }
            }
            Field::Ingredient(index, part) => {
                if let Some(errors) = self.ingredients.get_mut(index) {
                    match part {
                        IngredientField::IngredientId => errors.ingredient_id = None,
                        IngredientField::Amount => errors.amount = None,
                        IngredientField::Substitute => errors.substitute_recommendation = None,
                    }
                }
            }
        }
    }

    /// Every message in display order, for summaries.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.extend(self.general.clone());
        out.extend(self.name.clone());
        out.extend(self.preparation_time_minutes.clone());
        out.extend(self.complexity_level.clone());
        for (index, errors) in self.ingredients.iter().enumerate() {
            for message in [
                &errors.ingredient_id,
                &errors.amount,
                &errors.substitute_recommendation,
            ]
            .into_iter()
            .flatten()
            {
                out.push(format!("Składnik {}: {}", index + 1, message));
            }
        }
        for (index, message) in self.steps.iter().enumerate() {
            if let Some(message) = message {
                out.push(format!("Krok {}: {}", index + 1, message));
            }
        }
        out
    }
}

pub fn validate_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Some(messages::NAME_REQUIRED.to_string())
    } else if trimmed.chars().count() > MAX_NAME_CHARS {
        Some(messages::NAME_TOO_LONG.to_string())
    } else {
        None
    }
}

pub fn validate_preparation_time(minutes: Option<i32>) -> Option<String> {
    match minutes {
        None => Some(messages::TIME_REQUIRED.to_string()),
        Some(m) if m <= 0 => Some(messages::TIME_NOT_POSITIVE.to_string()),
        Some(m) if m > MAX_PREPARATION_MINUTES => Some(messages::TIME_TOO_LONG.to_string()),
        Some(_) => None,
    }
}

pub fn validate_complexity(level: Option<Complexity>) -> Option<String> {
    match level {
        Some(level) if Complexity::ALL.contains(&level) => None,
        _ => Some(messages::COMPLEXITY_REQUIRED.to_string()),
    }
}

pub fn validate_ingredient(line: &DraftIngredient) -> IngredientErrors {
    IngredientErrors {
        ingredient_id: line
            .ingredient_id
            .trim()
            .is_empty()
            .then(|| messages::INGREDIENT_REQUIRED.to_string()),
        amount: (!line.amount.is_finite() || line.amount <= 0.0)
            .then(|| messages::AMOUNT_NOT_POSITIVE.to_string()),
        substitute_recommendation: (line.substitute_recommendation.trim().chars().count()
            > MAX_SUBSTITUTE_CHARS)
            .then(|| messages::SUBSTITUTE_TOO_LONG.to_string()),
    }
}

pub fn validate_step(step: &DraftStep) -> Option<String> {
    let trimmed = step.description.trim();
    if trimmed.is_empty() {
        Some(messages::STEP_REQUIRED.to_string())
    } else if trimmed.chars().count() > MAX_STEP_CHARS {
        Some(messages::STEP_TOO_LONG.to_string())
    } else {
        None
    }
}

/// Validate the whole draft. The image is checked when it is attached, not here.
pub fn validate_draft(draft: &DraftRecipe) -> ValidationErrors {
    let general = if draft.ingredients.is_empty() {
        Some(messages::NO_INGREDIENTS.to_string())
    } else if draft.steps.is_empty() {
        Some(messages::NO_STEPS.to_string())
    } else {
        None
    };

    ValidationErrors {
        name: validate_name(&draft.name),
        preparation_time_minutes: validate_preparation_time(draft.preparation_time_minutes),
        complexity_level: validate_complexity(draft.complexity_level),
        ingredients: draft.ingredients.iter().map(validate_ingredient).collect(),
        steps: draft.steps.iter().map(validate_step).collect(),
        general,
    }
}
