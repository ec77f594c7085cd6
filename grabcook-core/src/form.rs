//! Form state for authoring a recipe.
//!
//! [`RecipeForm`] owns the draft and its error bag. Edits go through it so
//! that step positions stay contiguous and stale error messages disappear as
//! soon as the user touches the offending field.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::draft::{renumber_steps, DraftIngredient, DraftPatch, DraftRecipe, DraftStep};
use crate::error::StorageError;
use crate::image::AttachedImage;
use crate::storage::{self, KeyValueStore, FORM_STATE_KEY};
use crate::validation::{self, Field, IngredientErrors, IngredientField, ValidationErrors};

/// Partial update of one ingredient line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientPatch {
    pub ingredient_id: Option<String>,
    pub amount: Option<f64>,
    pub is_optional: Option<bool>,
    pub substitute_recommendation: Option<String>,
}

#[derive(Debug, Default)]
pub struct RecipeForm {
    draft: DraftRecipe,
    errors: ValidationErrors,
}

impl RecipeForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing draft, e.g. a restored backup.
    pub fn from_draft(draft: DraftRecipe) -> Self {
        Self {
            draft,
            errors: ValidationErrors::default(),
        }
    }

    pub fn draft(&self) -> &DraftRecipe {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Merge `patch` into the draft and clear the errors of every touched field.
    pub fn apply(&mut self, patch: DraftPatch) {
        if let Some(name) = patch.name {
            self.draft.name = name;
            self.errors.clear(Field::Name);
        }
        if let Some(minutes) = patch.preparation_time_minutes {
            self.draft.preparation_time_minutes = minutes;
            self.errors.clear(Field::PreparationTime);
        }
        if let Some(level) = patch.complexity_level {
            self.draft.complexity_level = level;
            self.errors.clear(Field::Complexity);
        }
    }

    /// Append a step and return its 1-based position.
    pub fn add_step(&mut self, description: impl Into<String>) -> u32 {
        self.draft.steps.push(DraftStep {
            step: 0,
            description: description.into(),
        });
        renumber_steps(&mut self.draft.steps);
        self.sync_step_errors();
        self.errors.clear(Field::General);
        self.draft.steps.len() as u32
    }

    /// Replace the description of the step at `position` (1-based).
    pub fn update_step(&mut self, position: u32, description: impl Into<String>) -> bool {
        let Some(index) = self.step_index(position) else {
            return false;
        };
        self.draft.steps[index].description = description.into();
        self.errors.clear(Field::Step(index));
        true
    }

    pub fn remove_step(&mut self, position: u32) -> Option<DraftStep> {
        let index = self.step_index(position)?;
        let removed = self.draft.steps.remove(index);
        if index < self.errors.steps.len() {
            self.errors.steps.remove(index);
        }
        renumber_steps(&mut self.draft.steps);
        Some(removed)
    }

    /// Move the step at `from` so that it ends up at position `to`.
    pub fn move_step(&mut self, from: u32, to: u32) -> bool {
        let (Some(from), Some(to)) = (self.step_index(from), self.step_index(to)) else {
            return false;
        };
        let step = self.draft.steps.remove(from);
        self.draft.steps.insert(to, step);
        if from < self.errors.steps.len() && to < self.errors.steps.len() {
            let error = self.errors.steps.remove(from);
            self.errors.steps.insert(to, error);
        }
        renumber_steps(&mut self.draft.steps);
        true
    }

    /// Append an ingredient line and return its index.
    pub fn add_ingredient(&mut self, line: DraftIngredient) -> usize {
        self.draft.ingredients.push(line);
        self.sync_ingredient_errors();
        self.errors.clear(Field::General);
        self.draft.ingredients.len() - 1
    }

    pub fn update_ingredient(&mut self, index: usize, patch: IngredientPatch) -> bool {
        let Some(line) = self.draft.ingredients.get_mut(index) else {
            return false;
        };
        if let Some(id) = patch.ingredient_id {
            line.ingredient_id = id;
            self.errors
                .clear(Field::Ingredient(index, IngredientField::IngredientId));
        }
        if let Some(amount) = patch.amount {
            line.amount = amount;
            self.errors
                .clear(Field::Ingredient(index, IngredientField::Amount));
        }
        if let Some(optional) = patch.is_optional {
            line.is_optional = optional;
        }
        if let Some(substitute) = patch.substitute_recommendation {
            line.substitute_recommendation = substitute;
            self.errors
                .clear(Field::Ingredient(index, IngredientField::Substitute));
        }
        true
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Option<DraftIngredient> {
        if index >= self.draft.ingredients.len() {
            return None;
        }
        if index < self.errors.ingredients.len() {
            self.errors.ingredients.remove(index);
        }
        Some(self.draft.ingredients.remove(index))
    }

    pub fn set_image(&mut self, image: Arc<AttachedImage>) {
        self.draft.image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.draft.image = None;
    }

    /// Recompute the whole error bag. Returns true when the draft is valid.
    pub fn validate(&mut self) -> bool {
        self.errors = validation::validate_draft(&self.draft);
        self.errors.is_valid()
    }

    /// Back to an empty draft with no errors.
    pub fn reset(&mut self) {
        self.draft = DraftRecipe::default();
        self.errors = ValidationErrors::default();
    }

    pub fn progress(&self) -> FormProgress {
        FormProgress::of(&self.draft)
    }

    fn step_index(&self, position: u32) -> Option<usize> {
        let index = (position as usize).checked_sub(1)?;
        (index < self.draft.steps.len()).then_some(index)
    }

    fn sync_step_errors(&mut self) {
        if !self.errors.steps.is_empty() {
            self.errors.steps.resize(self.draft.steps.len(), None);
        }
    }

    fn sync_ingredient_errors(&mut self) {
        if !self.errors.ingredients.is_empty() {
            self.errors
                .ingredients
                .resize(self.draft.ingredients.len(), IngredientErrors::default());
        }
    }
}

/// Which sections of the form are filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormProgress {
    pub basic_info: bool,
    pub image: bool,
    pub ingredients: bool,
    pub steps: bool,
}

impl FormProgress {
    pub fn of(draft: &DraftRecipe) -> Self {
        Self {
            basic_info: validation::validate_name(&draft.name).is_none()
                && validation::validate_preparation_time(draft.preparation_time_minutes)
                    .is_none()
                && validation::validate_complexity(draft.complexity_level).is_none(),
            image: draft.image.is_some(),
            ingredients: !draft.ingredients.is_empty()
                && draft
                    .ingredients
                    .iter()
                    .all(|line| validation::validate_ingredient(line).is_empty()),
            steps: !draft.steps.is_empty()
                && draft
                    .steps
                    .iter()
                    .all(|step| validation::validate_step(step).is_none()),
        }
    }

    pub fn completed_sections(&self) -> usize {
        [self.basic_info, self.image, self.ingredients, self.steps]
            .iter()
            .filter(|done| **done)
            .count()
    }

    pub fn percent(&self) -> u8 {
        (self.completed_sections() * 25) as u8
    }
}

/// Mirrors form progress into session storage for display.
pub struct FormProgressTracker<S: KeyValueStore> {
    session: Arc<S>,
}

impl<S: KeyValueStore> FormProgressTracker<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self { session }
    }

    pub fn record(&self, form: &RecipeForm) -> Result<FormProgress, StorageError> {
        let progress = form.progress();
        storage::set_json(&*self.session, FORM_STATE_KEY, &progress)?;
        Ok(progress)
    }

    /// Last recorded progress. Unreadable entries count as no progress.
    pub fn last(&self) -> FormProgress {
        storage::get_json(&*self.session, FORM_STATE_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.session.remove(FORM_STATE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::Complexity;
    use crate::validation::messages;

    fn positions(form: &RecipeForm) -> Vec<u32> {
        form.draft().steps.iter().map(|s| s.step).collect()
    }

    fn descriptions(form: &RecipeForm) -> Vec<&str> {
        form.draft()
            .steps
            .iter()
            .map(|s| s.description.as_str())
            .collect()
    }

    #[test]
    fn test_apply_merges_fields() {
        let mut form = RecipeForm::new();
        form.apply(DraftPatch::name("Bigos"));
        form.apply(DraftPatch::preparation_time(Some(120)));
        assert_eq!(form.draft().name, "Bigos");
        assert_eq!(form.draft().preparation_time_minutes, Some(120));
        assert_eq!(form.draft().complexity_level, None);
    }

    #[test]
    fn test_editing_clears_only_that_error() {
        let mut form = RecipeForm::new();
        assert!(!form.validate());
        assert!(form.errors().name.is_some());
        assert!(form.errors().preparation_time_minutes.is_some());

        form.apply(DraftPatch::name("Bigos"));
        assert_eq!(form.errors().name, None);
        assert_eq!(
            form.errors().preparation_time_minutes.as_deref(),
            Some(messages::TIME_REQUIRED)
        );
    }

    #[test]
    fn test_steps_renumber_on_add_remove_move() {
        let mut form = RecipeForm::new();
        form.add_step("pokrój");
        form.add_step("podsmaż");
        form.add_step("dus");
        assert_eq!(positions(&form), vec![1, 2, 3]);

        assert!(form.move_step(3, 1));
        assert_eq!(descriptions(&form), vec!["dus", "pokrój", "podsmaż"]);
        assert_eq!(positions(&form), vec![1, 2, 3]);

        let removed = form.remove_step(2).unwrap();
        assert_eq!(removed.description, "pokrój");
        assert_eq!(positions(&form), vec![1, 2]);
        assert_eq!(descriptions(&form), vec!["dus", "podsmaż"]);
    }

    #[test]
    fn test_out_of_range_step_positions() {
        let mut form = RecipeForm::new();
        form.add_step("a");
        assert!(form.remove_step(0).is_none());
        assert!(form.remove_step(2).is_none());
        assert!(!form.move_step(1, 5));
        assert!(!form.update_step(9, "x"));
    }

    #[test]
    fn test_step_errors_follow_reorder() {
        let mut form = RecipeForm::new();
        form.add_step("ok");
        form.add_step("");
        form.validate();
        assert_eq!(form.errors().steps, vec![None, Some(messages::STEP_REQUIRED.to_string())]);

        form.move_step(2, 1);
        assert_eq!(form.errors().steps[0].as_deref(), Some(messages::STEP_REQUIRED));

        form.update_step(1, "teraz dobrze");
        assert_eq!(form.errors().steps[0], None);
    }

    #[test]
    fn test_adding_step_clears_general_error() {
        let mut form = RecipeForm::new();
        form.add_ingredient(DraftIngredient::new("salt", 1.0));
        form.validate();
        assert_eq!(form.errors().general.as_deref(), Some(messages::NO_STEPS));
        form.add_step("posól");
        assert_eq!(form.errors().general, None);
    }

    #[test]
    fn test_ingredient_edits() {
        let mut form = RecipeForm::new();
        let index = form.add_ingredient(DraftIngredient::new("", 0.0));
        form.validate();
        assert!(form.errors().ingredients[index].ingredient_id.is_some());
        assert!(form.errors().ingredients[index].amount.is_some());

        form.update_ingredient(
            index,
            IngredientPatch {
                ingredient_id: Some("flour".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(form.errors().ingredients[index].ingredient_id, None);
        assert!(form.errors().ingredients[index].amount.is_some());

        assert!(form.remove_ingredient(index).is_some());
        assert!(form.draft().ingredients.is_empty());
        assert!(form.errors().ingredients.is_empty());
        assert!(!form.update_ingredient(0, IngredientPatch::default()));
    }

    #[test]
    fn test_reset() {
        let mut form = RecipeForm::new();
        form.apply(DraftPatch::name("x"));
        form.validate();
        form.reset();
        assert!(form.draft().is_empty());
        assert_eq!(form.errors(), &ValidationErrors::default());
    }

    #[test]
    fn test_progress_sections() {
        let mut form = RecipeForm::new();
        assert_eq!(form.progress().percent(), 0);

        form.apply(DraftPatch {
            name: Some("Placki".to_string()),
            preparation_time_minutes: Some(Some(30)),
            complexity_level: Some(Some(Complexity::Medium)),
        });
        form.add_step("usmaż");
        let progress = form.progress();
        assert!(progress.basic_info);
        assert!(progress.steps);
        assert!(!progress.ingredients);
        assert_eq!(progress.percent(), 50);
    }

    #[test]
    fn test_progress_tracker_uses_session_store() {
        let session = Arc::new(MemoryStore::new());
        let tracker = FormProgressTracker::new(session.clone());
        let mut form = RecipeForm::new();
        form.add_step("krok");

        let recorded = tracker.record(&form).unwrap();
        assert!(recorded.steps);
        assert_eq!(tracker.last(), recorded);
        assert!(session.get(FORM_STATE_KEY).unwrap().is_some());

        tracker.clear().unwrap();
        assert_eq!(tracker.last(), FormProgress::default());
    }
}
