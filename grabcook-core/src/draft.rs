//! The in-progress recipe and its persisted snapshot.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::image::AttachedImage;
use crate::types::Complexity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftStep {
    /// 1-based position, kept contiguous by [`renumber_steps`].
    pub step: u32,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftIngredient {
    pub ingredient_id: String,
    pub amount: f64,
    #[serde(default)]
    pub is_optional: bool,
    /// Empty when there is no substitute.
    #[serde(default)]
    pub substitute_recommendation: String,
}

impl DraftIngredient {
    pub fn new(ingredient_id: impl Into<String>, amount: f64) -> Self {
        Self {
            ingredient_id: ingredient_id.into(),
            amount,
            is_optional: false,
            substitute_recommendation: String::new(),
        }
    }
}

/// Recipe being composed in the form.
#[derive(Debug, Clone, Default)]
pub struct DraftRecipe {
    pub name: String,
    /// Kept signed so out-of-range input survives until validation reports it.
    pub preparation_time_minutes: Option<i32>,
    pub complexity_level: Option<Complexity>,
    pub steps: Vec<DraftStep>,
    pub ingredients: Vec<DraftIngredient>,
    pub image: Option<Arc<AttachedImage>>,
}

impl DraftRecipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing worth saving has been entered yet.
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.preparation_time_minutes.is_none()
            && self.ingredients.is_empty()
            && self.steps.is_empty()
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            name: self.name.clone(),
            preparation_time_minutes: self.preparation_time_minutes,
            complexity_level: self.complexity_level,
            steps: self.steps.clone(),
            ingredients: self.ingredients.clone(),
        }
    }
}

/// Draft as stored on disk. The image is never part of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preparation_time_minutes: Option<i32>,
    #[serde(default)]
    pub complexity_level: Option<Complexity>,
    #[serde(default)]
    pub steps: Vec<DraftStep>,
    #[serde(default)]
    pub ingredients: Vec<DraftIngredient>,
}

impl From<DraftSnapshot> for DraftRecipe {
    fn from(snapshot: DraftSnapshot) -> Self {
        let mut steps = snapshot.steps;
        renumber_steps(&mut steps);
        Self {
            name: snapshot.name,
            preparation_time_minutes: snapshot.preparation_time_minutes,
            complexity_level: snapshot.complexity_level,
            steps,
            ingredients: snapshot.ingredients,
            image: None,
        }
    }
}

/// Merge-style update of the scalar fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    pub name: Option<String>,
    pub preparation_time_minutes: Option<Option<i32>>,
    pub complexity_level: Option<Option<Complexity>>,
}

impl DraftPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn preparation_time(minutes: Option<i32>) -> Self {
        Self {
            preparation_time_minutes: Some(minutes),
            ..Default::default()
        }
    }

    pub fn complexity(level: Option<Complexity>) -> Self {
        Self {
            complexity_level: Some(level),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.preparation_time_minutes.is_none()
            && self.complexity_level.is_none()
    }
}

/// Rewrite step positions as 1..=n in list order.
pub fn renumber_steps(steps: &mut [DraftStep]) {
    for (index, step) in steps.iter_mut().enumerate() {
        step.step = index as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_is_empty() {
        assert!(DraftRecipe::new().is_empty());
    }

    #[test]
    fn test_whitespace_name_still_empty() {
        let draft = DraftRecipe {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert!(draft.is_empty());
    }

    #[test]
    fn test_complexity_alone_does_not_count() {
        let draft = DraftRecipe {
            complexity_level: Some(Complexity::Hard),
            ..Default::default()
        };
        assert!(draft.is_empty());
    }

    #[test]
    fn test_time_makes_draft_non_empty() {
        let draft = DraftRecipe {
            preparation_time_minutes: Some(10),
            ..Default::default()
        };
        assert!(!draft.is_empty());
    }

    #[test]
    fn test_snapshot_restores_contiguous_steps() {
        let snapshot = DraftSnapshot {
            steps: vec![
                DraftStep {
                    step: 4,
                    description: "a".to_string(),
                },
                DraftStep {
                    step: 9,
                    description: "b".to_string(),
                },
            ],
            ..Default::default()
        };
        let draft = DraftRecipe::from(snapshot);
        let positions: Vec<u32> = draft.steps.iter().map(|s| s.step).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: DraftSnapshot = serde_json::from_str(r#"{"name": "Zupa"}"#).unwrap();
        assert_eq!(snapshot.name, "Zupa");
        assert!(snapshot.steps.is_empty());
    }
}
