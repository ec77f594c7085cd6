//! End-to-end flows over an on-disk store and the in-process API.

use chrono::{Duration as ChronoDuration, Utc};
use grabcook_core::catalog::CachedCatalog;
use grabcook_core::storage::INGREDIENTS_CACHE_KEY;
use grabcook_core::{
    storage, CatalogIngredient, CatalogSource, Complexity, DraftIngredient, DraftPatch,
    DraftPersistence, FileStore, IngredientCatalog, MemoryStore, MockApi, MockCall, RecipeForm,
    RecipeSubmitter, SessionStore, SubmitOutcome, UnitType,
};
use std::sync::Arc;
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(1000);

fn egg() -> CatalogIngredient {
    CatalogIngredient {
        id: "egg".to_string(),
        name: "Jajka".to_string(),
        unit_type: UnitType::Szt,
    }
}

#[tokio::test]
async fn test_draft_survives_restart_and_submits() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(FileStore::new(dir.path().join("storage")));
    let api = Arc::new(MockApi::new().with_ingredients(vec![egg()]));

    // First run: start a recipe and quit before finishing it.
    {
        let persistence =
            DraftPersistence::new(local.clone(), Arc::new(MemoryStore::new()), DEBOUNCE);
        let mut form = RecipeForm::new();
        form.apply(DraftPatch::name("Jajecznica"));
        persistence.schedule_save(form.draft());
        form.apply(DraftPatch::preparation_time(Some(10)));
        form.add_ingredient(DraftIngredient::new("egg", 3.0));
        persistence.schedule_save(form.draft());
        persistence.flush().unwrap();
    }

    // Second run: the backup is offered once and restored.
    let persistence = DraftPersistence::new(local.clone(), Arc::new(MemoryStore::new()), DEBOUNCE);
    let stored = persistence.offer_restore().expect("backup offered");
    assert!(persistence.offer_restore().is_none());

    let mut form = RecipeForm::from_draft(stored.into());
    assert_eq!(form.draft().name, "Jajecznica");
    assert_eq!(form.draft().preparation_time_minutes, Some(10));
    assert_eq!(form.draft().ingredients.len(), 1);

    let sessions = SessionStore::new(local.clone());
    let submitter = RecipeSubmitter::new(api.clone());

    // Not finished yet: complexity and steps are missing.
    match submitter.submit(&mut form, &sessions, &persistence).await {
        SubmitOutcome::Invalid(errors) => assert!(!errors.messages().is_empty()),
        other => panic!("expected Invalid, got {:?}", other),
    }

    form.apply(DraftPatch::complexity(Some(Complexity::Easy)));
    form.add_step("Roztrzep jajka");
    form.add_step("Smaż na maśle, mieszając");

    // Logged out: nothing is sent and the draft stays.
    assert!(matches!(
        submitter.submit(&mut form, &sessions, &persistence).await,
        SubmitOutcome::Unauthorized { redirect: "/login", .. }
    ));

    sessions
        .login(&*api, "ala@example.com", "haslo123")
        .await
        .unwrap();
    match submitter.submit(&mut form, &sessions, &persistence).await {
        SubmitOutcome::Created { recipe, redirect } => {
            assert_eq!(redirect, format!("/recipes/{}", recipe.id));
            assert_eq!(recipe.steps.len(), 2);
        }
        other => panic!("expected Created, got {:?}", other),
    }

    assert!(form.draft().is_empty());
    assert!(!persistence.has_backup());
    assert_eq!(
        api.count(|c| matches!(c, MockCall::CreateRecipe { .. })),
        1
    );
}

#[tokio::test]
async fn test_catalog_cache_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(FileStore::new(dir.path().to_path_buf()));
    let api = Arc::new(MockApi::new().with_ingredients(vec![egg()]));

    // Written four minutes ago: still fresh.
    let entry = CachedCatalog {
        ingredients: vec![egg()],
        fetched_at: Utc::now() - ChronoDuration::minutes(4),
    };
    storage::set_json(&*local, INGREDIENTS_CACHE_KEY, &entry).unwrap();

    let catalog = IngredientCatalog::new(api.clone(), local.clone());
    let load = catalog.load().await;
    assert_eq!(load.source, CatalogSource::Cache);
    assert!(api.calls().is_empty());

    // Written six minutes ago: refetched.
    let entry = CachedCatalog {
        fetched_at: Utc::now() - ChronoDuration::minutes(6),
        ..entry
    };
    storage::set_json(&*local, INGREDIENTS_CACHE_KEY, &entry).unwrap();

    let load = catalog.load().await;
    assert_eq!(load.source, CatalogSource::Network);
    assert_eq!(load.ingredients, vec![egg()]);
    assert_eq!(api.calls().len(), 1);
}
