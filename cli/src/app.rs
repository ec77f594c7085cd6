use anyhow::{bail, Context, Result};
use grabcook_core::{
    ClientConfig, DraftPersistence, DraftRecipe, FileStore, FormProgress, FormProgressTracker,
    HttpApiClient, HttpApiClientBuilder, IngredientCatalog, MemoryStore, RecipeForm,
    SessionStore,
};

/// Shown when an edit would leave a draft that is never written to disk.
pub const NOTHING_TO_STORE: &str =
    "Najpierw podaj nazwę lub czas przygotowania, sam poziom trudności nie zostanie zapisany.";
use std::sync::Arc;

/// Everything a command needs: the API client and the stores behind it.
///
/// The process is the session: `session` lives in memory and is gone on
/// exit, `local` is the on-disk store under the data directory.
pub struct App {
    pub config: ClientConfig,
    pub api: Arc<HttpApiClient>,
    pub local: Arc<FileStore>,
    pub sessions: SessionStore<FileStore>,
    pub persistence: DraftPersistence<FileStore, MemoryStore>,
    progress: FormProgressTracker<MemoryStore>,
}

impl App {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = HttpApiClientBuilder::from_config(&config)
            .user_agent(format!("grabcook-cli/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let local = Arc::new(FileStore::new(config.storage_dir()));
        let session = Arc::new(MemoryStore::new());
        tracing::debug!(api = %config.api_url, storage = %local.dir().display(), "starting");

        Ok(Self {
            api: Arc::new(api),
            sessions: SessionStore::new(local.clone()),
            persistence: DraftPersistence::new(
                local.clone(),
                session.clone(),
                config.draft_debounce,
            ),
            progress: FormProgressTracker::new(session),
            local,
            config,
        })
    }

    pub fn catalog(&self) -> IngredientCatalog<HttpApiClient, FileStore> {
        IngredientCatalog::new(self.api.clone(), self.local.clone())
    }

    /// The stored draft, or an empty form when there is none.
    pub fn open_form(&self) -> RecipeForm {
        match self.persistence.offer_restore() {
            Some(stored) => {
                tracing::debug!(name = %stored.name, "restoring draft");
                RecipeForm::from_draft(stored.into())
            }
            None => RecipeForm::new(),
        }
    }

    /// Queue the form for saving and record its progress.
    ///
    /// The backup is the only state that outlives the process, so an edit
    /// that would be skipped as empty is refused instead.
    pub fn save_form(&self, form: &RecipeForm) -> Result<FormProgress> {
        ensure_storable(form.draft())?;
        if form.draft().is_empty() {
            self.persistence
                .clear()
                .context("Failed to remove draft backup")?;
        } else {
            self.persistence.schedule_save(form.draft());
        }
        self.progress
            .record(form)
            .context("Failed to record form progress")
    }

    /// Write pending draft edits before exit.
    pub fn shutdown(&self) -> Result<()> {
        if self
            .persistence
            .flush()
            .context("Failed to save draft backup")?
        {
            tracing::debug!("draft saved on exit");
        }
        Ok(())
    }

    pub fn require_token(&self) -> Result<String> {
        self.sessions
            .token()
            .context("Nie jesteś zalogowany. Użyj `grabcook login`.")
    }
}

/// Fails for drafts that hold input but would not be saved.
fn ensure_storable(draft: &DraftRecipe) -> Result<()> {
    if draft.is_empty() && draft.complexity_level.is_some() {
        bail!(NOTHING_TO_STORE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grabcook_core::{Complexity, DraftPatch};

    #[test]
    fn test_complexity_alone_is_refused() {
        let mut form = RecipeForm::new();
        form.apply(DraftPatch::complexity(Some(Complexity::Hard)));

        let err = ensure_storable(form.draft()).unwrap_err();
        assert_eq!(err.to_string(), NOTHING_TO_STORE);
    }

    #[test]
    fn test_complexity_with_name_is_stored() {
        let mut form = RecipeForm::new();
        form.apply(DraftPatch::name("Bigos"));
        form.apply(DraftPatch::complexity(Some(Complexity::Hard)));
        assert!(ensure_storable(form.draft()).is_ok());
    }

    #[test]
    fn test_blank_draft_is_cleared_not_refused() {
        assert!(ensure_storable(&DraftRecipe::new()).is_ok());
    }
}
