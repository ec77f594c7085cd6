//! Draft backup with debounced writes.
//!
//! Every edit schedules a save; the write happens once the user has been idle
//! for the debounce window. Callers must [`DraftPersistence::flush`] before the
//! process exits so the last edits are not lost.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::draft::{DraftRecipe, DraftSnapshot};
use crate::error::StorageError;
use crate::storage::{self, KeyValueStore, FORM_BACKUP_KEY, RESTORE_OFFERED_KEY};

pub struct DraftPersistence<L: KeyValueStore + 'static, S: KeyValueStore> {
    local: Arc<L>,
    session: Arc<S>,
    debounce: Duration,
    pending: Arc<Mutex<Option<DraftSnapshot>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<L: KeyValueStore + 'static, S: KeyValueStore> DraftPersistence<L, S> {
    /// `local` keeps the backup across restarts, `session` holds the
    /// once-per-session restore flag.
    pub fn new(local: Arc<L>, session: Arc<S>, debounce: Duration) -> Self {
        Self {
            local,
            session,
            debounce,
            pending: Arc::new(Mutex::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Queue a save of `draft`, replacing any save still waiting.
    ///
    /// Empty drafts are never written. Must be called within a Tokio runtime.
    pub fn schedule_save(&self, draft: &DraftRecipe) {
        self.cancel_task();

        if draft.is_empty() {
            *lock(&self.pending) = None;
            return;
        }
        *lock(&self.pending) = Some(draft.snapshot());

        let local = Arc::clone(&self.local);
        let pending = Arc::clone(&self.pending);
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let snapshot = lock(&pending).take();
            if let Some(snapshot) = snapshot {
                if let Err(e) = write_backup(&*local, snapshot) {
                    tracing::warn!(error = %e, "draft backup: debounced save failed");
                }
            }
        });
        *lock(&self.task) = Some(handle);
    }

    /// Write the pending snapshot now. Returns whether anything was written.
    pub fn flush(&self) -> Result<bool, StorageError> {
        self.cancel_task();
        let snapshot = lock(&self.pending).take();
        match snapshot {
            Some(snapshot) => {
                write_backup(&*self.local, snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// True while a save is waiting for the debounce window.
    pub fn is_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Stored backup, if any. Unreadable backups are discarded.
    pub fn load(&self) -> Option<DraftSnapshot> {
        match storage::get_json(&*self.local, FORM_BACKUP_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "draft backup: discarding unreadable backup");
                None
            }
        }
    }

    pub fn has_backup(&self) -> bool {
        self.load().is_some()
    }

    /// Delete the backup and drop any pending save.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.cancel_task();
        *lock(&self.pending) = None;
        self.local.remove(FORM_BACKUP_KEY)?;
        tracing::debug!("draft backup: cleared");
        Ok(())
    }

    /// The backup, the first time it is asked for in this session.
    pub fn offer_restore(&self) -> Option<DraftSnapshot> {
        match self.session.get(RESTORE_OFFERED_KEY) {
            Ok(Some(_)) => return None,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "draft backup: cannot read restore flag");
                return None;
            }
        }

        let stored = self.load()?;
        if let Err(e) = self.session.set(RESTORE_OFFERED_KEY, "true") {
            tracing::warn!(error = %e, "draft backup: cannot record restore flag");
        }
        Some(stored)
    }

    fn cancel_task(&self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

impl<L: KeyValueStore + 'static, S: KeyValueStore> Drop for DraftPersistence<L, S> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "draft backup: final save failed");
        }
    }
}

fn write_backup(store: &dyn KeyValueStore, draft: DraftSnapshot) -> Result<(), StorageError> {
    storage::set_json(store, FORM_BACKUP_KEY, &draft)?;
    tracing::debug!(name = %draft.name, "draft backup: saved");
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
