use std::sync::{Mutex, MutexGuard};

use super::{RepositoryError, Store, Tables};

/// Mutex-guarded tables. Writes run on a cloned working copy, so a failed
/// closure leaves the committed state untouched.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// Clone of the committed state.
    pub fn snapshot(&self) -> Result<Tables, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Runs `f` on a working copy, then `persist`, then swaps the copy in.
    pub(crate) fn commit_with<T, E, F, P>(&self, f: F, persist: P) -> Result<T, E>
    where
        F: FnOnce(&mut Tables) -> Result<T, E>,
        P: FnOnce(&Tables) -> Result<(), RepositoryError>,
        E: From<RepositoryError>,
    {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        let value = f(&mut working)?;
        persist(&working)?;
        *guard = working;
        Ok(value)
    }
}

impl Store for InMemoryStore {
    fn read<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Tables) -> T,
    {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Tables) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.commit_with(f, |_| Ok(()))
    }
}
