//! Store backed by a JSON snapshot on disk.
//!
//! The snapshot is rewritten after every committed transaction using a
//! write-then-rename so a crash mid-write never truncates the data file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::memory::InMemoryStore;
use super::{RepositoryError, Store, Tables};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Loads the snapshot at `path`; a missing file starts an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        let tables = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Tables>(&bytes).map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "corrupt snapshot {}: {err}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Tables::default(),
            Err(err) => {
                return Err(RepositoryError::Unavailable(format!(
                    "read {}: {err}",
                    path.display()
                )))
            }
        };

        info!(path = %path.display(), "opened json store");
        Ok(Self {
            path,
            inner: InMemoryStore::from_tables(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(path: &Path, tables: &Tables) -> Result<(), RepositoryError> {
        let json = serde_json::to_vec_pretty(tables)
            .map_err(|err| RepositoryError::Unavailable(format!("encode snapshot: {err}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::Unavailable(format!("create {}: {err}", parent.display()))
            })?;
        }

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)
            .map_err(|err| RepositoryError::Unavailable(format!("create temp file: {err}")))?;
        file.write_all(&json)
            .map_err(|err| RepositoryError::Unavailable(format!("write temp file: {err}")))?;
        file.sync_all()
            .map_err(|err| RepositoryError::Unavailable(format!("sync temp file: {err}")))?;
        drop(file);

        fs::rename(&temp_path, path)
            .map_err(|err| RepositoryError::Unavailable(format!("rename snapshot: {err}")))?;
        debug!(path = %path.display(), bytes = json.len(), "snapshot written");
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn read<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Tables) -> T,
    {
        self.inner.read(f)
    }

    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Tables) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let path = self.path.clone();
        self.inner
            .commit_with(f, move |tables| Self::persist(&path, tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenants::{Tenant, TenantDraft};

    fn tenant_draft(first: &str) -> TenantDraft {
        TenantDraft {
            first_name: first.to_string(),
            last_name: "Martin".to_string(),
            email: Some(format!("{}@example.org", first.to_lowercase())),
            phone: None,
            birth_date: None,
            notes: None,
        }
    }

    #[test]
    fn committed_writes_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rentroll.json");

        let store = JsonFileStore::open(&path).expect("opens empty");
        store
            .write(|tables| {
                let id = tables.tenants.allocate_id();
                Ok::<_, RepositoryError>(tables.tenants.insert(Tenant {
                    id,
                    details: tenant_draft("Claire"),
                }))
            })
            .expect("write commits");
        drop(store);

        let reopened = JsonFileStore::open(&path).expect("reopens");
        let names = reopened
            .read(|tables| {
                tables
                    .tenants
                    .iter()
                    .map(|tenant| tenant.details.first_name.clone())
                    .collect::<Vec<_>>()
            })
            .expect("reads");
        assert_eq!(names, vec!["Claire".to_string()]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{not json").expect("writes fixture");

        match JsonFileStore::open(&path) {
            Err(RepositoryError::Unavailable(message)) => assert!(message.contains("corrupt")),
            other => panic!("expected unavailable error, got {other:?}"),
        }
    }
}
