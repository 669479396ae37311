use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::domain::{Document, DocumentDraft, DocumentTarget};
use crate::store::{DocumentId, Store};
use crate::ServiceError;

pub struct DocumentService<S> {
    store: Arc<S>,
}

impl<S> DocumentService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_document(
        &self,
        draft: DocumentDraft,
        today: NaiveDate,
    ) -> Result<Document, ServiceError> {
        draft.validate()?;
        let document = self.store.write(|tables| {
            draft.target.ensure_exists(tables)?;
            let id = tables.documents.allocate_id();
            Ok::<_, ServiceError>(tables.documents.insert(Document::from_draft(id, draft, today)))
        })?;
        info!(
            document_id = %document.id,
            content_type = %document.content_type,
            size_bytes = document.size_bytes,
            "document recorded"
        );
        Ok(document)
    }

    /// Replaces the metadata; the original upload date is kept unless a new one is given.
    pub fn update_document(
        &self,
        id: DocumentId,
        draft: DocumentDraft,
    ) -> Result<Document, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            draft.target.ensure_exists(tables)?;
            let current = tables.documents.require(id)?.uploaded_on;
            let document = Document::from_draft(id, draft, current);
            Ok(tables.documents.replace(document)?)
        })
    }

    pub fn get_document(&self, id: DocumentId) -> Result<Document, ServiceError> {
        let document = self
            .store
            .read(|tables| tables.documents.require(id).cloned())??;
        Ok(document)
    }

    pub fn list_documents(
        &self,
        target: Option<DocumentTarget>,
    ) -> Result<Vec<Document>, ServiceError> {
        Ok(self.store.read(|tables| {
            tables
                .documents
                .iter()
                .filter(|document| target.map_or(true, |target| document.target == target))
                .cloned()
                .collect()
        })?)
    }

    pub fn delete_document(&self, id: DocumentId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.documents.remove(id)?;
            Ok::<_, ServiceError>(())
        })?;
        info!(document_id = %id, "document deleted");
        Ok(())
    }
}
