use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::checks;
use crate::store::{DocumentId, LeaseId, PropertyId, Record, Tables, TenantId};
use crate::ServiceError;

/// Record a document is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DocumentTarget {
    Property(PropertyId),
    Lease(LeaseId),
    Tenant(TenantId),
}

impl DocumentTarget {
    pub(crate) fn ensure_exists(self, tables: &Tables) -> Result<(), ServiceError> {
        match self {
            Self::Property(id) => tables.properties.require(id).map(|_| ())?,
            Self::Lease(id) => tables.leases.require(id).map(|_| ())?,
            Self::Tenant(id) => tables.tenants.require(id).map(|_| ())?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    LeaseContract,
    Inventory,
    Insurance,
    Identity,
    Receipt,
    Diagnostic,
    #[default]
    Other,
}

/// Metadata submitted by clients after the file has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub target: DocumentTarget,
    #[serde(default)]
    pub kind: DocumentKind,
    pub title: String,
    pub file_name: String,
    pub storage_key: String,
    #[serde(default)]
    pub size_bytes: u64,
    /// Defaults to the day the record is created.
    #[serde(default)]
    pub uploaded_on: Option<NaiveDate>,
}

impl DocumentDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("title", &self.title)?;
        checks::required_text("file_name", &self.file_name)?;
        checks::required_text("storage_key", &self.storage_key)?;
        if self.file_name.contains(['/', '\\']) {
            return Err(ServiceError::validation(
                "file_name must not contain path separators",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub target: DocumentTarget,
    pub kind: DocumentKind,
    pub title: String,
    pub file_name: String,
    pub storage_key: String,
    pub size_bytes: u64,
    /// Inferred from the file extension.
    pub content_type: String,
    pub uploaded_on: NaiveDate,
}

impl Document {
    pub(crate) fn from_draft(id: DocumentId, draft: DocumentDraft, today: NaiveDate) -> Self {
        Self {
            id,
            content_type: content_type_for(&draft.file_name),
            uploaded_on: draft.uploaded_on.unwrap_or(today),
            target: draft.target,
            kind: draft.kind,
            title: draft.title,
            file_name: draft.file_name,
            storage_key: draft.storage_key,
            size_bytes: draft.size_bytes,
        }
    }
}

impl Record for Document {
    type Id = DocumentId;
    const ENTITY: &'static str = "document";

    fn id(&self) -> DocumentId {
        self.id
    }
}

pub(crate) fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("bail-2025.pdf"), "application/pdf");
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }

    #[test]
    fn target_serializes_with_type_and_id() {
        let json = serde_json::to_value(DocumentTarget::Lease(LeaseId(4))).expect("serializes");
        assert_eq!(json, serde_json::json!({ "type": "lease", "id": 4 }));
    }
}
