//! File upload and note attachment.
//!
//! Used by the approval flow to attach a PDF snapshot of the accepted or
//! rejected SOW to the deal. These calls touch no custom schema fields, so
//! they are not routed through the self-healing wrapper.

use crate::error::CrmResult;
use crate::gateway::CrmGateway;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const FILES_PATH: &str = "/files/v3/files";
const NOTES_PATH: &str = "/crm/v3/objects/notes";

/// CRM-defined association type linking a deal to a note.
const DEAL_TO_NOTE_ASSOCIATION: u32 = 213;

/// Access level of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccess {
    /// Accessible by anyone, indexed by search engines.
    PublicIndexable,
    /// Accessible by anyone, not indexed.
    PublicNotIndexable,
    /// Only accessible by authenticated users.
    Private,
}

impl FileAccess {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublicIndexable => "PUBLIC_INDEXABLE",
            Self::PublicNotIndexable => "PUBLIC_NOT_INDEXABLE",
            Self::Private => "PRIVATE",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

/// File-manager and note operations.
pub struct FilesClient {
    gateway: Arc<CrmGateway>,
}

impl FilesClient {
    #[must_use]
    pub fn new(gateway: Arc<CrmGateway>) -> Self {
        Self { gateway }
    }

    /// Upload a file to the CRM file manager, returning its file id.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
        folder_path: Option<&str>,
        access: FileAccess,
    ) -> CrmResult<String> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;

        let options = serde_json::json!({ "access": access.as_str() });
        let mut form = Form::new()
            .part("file", part)
            .text("options", options.to_string());
        if let Some(folder) = folder_path {
            form = form.text("folderPath", folder.to_string());
        }

        let created: CreatedObject = self.gateway.post_multipart(FILES_PATH, form).await?;

        // The remote does not always apply the access level on the initial
        // upload; patch it explicitly for private files.
        if access == FileAccess::Private {
            self.set_file_access(&created.id, access).await?;
        }

        info!(file_id = %created.id, file_name, "uploaded file");
        Ok(created.id)
    }

    /// Update the access level of an existing file.
    pub async fn set_file_access(&self, file_id: &str, access: FileAccess) -> CrmResult<()> {
        let path = format!("{FILES_PATH}/{file_id}");
        let body = serde_json::json!({ "access": access.as_str() });
        let _: serde_json::Value = self.gateway.patch_json(&path, &body).await?;
        Ok(())
    }

    /// Create a note associated with a deal, optionally attaching uploaded
    /// files. Returns the note id.
    pub async fn create_note_with_attachment(
        &self,
        deal_id: &str,
        note_body: &str,
        file_ids: &[String],
    ) -> CrmResult<String> {
        let mut properties = serde_json::json!({
            "hs_timestamp": Utc::now().to_rfc3339(),
            "hs_note_body": note_body,
        });
        if !file_ids.is_empty() {
            properties["hs_attachment_ids"] = serde_json::Value::String(file_ids.join(";"));
        }

        let body = serde_json::json!({
            "properties": properties,
            "associations": [{
                "to": { "id": deal_id },
                "types": [{
                    "associationCategory": "HUBSPOT_DEFINED",
                    "associationTypeId": DEAL_TO_NOTE_ASSOCIATION,
                }],
            }],
        });

        let created: CreatedObject = self.gateway.post_json(NOTES_PATH, &body).await?;
        info!(note_id = %created.id, deal_id, "created note");
        Ok(created.id)
    }
}
