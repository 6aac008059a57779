use std::fs;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use tracing::debug;

use super::domain::{OfferDocument, OfferLetterUpload};
use crate::workflows::error::{WorkflowError, WorkflowResult};
use crate::workflows::ids::ApplicationId;

/// Persists uploaded offer letters under a single storage root. Stored
/// documents never leave that root, whatever name the uploader supplies.
#[derive(Debug, Clone)]
pub struct OfferLetterStore {
    root: PathBuf,
}

impl OfferLetterStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(
        &self,
        application_id: ApplicationId,
        upload: &OfferLetterUpload,
    ) -> WorkflowResult<OfferDocument> {
        let file_name = bare_file_name(&upload.file_name)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(upload.content_base64.trim())
            .map_err(|_| WorkflowError::invalid_input("offer letter is not valid base64"))?;
        if bytes.is_empty() {
            return Err(WorkflowError::invalid_input("offer letter is empty"));
        }

        fs::create_dir_all(&self.root).map_err(|err| {
            WorkflowError::internal(format!(
                "unable to create offer storage {}: {err}",
                self.root.display()
            ))
        })?;
        let root = self.root.canonicalize().map_err(|err| {
            WorkflowError::internal(format!("offer storage {}: {err}", self.root.display()))
        })?;

        let path = root.join(format!("{application_id}-{file_name}"));
        fs::write(&path, &bytes).map_err(|err| {
            WorkflowError::internal(format!("unable to write {}: {err}", path.display()))
        })?;
        let stored = path
            .canonicalize()
            .map_err(|err| WorkflowError::internal(format!("{}: {err}", path.display())))?;
        if !stored.starts_with(&root) {
            let _ = fs::remove_file(&path);
            return Err(WorkflowError::invalid_input(format!(
                "offer letter {file_name} resolves outside offer storage"
            )));
        }

        debug!(application_id = %application_id, path = %stored.display(), bytes = bytes.len(), "offer letter stored");
        Ok(OfferDocument {
            file_name: file_name.to_string(),
            path: stored,
        })
    }
}

/// Accepts a single normal path component only.
fn bare_file_name(raw: &str) -> WorkflowResult<&str> {
    let name = raw.trim();
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name && !name.contains('\\') => Ok(name),
        _ => Err(WorkflowError::invalid_input(format!(
            "offer letter name {raw:?} must be a plain file name"
        ))),
    }
}
