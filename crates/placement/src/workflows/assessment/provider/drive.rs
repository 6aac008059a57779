use google_drive3::api::{Change, Scope};
use google_drive3::DriveHub;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ChangedResource, ProviderError};

const CHANGE_FIELDS: &str =
    "nextPageToken,newStartPageToken,changes(fileId,removed,file(mimeType,trashed))";
const PAGE_SIZE: i32 = 100;

/// Polls the Drive change feed, remembering the checkpoint between polls.
/// Polls are serialized so two callers never replay the same page.
pub struct DriveChangeFeed<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    checkpoint: Mutex<Option<String>>,
}

impl<C> DriveChangeFeed<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    /// `start_page_token` seeds the checkpoint; without one the first poll
    /// asks Drive for the current token.
    pub fn new(hub: DriveHub<C>, start_page_token: Option<String>) -> Self {
        Self {
            hub,
            checkpoint: Mutex::new(start_page_token),
        }
    }

    fn map_error<E: std::fmt::Display>(err: E) -> ProviderError {
        ProviderError::Transport(err.to_string())
    }

    async fn start_page_token(&self) -> Result<String, ProviderError> {
        let (_, token) = self
            .hub
            .changes()
            .get_start_page_token()
            .supports_all_drives(true)
            .add_scope(Scope::Readonly)
            .doit()
            .await
            .map_err(Self::map_error)?;
        token
            .start_page_token
            .ok_or_else(|| ProviderError::Decode("missing startPageToken".to_string()))
    }

    pub async fn poll(&self) -> Result<Vec<ChangedResource>, ProviderError> {
        let mut checkpoint = self.checkpoint.lock().await;
        let mut page_token = match checkpoint.clone() {
            Some(token) => token,
            None => self.start_page_token().await?,
        };

        let mut resources = Vec::new();
        loop {
            let (_, page) = self
                .hub
                .changes()
                .list(&page_token)
                .include_removed(true)
                .include_items_from_all_drives(true)
                .supports_all_drives(true)
                .page_size(PAGE_SIZE)
                .param("fields", CHANGE_FIELDS)
                .add_scope(Scope::Readonly)
                .doit()
                .await
                .map_err(Self::map_error)?;

            resources.extend(collect_changes(page.changes.unwrap_or_default()));

            match (page.next_page_token, page.new_start_page_token) {
                (Some(next), _) => page_token = next,
                (None, Some(fresh)) => {
                    debug!(checkpoint = %fresh, changes = resources.len(), "drive change feed drained");
                    *checkpoint = Some(fresh);
                    break;
                }
                (None, None) => {
                    return Err(ProviderError::Decode(
                        "change page carried neither nextPageToken nor newStartPageToken"
                            .to_string(),
                    ))
                }
            }
        }

        Ok(resources)
    }
}

impl<C> std::fmt::Debug for DriveChangeFeed<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveChangeFeed").finish_non_exhaustive()
    }
}

fn collect_changes(changes: Vec<Change>) -> impl Iterator<Item = ChangedResource> {
    changes.into_iter().filter_map(|change| {
        let resource_id = change.file_id?;
        let trashed = change
            .file
            .as_ref()
            .and_then(|file| file.trashed)
            .unwrap_or(false);
        Some(ChangedResource {
            resource_id,
            mime_type: change.file.and_then(|file| file.mime_type),
            removed: change.removed.unwrap_or(false) || trashed,
        })
    })
}

#[cfg(test)]
mod tests {
    use google_drive3::api::File;

    use super::*;
    use crate::workflows::assessment::provider::FORM_MIME_TYPE;

    fn change(id: Option<&str>, mime: &str, removed: bool, trashed: bool) -> Change {
        Change {
            file_id: id.map(str::to_string),
            removed: Some(removed),
            file: Some(File {
                mime_type: Some(mime.to_string()),
                trashed: Some(trashed),
                ..File::default()
            }),
            ..Change::default()
        }
    }

    #[test]
    fn trashed_and_removed_files_are_flagged() {
        let collected: Vec<_> = collect_changes(vec![
            change(Some("live"), FORM_MIME_TYPE, false, false),
            change(Some("gone"), FORM_MIME_TYPE, true, false),
            change(Some("binned"), FORM_MIME_TYPE, false, true),
            change(None, FORM_MIME_TYPE, false, false),
        ])
        .collect();

        let live: Vec<_> = collected
            .iter()
            .filter(|resource| resource.is_live_form())
            .map(|resource| resource.resource_id.as_str())
            .collect();
        assert_eq!(collected.len(), 3);
        assert_eq!(live, vec!["live"]);
    }
}
