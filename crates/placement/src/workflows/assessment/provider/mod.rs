//! External form provider seam: change feed, form metadata and full form
//! definitions. The Google adapters live in [`drive`] and [`forms`].

pub mod drive;
pub mod forms;

use async_trait::async_trait;

use super::domain::FormId;

pub use drive::DriveChangeFeed;
pub use forms::FormsApiClient;

pub const FORM_MIME_TYPE: &str = "application/vnd.google-apps.form";

/// One entry of the provider change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedResource {
    pub resource_id: String,
    pub mime_type: Option<String>,
    /// Set when the resource was deleted or trashed since the checkpoint.
    pub removed: bool,
}

impl ChangedResource {
    pub fn is_live_form(&self) -> bool {
        !self.removed && self.mime_type.as_deref() == Some(FORM_MIME_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMetadata {
    pub form_id: FormId,
    pub responder_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormDefinition {
    pub items: Vec<FormItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormItem {
    pub item_id: String,
    /// `None` for non-question items (section headers, images, ...).
    pub question: Option<FormQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormQuestion {
    pub question_id: String,
    pub grading: Option<Grading>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grading {
    pub point_value: i64,
    pub correct_answers: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("form provider is not configured: {0}")]
    Unconfigured(String),
    #[error("provider authentication failed: {0}")]
    Auth(String),
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unable to decode provider response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait FormProvider: Send + Sync {
    /// Resources changed since the last polled checkpoint. Advances the
    /// checkpoint on success.
    async fn list_changes_since_checkpoint(&self) -> Result<Vec<ChangedResource>, ProviderError>;

    async fn metadata(&self, resource_id: &str) -> Result<FormMetadata, ProviderError>;

    async fn form_definition(&self, form_id: &FormId) -> Result<FormDefinition, ProviderError>;
}

/// Drive change feed plus Forms API, the production provider.
pub struct GoogleFormProvider<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    changes: DriveChangeFeed<C>,
    forms: FormsApiClient,
}

impl<C> GoogleFormProvider<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    pub fn new(changes: DriveChangeFeed<C>, forms: FormsApiClient) -> Self {
        Self { changes, forms }
    }
}

impl<C> std::fmt::Debug for GoogleFormProvider<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleFormProvider")
            .field("forms", &self.forms)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C> FormProvider for GoogleFormProvider<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    async fn list_changes_since_checkpoint(&self) -> Result<Vec<ChangedResource>, ProviderError> {
        self.changes.poll().await
    }

    async fn metadata(&self, resource_id: &str) -> Result<FormMetadata, ProviderError> {
        self.forms.metadata(resource_id).await
    }

    async fn form_definition(&self, form_id: &FormId) -> Result<FormDefinition, ProviderError> {
        self.forms.form_definition(form_id).await
    }
}

/// Stand-in used when no Google credentials are configured; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredFormProvider;

impl UnconfiguredFormProvider {
    fn error() -> ProviderError {
        ProviderError::Unconfigured("set GOOGLE_SERVICE_ACCOUNT_KEY to enable Google Forms".into())
    }
}

#[async_trait]
impl FormProvider for UnconfiguredFormProvider {
    async fn list_changes_since_checkpoint(&self) -> Result<Vec<ChangedResource>, ProviderError> {
        Err(Self::error())
    }

    async fn metadata(&self, _resource_id: &str) -> Result<FormMetadata, ProviderError> {
        Err(Self::error())
    }

    async fn form_definition(&self, _form_id: &FormId) -> Result<FormDefinition, ProviderError> {
        Err(Self::error())
    }
}
