use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use google_drive3::yup_oauth2::{self, ServiceAccountAuthenticator};
use google_drive3::DriveHub;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use metrics_exporter_prometheus::PrometheusHandle;
use placement::config::AppConfig;
use placement::workflows::assessment::provider::{DriveChangeFeed, FormsApiClient};
use placement::workflows::assessment::{
    AssessmentService, FormProvider, GoogleFormProvider, HtmlReportRenderer,
    InMemoryResourceCache, RedisResourceCache, ResourceCache, UnconfiguredFormProvider,
};
use placement::workflows::hiring::{ApplicationLifecycle, OfferLetterStore};
use placement::workflows::notify::{NotificationDispatcher, TracingNotifier};
use placement::workflows::store::InMemoryStore;
use placement::workflows::{PlacementState, WorkflowError};
use tracing::{info, warn};

use crate::seed::SeedData;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) notifications: NotificationDispatcher,
}

/// Collaborators behind the placement router.
pub(crate) struct Wiring {
    pub(crate) placement: PlacementState,
    pub(crate) notifications: NotificationDispatcher,
}

pub(crate) async fn wire(config: &AppConfig) -> Result<Wiring, WorkflowError> {
    let store = Arc::new(InMemoryStore::default());
    match config.storage.seed_file.as_deref() {
        Some(path) => SeedData::load(path)?.apply(&store)?,
        None => warn!("PLACEMENT_SEED_FILE not set; starting with an empty store"),
    }
    let notifications = NotificationDispatcher::spawn(Arc::new(TracingNotifier));
    let cache = resource_cache(config).await?;
    let provider = form_provider(config).await?;
    let renderer = Arc::new(HtmlReportRenderer::new(config.storage.result_dir.clone()));

    let assessments = AssessmentService::new(
        store.clone(),
        cache,
        provider,
        renderer,
        notifications.clone(),
        config.provider.timeout,
    );
    let letters = OfferLetterStore::new(config.storage.offer_dir.clone());
    let lifecycle = ApplicationLifecycle::new(store, letters, notifications.clone());

    Ok(Wiring {
        placement: PlacementState {
            assessments,
            lifecycle,
        },
        notifications,
    })
}

async fn resource_cache(config: &AppConfig) -> Result<Arc<dyn ResourceCache>, WorkflowError> {
    match config.cache.redis_url.as_deref() {
        Some(url) => {
            let cache = RedisResourceCache::connect(url).await?;
            info!("responder link cache backed by redis");
            Ok(Arc::new(cache))
        }
        None => {
            info!("responder link cache held in memory");
            Ok(Arc::new(InMemoryResourceCache::default()))
        }
    }
}

async fn form_provider(config: &AppConfig) -> Result<Arc<dyn FormProvider>, WorkflowError> {
    let Some(key_path) = config.provider.service_account_key.as_ref() else {
        warn!("GOOGLE_SERVICE_ACCOUNT_KEY not set; Google Forms tests cannot be resolved");
        return Ok(Arc::new(UnconfiguredFormProvider));
    };

    let key = yup_oauth2::read_service_account_key(key_path)
        .await
        .map_err(|err| {
            WorkflowError::internal(format!(
                "unable to read service account key {}: {err}",
                key_path.display()
            ))
        })?;
    let auth = ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|err| WorkflowError::internal(format!("google authenticator: {err}")))?;

    let connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|err| WorkflowError::internal(format!("tls roots: {err}")))?
        .https_or_http()
        .enable_http1()
        .build();
    let client = Client::builder(TokioExecutor::new()).build(connector);
    let hub = DriveHub::new(client, auth.clone());

    let changes = DriveChangeFeed::new(hub, config.provider.drive_start_page_token.clone());
    let forms = FormsApiClient::new(
        config.provider.forms_api_base_url.clone(),
        Box::new(auth),
        config.provider.timeout,
    )?;
    let provider = GoogleFormProvider::new(changes, forms);
    info!(
        forms_api = %config.provider.forms_api_base_url,
        "google forms provider configured"
    );
    Ok(Arc::new(provider))
}
