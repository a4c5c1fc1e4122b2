use std::sync::Arc;
use std::time::Instant;

use crate::core::config::{AppPaths, ConfigCredentials, ConfigService, Settings};
use crate::image::ImageLookup;

pub mod error;
pub mod pipeline;

use error::InitializationError;
pub use pipeline::{PipelineStatus, QaPipeline};

/// Application state shared by the HTTP handlers and the interactive session.
///
/// Built once at startup and never mutated afterwards. A pipeline that failed
/// to come up is recorded as `PipelineStatus::Unavailable` rather than
/// aborting the process, so the API can keep answering with the
/// not-initialized error.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub pipeline: PipelineStatus,
    pub image_lookup: Option<Arc<dyn ImageLookup>>,
    pub started_at: Instant,
}

impl AppState {
    /// Loads configuration and brings up the QA pipeline.
    ///
    /// Only a broken configuration is fatal; collaborator failures leave the
    /// pipeline unavailable.
    pub async fn initialize(config: &ConfigService) -> Result<Arc<Self>, InitializationError> {
        let (settings, raw) = config
            .load_settings()
            .map_err(InitializationError::Config)?;
        tracing::debug!("Effective config: {}", config.redact_sensitive_values(&raw));
        let credentials = ConfigCredentials::from_config(&raw);
        let client = settings
            .http
            .build_client()
            .map_err(InitializationError::Config)?;

        let paths = Arc::new(config.paths().clone());
        let pipeline =
            pipeline::initialize_pipeline(&paths, &settings, &credentials, &client).await;
        let image_lookup = pipeline::build_image_lookup(&settings, &credentials, &client);
        if let Some(lookup) = &image_lookup {
            tracing::info!("Image lookup provider: {}", lookup.name());
        }

        Ok(Arc::new(Self::new(paths, settings, pipeline, image_lookup)))
    }

    pub fn new(
        paths: Arc<AppPaths>,
        settings: Settings,
        pipeline: PipelineStatus,
        image_lookup: Option<Arc<dyn ImageLookup>>,
    ) -> Self {
        Self {
            paths,
            settings,
            pipeline,
            image_lookup,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
