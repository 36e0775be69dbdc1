//! Export of a tailored resume: readiness probing, download, saving.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api_client::{ApiError, JobApi};
use crate::config::ExportProbeConfig;
use crate::errors::{FlowError, Precondition};
use crate::models::application::ApplicationId;
use crate::models::export::{ExportFormat, ExportReadiness, ExportedDocument};
use crate::session::Session;
use crate::view::{ViewEvent, ViewSender};

/// Download action for one application and format. Disabled until a probe
/// has seen the document ready.
pub struct Exporter {
    api: Arc<dyn JobApi>,
    session: Session,
    view: ViewSender,
    probe: ExportProbeConfig,
    application_id: ApplicationId,
    format: ExportFormat,
    download_enabled: bool,
}

impl Exporter {
    pub fn new(
        api: Arc<dyn JobApi>,
        session: Session,
        view: ViewSender,
        probe: ExportProbeConfig,
        application_id: ApplicationId,
        format: ExportFormat,
    ) -> Self {
        Self {
            api,
            session,
            view,
            probe,
            application_id,
            format,
            download_enabled: false,
        }
    }

    pub fn download_enabled(&self) -> bool {
        self.download_enabled
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// One HEAD probe. Emits the availability whenever it changes.
    pub async fn probe_once(&mut self) -> Result<bool, FlowError> {
        let readiness = self
            .api
            .export_readiness(&self.session.credential(), self.application_id, self.format)
            .await
            .map_err(request_error)?;

        let ready = readiness == ExportReadiness::Ready;
        if let ExportReadiness::NotReady { status } = readiness {
            debug!("Export {} of application {} not ready ({status})", self.format, self.application_id);
        }
        if ready != self.download_enabled {
            self.download_enabled = ready;
            self.view.emit(ViewEvent::ExportAvailability {
                format: self.format,
                ready,
            });
        }
        Ok(ready)
    }

    /// Probes at the configured interval until ready, giving up after
    /// `max_attempts` probes.
    pub async fn wait_until_ready(&mut self) -> Result<(), FlowError> {
        let mut ticker = tokio::time::interval(self.probe.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.probe.max_attempts {
            ticker.tick().await;
            if self.probe_once().await.map_err(|e| e.report(&self.view))? {
                info!(
                    "Export {} of application {} ready after {attempt} probe(s)",
                    self.format, self.application_id
                );
                return Ok(());
            }
        }

        Err(FlowError::ExportNotReady {
            attempts: self.probe.max_attempts,
        }
        .report(&self.view))
    }

    pub async fn download(&self) -> Result<ExportedDocument, FlowError> {
        if !self.download_enabled {
            return Err(FlowError::Invalid(format!(
                "The {} export is not available yet.",
                self.format
            )));
        }

        let document = self
            .api
            .export_document(&self.session.credential(), self.application_id, self.format)
            .await
            .map_err(|e| request_error(e).report(&self.view))?;

        info!(
            "Downloaded {} ({} bytes) for application {}",
            document.filename,
            document.bytes.len(),
            self.application_id
        );
        Ok(document)
    }
}

fn request_error(e: ApiError) -> FlowError {
    if e.is_unauthorized() {
        FlowError::Precondition(Precondition::Credential)
    } else {
        FlowError::Request(e)
    }
}

/// Writes a downloaded document into `dir` under its suggested filename.
pub async fn save_document(document: &ExportedDocument, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(&document.filename);
    tokio::fs::write(&path, &document.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Saved {}", path.display());
    Ok(path)
}
