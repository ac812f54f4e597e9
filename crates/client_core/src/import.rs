//! Screenshot import life cycle: pick files, dispatch, stream progress, report.
//!
//! Two edges lead into the terminal transition: advisory errors from the
//! `screenshotImportError` channel while dispatching, and the authoritative
//! resolution of the dispatch call. Events the host emitted before the
//! dispatch call resolved are applied first; the resolution is always
//! rendered last, so the user ends on the final outcome.

use std::{path::PathBuf, sync::Arc, time::Duration};

use host_bridge::{FileFilter, ImportHost, PickFilesOptions};
use shared::{
    domain::{AppId, ImportOutcome, ImportRequest, SCREENSHOT_EXTENSIONS},
    protocol::HostEvent,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::Settings,
    error::OrchestratorError,
    notification::{NotificationPresenter, NotificationSpec, ProgressBar},
};

pub const PICKER_TITLE: &str = "Select screenshots to import";
pub const PICKER_FILTER_NAME: &str = "Images";
pub const IMPORTING_TITLE: &str = "Importing Screenshots";
pub const NO_FILES_SELECTED: &str = "No files selected";
pub const SUCCESS_DISMISS_AFTER: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    PickingFiles,
    Dispatching,
    Succeeded,
    Failed,
}

pub struct ImportOrchestrator {
    host: Arc<dyn ImportHost>,
    presenter: Arc<NotificationPresenter>,
    picture_dir: Option<PathBuf>,
    success_dismiss_after: Duration,
    phase: ImportPhase,
}

impl ImportOrchestrator {
    pub fn new(host: Arc<dyn ImportHost>, presenter: Arc<NotificationPresenter>) -> Self {
        Self {
            host,
            presenter,
            picture_dir: None,
            success_dismiss_after: SUCCESS_DISMISS_AFTER,
            phase: ImportPhase::Idle,
        }
    }

    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.picture_dir = settings.picture_dir.clone();
        self.success_dismiss_after = settings.success_dismiss();
        self
    }

    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    /// Runs one import. Each call is independent; callers serialize runs.
    pub async fn import_screenshots(
        &mut self,
        app_id: AppId,
    ) -> Result<ImportOutcome, OrchestratorError> {
        let run_id = Uuid::new_v4();
        self.transition(ImportPhase::PickingFiles);

        let options = PickFilesOptions {
            title: PICKER_TITLE.to_string(),
            default_dir: self.resolve_default_dir().await,
            filter: FileFilter::new(PICKER_FILTER_NAME, SCREENSHOT_EXTENSIONS),
            multiple: true,
        };
        let selection = match self.host.pick_files(options).await {
            Ok(selection) => selection,
            Err(err) => {
                warn!(%run_id, error = %err, "file picker failed");
                None
            }
        };

        let file_paths = match selection {
            Some(paths) if !paths.is_empty() => paths,
            _ => {
                info!(%run_id, %app_id, "no screenshots selected");
                self.presenter
                    .present(NotificationSpec::error("Error", NO_FILES_SELECTED))
                    .await?;
                self.transition(ImportPhase::Idle);
                return Ok(ImportOutcome::NoSelection);
            }
        };

        let request = ImportRequest::new(file_paths, app_id);
        let file_count = request.file_paths.len();
        info!(%run_id, %app_id, files = file_count, "dispatching screenshot import");

        let mut events = self.host.subscribe_events();
        self.transition(ImportPhase::Dispatching);
        self.presenter.present(loading_modal("Loading...")).await?;

        let host = Arc::clone(&self.host);
        let dispatch = host.send_files(request);
        tokio::pin!(dispatch);
        let mut stream_open = true;
        let resolution = loop {
            tokio::select! {
                biased;
                event = events.recv(), if stream_open => match event {
                    Some(event) => self.handle_event(event).await,
                    None => stream_open = false,
                },
                result = &mut dispatch => break result,
            }
        };
        self.drain_events(&mut events).await;
        drop(events);

        self.finish(run_id, file_count, resolution).await
    }

    /// Applies one host event. Anything outside a dispatch is discarded.
    pub async fn handle_event(&mut self, event: HostEvent) {
        if self.phase != ImportPhase::Dispatching {
            debug!(
                phase = ?self.phase,
                event = event.name(),
                "discarding import event outside a dispatch"
            );
            return;
        }

        let spec = match event {
            HostEvent::ScreenshotImportProgress(message) => {
                debug!(%message, "import progress");
                loading_modal(message)
            }
            HostEvent::ScreenshotImportError(message) => {
                warn!(%message, "import reported an error");
                NotificationSpec::error(IMPORTING_TITLE, message).blocking()
            }
            other => {
                debug!(event = other.name(), "ignoring unrelated host event");
                return;
            }
        };
        if let Err(err) = self.presenter.present(spec).await {
            warn!(error = %err, "failed to render import event");
        }
    }

    /// Terminal transition. `resolution` is the authoritative outcome of the
    /// dispatch call: an empty message means success.
    async fn finish(
        &mut self,
        run_id: Uuid,
        file_count: usize,
        resolution: anyhow::Result<String>,
    ) -> Result<ImportOutcome, OrchestratorError> {
        let failure = match resolution {
            Ok(message) if message.is_empty() => None,
            Ok(message) => Some(message),
            Err(err) => Some(format!("{err:#}")),
        };

        let (outcome, spec) = match failure {
            None => {
                self.transition(ImportPhase::Succeeded);
                info!(%run_id, imported = file_count, "screenshot import finished");
                let spec = NotificationSpec::success(
                    "Success",
                    format!("Imported {file_count} screenshot{}", plural(file_count)),
                )
                .with_auto_dismiss(self.success_dismiss_after);
                (ImportOutcome::Succeeded { imported: file_count }, spec)
            }
            Some(message) => {
                self.transition(ImportPhase::Failed);
                error!(%run_id, %message, "screenshot import failed");
                let spec = NotificationSpec::error("Error", message.clone());
                (ImportOutcome::Failed { message }, spec)
            }
        };
        let presented = self.presenter.present(spec).await;
        self.transition(ImportPhase::Idle);
        presented?;
        Ok(outcome)
    }

    async fn drain_events(&mut self, events: &mut mpsc::UnboundedReceiver<HostEvent>) {
        while let Ok(event) = events.try_recv() {
            self.handle_event(event).await;
        }
    }

    async fn resolve_default_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.picture_dir {
            return Some(dir.clone());
        }
        match self.host.picture_dir().await {
            Ok(dir) => Some(dir),
            Err(err) => {
                warn!(
                    error = %err,
                    "picture directory unavailable; opening picker without default"
                );
                None
            }
        }
    }

    fn transition(&mut self, next: ImportPhase) {
        debug!(from = ?self.phase, to = ?next, "import phase transition");
        self.phase = next;
    }
}

fn loading_modal(body: impl Into<String>) -> NotificationSpec {
    NotificationSpec::info(IMPORTING_TITLE, body)
        .blocking()
        .with_progress(ProgressBar::Indeterminate)
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
#[path = "tests/import_tests.rs"]
mod tests;
