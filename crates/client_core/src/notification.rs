//! Single modal notification surface shared by every orchestrator.
//!
//! A new `present` call replaces whatever is on screen; there is no stacking
//! and no queue, so the most recent caller wins.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::OrchestratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationIcon {
    Info,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBar {
    Indeterminate,
    Determinate(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSpec {
    pub title: String,
    pub body: String,
    pub icon: NotificationIcon,
    /// Blocking notifications cannot be dismissed by the user.
    pub blocking: bool,
    pub auto_dismiss: Option<Duration>,
    pub progress: Option<ProgressBar>,
    pub choices: Vec<String>,
}

impl NotificationSpec {
    fn new(icon: NotificationIcon, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon,
            blocking: false,
            auto_dismiss: None,
            progress: None,
            choices: Vec::new(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationIcon::Info, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationIcon::Error, title, body)
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationIcon::Success, title, body)
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub fn with_auto_dismiss(mut self, after: Duration) -> Self {
        self.auto_dismiss = Some(after);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|choice| choice.to_string()).collect();
        self
    }
}

/// Rendering backend behind the presenter.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    fn show(&self, spec: &NotificationSpec);
    /// Shows a prompt and waits for one of `spec.choices`.
    async fn choose(&self, spec: &NotificationSpec) -> anyhow::Result<String>;
    fn hide(&self);
}

struct PresenterState {
    current: Option<NotificationSpec>,
    generation: u64,
}

pub struct NotificationPresenter {
    surface: Arc<dyn NotificationSurface>,
    state: Mutex<PresenterState>,
}

impl NotificationPresenter {
    pub fn new(surface: Arc<dyn NotificationSurface>) -> Arc<Self> {
        Arc::new(Self {
            surface,
            state: Mutex::new(PresenterState {
                current: None,
                generation: 0,
            }),
        })
    }

    /// Replaces the visible notification. Resolves to the chosen label when
    /// `spec.choices` is non-empty, after the user picked one.
    pub async fn present(
        self: &Arc<Self>,
        spec: NotificationSpec,
    ) -> Result<Option<String>, OrchestratorError> {
        let generation = {
            let mut guard = self.state.lock().await;
            guard.generation += 1;
            guard.current = Some(spec.clone());
            guard.generation
        };
        debug!(
            title = %spec.title,
            icon = ?spec.icon,
            blocking = spec.blocking,
            generation,
            "presenting notification"
        );

        if let Some(after) = spec.auto_dismiss {
            self.schedule_dismiss(generation, after);
        }

        if spec.choices.is_empty() {
            self.surface.show(&spec);
            return Ok(None);
        }

        let label = self
            .surface
            .choose(&spec)
            .await
            .map_err(OrchestratorError::Presentation)?;
        self.clear_generation(generation).await;
        if !spec.choices.contains(&label) {
            return Err(OrchestratorError::InvalidChoice { label });
        }
        Ok(Some(label))
    }

    /// User dismissal. Blocking notifications stay up.
    pub async fn dismiss(&self) -> bool {
        let mut guard = self.state.lock().await;
        match &guard.current {
            Some(spec) if spec.blocking => {
                debug!(title = %spec.title, "ignoring dismissal of blocking notification");
                false
            }
            Some(_) => {
                guard.current = None;
                self.surface.hide();
                true
            }
            None => false,
        }
    }

    pub async fn current(&self) -> Option<NotificationSpec> {
        self.state.lock().await.current.clone()
    }

    fn schedule_dismiss(self: &Arc<Self>, generation: u64, after: Duration) {
        let presenter = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if presenter.clear_generation(generation).await {
                debug!(generation, "notification auto-dismissed");
            }
        });
    }

    /// Clears the notification only if nothing replaced it in the meantime.
    async fn clear_generation(&self, generation: u64) -> bool {
        let mut guard = self.state.lock().await;
        if guard.generation != generation || guard.current.is_none() {
            return false;
        }
        guard.current = None;
        self.surface.hide();
        true
    }
}

#[cfg(test)]
#[path = "tests/notification_tests.rs"]
mod tests;
