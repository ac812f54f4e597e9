//! Contract of the privileged host process that performs updates and imports.

use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use anyhow::anyhow;
use async_trait::async_trait;
use shared::{domain::ImportRequest, protocol::HostEvent, protocol::UpdateCheck};
use tokio::sync::mpsc;

/// Fan-out of host events to per-run subscribers.
///
/// Every subscriber gets its own unbounded queue, so a slow run never loses
/// events. Subscribers whose receiver was dropped are pruned on the next emit.
#[derive(Default)]
pub struct EventHub {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<HostEvent>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Returns the number of subscribers that received the event.
    pub fn emit(&self, event: HostEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickFilesOptions {
    pub title: String,
    pub default_dir: Option<PathBuf>,
    pub filter: FileFilter,
    pub multiple: bool,
}

#[async_trait]
pub trait UpdaterHost: Send + Sync {
    async fn check_for_update(&self) -> anyhow::Result<UpdateCheck>;
    /// Downloads and installs; progress arrives on the event stream.
    async fn install_update(&self) -> anyhow::Result<()>;
    /// Does not return on success.
    async fn relaunch(&self) -> anyhow::Result<()>;
    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent>;
}

#[async_trait]
pub trait ImportHost: Send + Sync {
    async fn picture_dir(&self) -> anyhow::Result<PathBuf>;
    /// `None` when the picker was cancelled.
    async fn pick_files(&self, options: PickFilesOptions) -> anyhow::Result<Option<Vec<String>>>;
    /// Resolves to an empty string on success, otherwise to an error message.
    async fn send_files(&self, request: ImportRequest) -> anyhow::Result<String>;
    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent>;
}

/// Stand-in used when no host process is attached.
pub struct MissingHost {
    events: EventHub,
}

impl MissingHost {
    pub fn new() -> Self {
        Self {
            events: EventHub::new(),
        }
    }
}

impl Default for MissingHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpdaterHost for MissingHost {
    async fn check_for_update(&self) -> anyhow::Result<UpdateCheck> {
        Err(anyhow!("host process unavailable for update check"))
    }

    async fn install_update(&self) -> anyhow::Result<()> {
        Err(anyhow!("host process unavailable for update install"))
    }

    async fn relaunch(&self) -> anyhow::Result<()> {
        Err(anyhow!("host process unavailable for relaunch"))
    }

    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ImportHost for MissingHost {
    async fn picture_dir(&self) -> anyhow::Result<PathBuf> {
        Err(anyhow!("host process unavailable for directory lookup"))
    }

    async fn pick_files(&self, _options: PickFilesOptions) -> anyhow::Result<Option<Vec<String>>> {
        Err(anyhow!("host process unavailable for file picker"))
    }

    async fn send_files(&self, request: ImportRequest) -> anyhow::Result<String> {
        Err(anyhow!(
            "host process unavailable for import of {} files under app {}",
            request.file_paths.len(),
            request.app_id
        ))
    }

    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        self.events.subscribe()
    }
}
