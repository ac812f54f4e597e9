//! Orchestration of host-driven operations: self-update and screenshot import.

pub mod config;
pub mod crash;
pub mod error;
pub mod import;
pub mod notification;
pub mod update;

pub use config::{load_settings, Settings};
pub use crash::{CrashReport, CrashReporter, FatalStage, TracingCrashReporter};
pub use error::OrchestratorError;
pub use import::{ImportOrchestrator, ImportPhase};
pub use notification::{
    NotificationIcon, NotificationPresenter, NotificationSpec, NotificationSurface, ProgressBar,
};
pub use update::{UpdateOrchestrator, UpdatePhase};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
