//! Crash reporting for failures the update flow must not swallow.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalStage {
    Install,
    Relaunch,
}

impl fmt::Display for FatalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalStage::Install => f.write_str("install"),
            FatalStage::Relaunch => f.write_str("relaunch"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrashReport {
    pub stage: FatalStage,
    pub message: String,
    /// Underlying causes, outermost first.
    pub causes: Vec<String>,
    /// Stack captured where the error was created. Reads "disabled backtrace"
    /// unless `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` is set.
    pub backtrace: String,
    pub occurred_at: DateTime<Utc>,
}

impl CrashReport {
    pub fn from_error(stage: FatalStage, err: &anyhow::Error) -> Self {
        Self {
            stage,
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
            backtrace: err.backtrace().to_string(),
            occurred_at: Utc::now(),
        }
    }
}

pub trait CrashReporter: Send + Sync {
    fn report(&self, report: &CrashReport);
}

pub struct TracingCrashReporter;

impl CrashReporter for TracingCrashReporter {
    fn report(&self, report: &CrashReport) {
        error!(
            stage = %report.stage,
            causes = ?report.causes,
            occurred_at = %report.occurred_at.to_rfc3339(),
            "fatal self-update failure: {}\n{}",
            report.message,
            report.backtrace
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn report_keeps_cause_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("disk full"))
            .context("writing update bundle")
            .expect_err("error");
        let report = CrashReport::from_error(FatalStage::Install, &err);
        assert_eq!(report.message, "writing update bundle");
        assert_eq!(report.causes, vec!["disk full".to_string()]);
        assert_eq!(report.stage.to_string(), "install");
        assert!(!report.backtrace.is_empty());
    }

    #[test]
    fn report_carries_captured_stack() {
        let err = anyhow::anyhow!("exec denied");
        let report = CrashReport::from_error(FatalStage::Relaunch, &err);
        assert_eq!(report.backtrace, err.backtrace().to_string());
    }
}
