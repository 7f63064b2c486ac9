use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::subprocess::CommandOutcome;

/// What happened to an experiment's archive during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ArchiveAction {
    /// The archive already existed and was left untouched
    Skipped,
    /// The archiver ran to completion successfully
    Created { entries: usize },
    /// The archiver was started in the background; `outcome` is filled in
    /// once the task has been joined
    Dispatched {
        entries: usize,
        outcome: Option<CommandOutcome>,
    },
    /// No manifest entry matched the experiment's segment
    NothingSelected,
    /// The archiver ran synchronously and did not succeed
    Failed {
        entries: usize,
        outcome: CommandOutcome,
    },
}

impl ArchiveAction {
    pub fn is_failure(&self) -> bool {
        match self {
            ArchiveAction::Failed { .. } => true,
            ArchiveAction::Dispatched {
                outcome: Some(outcome),
                ..
            } => !outcome.is_success(),
            _ => false,
        }
    }
}

impl fmt::Display for ArchiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveAction::Skipped => write!(f, "exists, skipped"),
            ArchiveAction::Created { entries } => write!(f, "created ({} files)", entries),
            ArchiveAction::Dispatched { entries, outcome } => match outcome {
                Some(outcome) => write!(f, "background ({} files): {}", entries, outcome),
                None => write!(f, "background ({} files): pending", entries),
            },
            ArchiveAction::NothingSelected => write!(f, "no matching files"),
            ArchiveAction::Failed { entries, outcome } => {
                write!(f, "failed ({} files): {}", entries, outcome)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentReport {
    pub tag: String,
    pub segment: String,
    pub archive: PathBuf,
    pub archive_action: ArchiveAction,
    /// `None` when the upload was not attempted
    pub upload: Option<CommandOutcome>,
}

impl ExperimentReport {
    pub fn is_failure(&self) -> bool {
        self.archive_action.is_failure()
            || !matches!(self.upload, Some(CommandOutcome::Success))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub experiments: Vec<ExperimentReport>,
    /// Set when the failure policy stopped the run early
    pub aborted: bool,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.aborted || self.experiments.iter().any(ExperimentReport::is_failure)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExperimentReport> {
        self.experiments.iter().filter(|e| e.is_failure())
    }

    pub fn uploads_attempted(&self) -> usize {
        self.experiments.iter().filter(|e| e.upload.is_some()).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for exp in &self.experiments {
            let upload = match &exp.upload {
                Some(outcome) => outcome.to_string(),
                None => "not attempted".to_string(),
            };
            writeln!(
                f,
                "{:<14} archive: {:<28} upload: {}",
                exp.tag, exp.archive_action.to_string(), upload
            )?;
        }
        let failed = self.failed().count();
        write!(
            f,
            "{} experiment(s), {} upload(s) attempted, {} failed",
            self.experiments.len(),
            self.uploads_attempted(),
            failed
        )?;
        if self.aborted {
            write!(f, " (aborted)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(action: ArchiveAction, upload: Option<CommandOutcome>) -> ExperimentReport {
        ExperimentReport {
            tag: "PI".into(),
            segment: "PI.AMIP".into(),
            archive: PathBuf::from("PI.AMIP.zip"),
            archive_action: action,
            upload,
        }
    }

    #[test]
    fn test_failure_classification() {
        assert!(!report(ArchiveAction::Skipped, Some(CommandOutcome::Success)).is_failure());
        assert!(report(ArchiveAction::Skipped, Some(CommandOutcome::NonZeroExit(1))).is_failure());
        assert!(report(
            ArchiveAction::Failed {
                entries: 2,
                outcome: CommandOutcome::NonZeroExit(12)
            },
            None
        )
        .is_failure());
        assert!(report(
            ArchiveAction::Dispatched {
                entries: 2,
                outcome: Some(CommandOutcome::Signalled(9))
            },
            Some(CommandOutcome::Success)
        )
        .is_failure());
        assert!(!report(
            ArchiveAction::Dispatched {
                entries: 2,
                outcome: None
            },
            Some(CommandOutcome::Success)
        )
        .is_failure());
    }

    #[test]
    fn test_summary_line() {
        let run = RunReport {
            experiments: vec![
                report(ArchiveAction::Created { entries: 3 }, Some(CommandOutcome::Success)),
                report(ArchiveAction::Skipped, Some(CommandOutcome::NonZeroExit(1))),
            ],
            aborted: false,
        };
        let text = run.to_string();
        assert!(text.contains("created (3 files)"));
        assert!(text.ends_with("2 experiment(s), 2 upload(s) attempted, 1 failed"));
        assert!(run.has_failures());
    }

    #[test]
    fn test_json_shape() {
        let run = RunReport {
            experiments: vec![report(
                ArchiveAction::Created { entries: 3 },
                Some(CommandOutcome::Success),
            )],
            aborted: false,
        };
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["experiments"][0]["archive_action"]["action"], "created");
        assert_eq!(json["experiments"][0]["archive_action"]["entries"], 3);
        assert_eq!(json["experiments"][0]["upload"]["status"], "success");
    }
}
