//! Archive-and-upload orchestration
//!
//! Experiments are processed strictly one after another: build the archive
//! (unless it already exists), then upload it. The manifest is re-read for
//! every archive that has to be built.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ArchiveMode, Experiment, FailurePolicy, PipelineConfig};
use crate::error::{ClimpackError, ErrorCode, Result};
use crate::manifest::Manifest;
use crate::subprocess::{ArchiveRunner, CommandOutcome, SubprocessManager, UploadRunner};

pub mod report;


pub use report::{ArchiveAction, ExperimentReport, RunReport};

type PendingArchive = (usize, tokio::task::JoinHandle<CommandOutcome>);

pub struct Orchestrator<'a> {
    config: &'a PipelineConfig,
    archiver: Arc<dyn ArchiveRunner>,
    uploader: Arc<dyn UploadRunner>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a PipelineConfig, subprocess: &SubprocessManager) -> Self {
        Self::with_runners(
            config,
            Arc::new(subprocess.archiver(config)),
            Arc::new(subprocess.uploader(config)),
        )
    }

    pub fn with_runners(
        config: &'a PipelineConfig,
        archiver: Arc<dyn ArchiveRunner>,
        uploader: Arc<dyn UploadRunner>,
    ) -> Self {
        Self {
            config,
            archiver,
            uploader,
        }
    }

    /// Process every configured experiment
    pub async fn run(&self) -> Result<RunReport> {
        self.run_experiments(&self.config.experiments).await
    }

    /// Process the given experiments in order
    pub async fn run_experiments(&self, experiments: &[Experiment]) -> Result<RunReport> {
        let mut report = RunReport::default();
        let mut pending: Vec<PendingArchive> = Vec::new();

        for experiment in experiments {
            info!("Experiment: {}", experiment.segment);
            let (exp_report, handle) = self.process(experiment).await?;

            if let Some(handle) = handle {
                pending.push((report.experiments.len(), handle));
            }

            let failed = exp_report.is_failure();
            report.experiments.push(exp_report);

            if failed && self.config.failure_policy == FailurePolicy::Abort {
                warn!(
                    "Stopping after failure in {} ({} experiment(s) not processed)",
                    experiment.tag,
                    experiments.len() - report.experiments.len()
                );
                report.aborted = true;
                break;
            }
        }

        self.join_pending(&mut report, pending).await?;
        Ok(report)
    }

    async fn process(
        &self,
        experiment: &Experiment,
    ) -> Result<(ExperimentReport, Option<tokio::task::JoinHandle<CommandOutcome>>)> {
        let archive = self.config.archive_path(experiment);
        let archive_file = self.config.archive_file(experiment);
        let mut handle = None;

        let archive_action = if archive_file.exists() && !self.config.force_rebuild {
            debug!("Archive {} exists, skipping creation", archive.display());
            ArchiveAction::Skipped
        } else {
            if archive_file.exists() {
                info!("Rebuilding {}", archive.display());
                Self::remove_archive(&archive_file)?;
            }

            let manifest = Manifest::read(&self.config.manifest_file())?;
            let entries = manifest.select(&experiment.segment);
            debug!(
                "Selected {} of {} manifest entries for {}",
                entries.len(),
                manifest.len(),
                experiment.segment
            );

            if entries.is_empty() {
                warn!(
                    "No manifest entries contain '{}', not creating {}",
                    experiment.segment,
                    archive.display()
                );
                ArchiveAction::NothingSelected
            } else {
                match self.config.archive_mode {
                    ArchiveMode::Synchronous => {
                        let outcome = self.archiver.create(&archive, &entries).await;
                        if outcome.is_success() {
                            info!("Created {} ({} files)", archive.display(), entries.len());
                            ArchiveAction::Created {
                                entries: entries.len(),
                            }
                        } else {
                            warn!("Archiving {} failed: {}", archive.display(), outcome);
                            ArchiveAction::Failed {
                                entries: entries.len(),
                                outcome,
                            }
                        }
                    }
                    ArchiveMode::Detached => {
                        debug!("Archiving {} in the background", archive.display());
                        handle = Some(self.archiver.spawn(&archive, &entries));
                        ArchiveAction::Dispatched {
                            entries: entries.len(),
                            outcome: None,
                        }
                    }
                }
            }
        };

        // A failed zip may still leave a partial archive behind
        if archive_action.is_failure() && archive_file.exists() {
            Self::remove_archive(&archive_file)?;
        }

        let upload = if archive_action.is_failure() {
            warn!("Not uploading {} after archive failure", archive.display());
            None
        } else {
            let outcome = self
                .uploader
                .upload(&self.config.repository_id, &archive)
                .await;
            if outcome.is_success() {
                info!(
                    "Uploaded {} to repository {}",
                    archive.display(),
                    self.config.repository_id
                );
            } else {
                warn!("Upload of {} failed: {}", archive.display(), outcome);
            }
            Some(outcome)
        };

        let report = ExperimentReport {
            tag: experiment.tag.clone(),
            segment: experiment.segment.clone(),
            archive,
            archive_action,
            upload,
        };
        Ok((report, handle))
    }

    fn remove_archive(archive: &Path) -> Result<()> {
        debug!("Removing {}", archive.display());
        std::fs::remove_file(archive).map_err(|e| {
            ClimpackError::storage_with_code(
                ErrorCode::STORAGE_ARCHIVE_REMOVE,
                format!("failed to remove archive: {}", e),
                Some(archive.to_path_buf()),
            )
            .with_source(e)
        })
    }

    async fn join_pending(
        &self,
        report: &mut RunReport,
        pending: Vec<PendingArchive>,
    ) -> Result<()> {
        for (index, handle) in pending {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => CommandOutcome::TaskFailed(e.to_string()),
            };

            if let Some(exp) = report.experiments.get_mut(index) {
                if !outcome.is_success() {
                    warn!(
                        "Background archiving of {} finished with: {}",
                        exp.archive.display(),
                        outcome
                    );
                    let archive_file = self.config.resolve(&exp.archive);
                    if archive_file.exists() {
                        Self::remove_archive(&archive_file)?;
                    }
                }
                if let ArchiveAction::Dispatched { outcome: slot, .. } = &mut exp.archive_action {
                    *slot = Some(outcome);
                }
            }
        }
        Ok(())
    }
}
