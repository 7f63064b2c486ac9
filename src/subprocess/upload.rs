use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::builder::ProcessCommandBuilder;
use super::outcome::CommandOutcome;
use super::runner::{ProcessCommand, ProcessRunner};

/// Uploads a local file to the remote repository through an external script
#[async_trait]
pub trait UploadRunner: Send + Sync {
    async fn upload(&self, repository_id: &str, archive: &Path) -> CommandOutcome;
}

pub struct UploadRunnerImpl {
    runner: Arc<dyn ProcessRunner>,
    program: String,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl UploadRunnerImpl {
    pub fn new(runner: Arc<dyn ProcessRunner>, program: &str, working_dir: &Path) -> Self {
        Self {
            runner,
            program: program.to_string(),
            working_dir: working_dir.to_path_buf(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<program> <repository-id> <archive>`
    pub fn command(&self, repository_id: &str, archive: &Path) -> ProcessCommand {
        ProcessCommandBuilder::new(&self.program)
            .arg(repository_id)
            .arg(archive.to_string_lossy())
            .current_dir(&self.working_dir)
            .maybe_timeout(self.timeout)
            .build()
    }
}

#[async_trait]
impl UploadRunner for UploadRunnerImpl {
    async fn upload(&self, repository_id: &str, archive: &Path) -> CommandOutcome {
        let result = self.runner.run(self.command(repository_id, archive)).await;
        if let Ok(ref output) = result {
            for line in output.stdout.lines() {
                tracing::debug!("{}: {}", self.program, line);
            }
            if !output.status.success() && !output.stderr.is_empty() {
                tracing::warn!("{} stderr: {}", self.program, output.stderr.trim_end());
            }
        }
        CommandOutcome::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;

    #[tokio::test]
    async fn test_upload_passes_repository_then_archive() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("./zenodo_upload.sh")
            .with_args(|args| args == ["10461149", "PI.AMIP_t42.20230831.zip"])
            .returns_stdout("Uploading PI.AMIP_t42.20230831.zip\n")
            .returns_success()
            .finish();

        let uploader =
            UploadRunnerImpl::new(Arc::new(mock.clone()), "./zenodo_upload.sh", Path::new("."));
        let outcome = uploader
            .upload("10461149", Path::new("PI.AMIP_t42.20230831.zip"))
            .await;

        assert_eq!(outcome, CommandOutcome::Success);
        assert!(mock.verify_called("./zenodo_upload.sh", 1));
    }

    #[tokio::test]
    async fn test_upload_timeout() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("upload")
            .returns_timeout(Duration::from_secs(5))
            .finish();

        let uploader = UploadRunnerImpl::new(Arc::new(mock), "upload", Path::new("."))
            .with_timeout(Some(Duration::from_secs(5)));
        let outcome = uploader.upload("1", Path::new("a.zip")).await;

        assert_eq!(outcome, CommandOutcome::TimedOut);
    }
}
