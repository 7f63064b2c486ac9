use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::builder::ProcessCommandBuilder;
use super::outcome::CommandOutcome;
use super::runner::{ProcessCommand, ProcessRunner};
use crate::manifest::DatasetPath;

/// Creates archives through an external `zip`-compatible utility
#[async_trait]
pub trait ArchiveRunner: Send + Sync {
    /// Create `archive` from `entries` and wait for the archiver to exit
    async fn create(&self, archive: &Path, entries: &[DatasetPath]) -> CommandOutcome;

    /// Start creating `archive` on a background task and return immediately
    fn spawn(
        &self,
        archive: &Path,
        entries: &[DatasetPath],
    ) -> tokio::task::JoinHandle<CommandOutcome>;
}

pub struct ArchiveRunnerImpl {
    runner: Arc<dyn ProcessRunner>,
    program: String,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl ArchiveRunnerImpl {
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

    /// `<program> <archive> <entry>...`, one invocation for all entries.
    ///
    /// Entries are passed as separate arguments, never through a shell, and
    /// are resolved relative to the working directory.
    pub fn command(&self, archive: &Path, entries: &[DatasetPath]) -> ProcessCommand {
        ProcessCommandBuilder::new(&self.program)
            .arg(archive.to_string_lossy())
            .args(entries)
            .current_dir(&self.working_dir)
            .maybe_timeout(self.timeout)
            .build()
    }
}

#[async_trait]
impl ArchiveRunner for ArchiveRunnerImpl {
    async fn create(&self, archive: &Path, entries: &[DatasetPath]) -> CommandOutcome {
        let command = self.command(archive, entries);
        let result = self.runner.run(command).await;
        if let Ok(ref output) = result {
            if !output.status.success() && !output.stderr.is_empty() {
                tracing::warn!("{} stderr: {}", self.program, output.stderr.trim_end());
            }
        }
        CommandOutcome::from_result(result)
    }

    fn spawn(
        &self,
        archive: &Path,
        entries: &[DatasetPath],
    ) -> tokio::task::JoinHandle<CommandOutcome> {
        let command = self.command(archive, entries);
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move { CommandOutcome::from_result(runner.run(command).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;

    fn entries() -> Vec<DatasetPath> {
        vec![
            DatasetPath::new("model_outputs/expA/clm/temp"),
            DatasetPath::new("model_outputs/expA/clm/ann/uvqt_clm.npz"),
        ]
    }

    #[test]
    fn test_command_passes_each_entry_as_argument() {
        let mock = MockProcessRunner::new();
        let archiver = ArchiveRunnerImpl::new(Arc::new(mock), "zip", Path::new("/data"))
            .with_timeout(Some(Duration::from_secs(60)));

        let command = archiver.command(Path::new("/data/expA.zip"), &entries());

        assert_eq!(command.program, "zip");
        assert_eq!(
            command.args,
            vec![
                "/data/expA.zip",
                "model_outputs/expA/clm/temp",
                "model_outputs/expA/clm/ann/uvqt_clm.npz",
            ]
        );
        assert_eq!(command.working_dir, Some(PathBuf::from("/data")));
        assert_eq!(command.timeout, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_create_reports_nonzero_exit() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("zip")
            .returns_exit_code(12)
            .returns_stderr("zip error: Nothing to do!")
            .finish();

        let archiver = ArchiveRunnerImpl::new(Arc::new(mock.clone()), "zip", Path::new("."));
        let outcome = archiver.create(Path::new("a.zip"), &entries()).await;

        assert_eq!(outcome, CommandOutcome::NonZeroExit(12));
        assert!(mock.verify_called("zip", 1));
    }

    #[tokio::test]
    async fn test_spawn_completes_in_background() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("zip").returns_success().finish();

        let archiver = ArchiveRunnerImpl::new(Arc::new(mock.clone()), "zip", Path::new("."));
        let handle = archiver.spawn(Path::new("a.zip"), &entries());

        assert_eq!(handle.await.unwrap(), CommandOutcome::Success);
        assert!(mock.verify_called("zip", 1));
    }

    #[tokio::test]
    async fn test_missing_archiver_is_launch_failure() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("zip").returns_not_found().finish();

        let archiver = ArchiveRunnerImpl::new(Arc::new(mock), "zip", Path::new("."));
        let outcome = archiver.create(Path::new("a.zip"), &entries()).await;

        assert!(matches!(outcome, CommandOutcome::LaunchFailed(_)));
    }
}
