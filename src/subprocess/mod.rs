pub mod archive;
pub mod builder;
pub mod error;
pub mod mock;
pub mod outcome;
pub mod runner;
pub mod upload;


pub use archive::{ArchiveRunner, ArchiveRunnerImpl};
pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use outcome::CommandOutcome;
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};
pub use upload::{UploadRunner, UploadRunnerImpl};

use crate::config::PipelineConfig;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub fn production() -> Self {
        Self::new(Arc::new(runner::TokioProcessRunner))
    }

    pub fn mock() -> (Self, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
        (Self::new(runner), mock)
    }

    pub fn archiver(&self, config: &PipelineConfig) -> ArchiveRunnerImpl {
        ArchiveRunnerImpl::new(
            Arc::clone(&self.runner),
            &config.archive_program,
            &config.working_dir,
        )
        .with_timeout(config.archive_timeout_secs.map(Duration::from_secs))
    }

    pub fn uploader(&self, config: &PipelineConfig) -> UploadRunnerImpl {
        UploadRunnerImpl::new(
            Arc::clone(&self.runner),
            &config.upload_program,
            &config.working_dir,
        )
        .with_timeout(config.upload_timeout_secs.map(Duration::from_secs))
    }
}
