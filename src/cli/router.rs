//! Command routing and execution

use crate::app::AppConfig;
use crate::cli::args::Commands;
use crate::cli::commands::*;
use crate::subprocess::SubprocessManager;
use anyhow::Result;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Commands, app: &AppConfig) -> Result<()> {
    match command {
        Commands::Manifest { output, print } => {
            let config = load_config(app, None)?;
            run_manifest(&config, output, print)
        }
        Commands::Upload(args) => {
            let config = load_config(app, Some(&args))?;
            run_upload(&config, &SubprocessManager::production(), &args).await
        }
        Commands::Run(args) => {
            let config = load_config(app, Some(&args))?;
            run_pipeline(&config, &SubprocessManager::production(), &args).await
        }
        Commands::ShowConfig => {
            let config = load_config(app, None)?;
            run_show_config(&config)
        }
    }
}
