//! CLI argument structures

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Package climate-model outputs per experiment and upload them
#[derive(Parser)]
#[command(name = "climpack")]
#[command(about = "climpack - Archive climate-model outputs per experiment and upload them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Pipeline configuration file (TOML); built-in defaults otherwise
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing model_outputs/ (defaults to current directory)
    #[arg(short = 'C', long = "working-dir", global = true, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the dataset manifest
    #[command(name = "manifest")]
    Manifest {
        /// Write the manifest here instead of the configured path
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the manifest to stdout instead of writing it
        #[arg(long)]
        print: bool,
    },

    /// Archive each experiment and upload the archives
    #[command(name = "upload")]
    Upload(UploadArgs),

    /// Generate the manifest, then archive and upload
    #[command(name = "run")]
    Run(UploadArgs),

    /// Print the effective configuration as TOML
    #[command(name = "show-config")]
    ShowConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UploadArgs {
    /// Rebuild archives that already exist
    #[arg(long)]
    pub force_rebuild: bool,

    /// Start the archiver in the background and upload without waiting for it
    #[arg(long)]
    pub detach_archive: bool,

    /// Stop at the first experiment that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Only process these experiments (tag or path segment); repeatable
    #[arg(long, value_name = "EXPERIMENT")]
    pub only: Vec<String>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_flags() {
        let cli = Cli::try_parse_from([
            "climpack",
            "-vv",
            "upload",
            "--force-rebuild",
            "--only",
            "PI",
            "--only",
            "LGM_M",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Upload(args) => {
                assert!(args.force_rebuild);
                assert!(!args.detach_archive);
                assert_eq!(args.only, vec!["PI", "LGM_M"]);
                assert!(args.json);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "climpack",
            "manifest",
            "-C",
            "/data",
            "--config",
            "climpack.toml",
        ])
        .unwrap();
        assert_eq!(cli.working_dir, Some(PathBuf::from("/data")));
        assert_eq!(cli.config, Some(PathBuf::from("climpack.toml")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["climpack"]).is_err());
    }
}
