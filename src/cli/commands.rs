//! Command implementations

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::app::AppConfig;
use crate::cli::args::UploadArgs;
use crate::config::{ArchiveMode, ConfigLoader, Experiment, FailurePolicy, PipelineConfig};
use crate::error::{ClimpackError, ErrorCode};
use crate::manifest::ManifestGenerator;
use crate::orchestrator::{Orchestrator, RunReport};
use crate::subprocess::SubprocessManager;

/// Build the effective pipeline configuration from the global flags
pub fn load_config(app: &AppConfig, upload: Option<&UploadArgs>) -> Result<PipelineConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &app.config_file {
        loader = loader.load_file(path)?;
    }

    let config = loader
        .working_dir(app.working_dir.clone())
        .override_with(|config| {
            if let Some(args) = upload {
                apply_upload_flags(config, args);
            }
        })
        .build()?;
    Ok(config)
}

fn apply_upload_flags(config: &mut PipelineConfig, args: &UploadArgs) {
    if args.force_rebuild {
        config.force_rebuild = true;
    }
    if args.detach_archive {
        config.archive_mode = ArchiveMode::Detached;
    }
    if args.fail_fast {
        config.failure_policy = FailurePolicy::Abort;
    }
}

pub fn run_manifest(config: &PipelineConfig, output: Option<PathBuf>, print: bool) -> Result<()> {
    let generator = ManifestGenerator::from_config(config);

    if print {
        print!("{}", generator.generate().render());
        return Ok(());
    }

    let path = match output {
        Some(path) => config.resolve(&path),
        None => config.manifest_file(),
    };
    let manifest = generator.write_to(&path)?;
    println!(
        "Wrote {} entries for {} experiment(s) to {}",
        manifest.len(),
        config.experiments.len(),
        path.display()
    );
    Ok(())
}

pub async fn run_upload(
    config: &PipelineConfig,
    subprocess: &SubprocessManager,
    args: &UploadArgs,
) -> Result<()> {
    let experiments = select_experiments(config, &args.only)?;
    let report = Orchestrator::new(config, subprocess)
        .run_experiments(&experiments)
        .await?;

    print_report(&report, args.json)?;
    check_report(&report)
}

pub async fn run_pipeline(
    config: &PipelineConfig,
    subprocess: &SubprocessManager,
    args: &UploadArgs,
) -> Result<()> {
    ManifestGenerator::from_config(config)
        .write_to(&config.manifest_file())
        .context("Manifest generation failed")?;
    run_upload(config, subprocess, args).await
}

pub fn run_show_config(config: &PipelineConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}

/// Resolve `--only` selectors, keeping configuration order
fn select_experiments(config: &PipelineConfig, only: &[String]) -> Result<Vec<Experiment>> {
    if only.is_empty() {
        return Ok(config.experiments.clone());
    }

    for selector in only {
        if config.find_experiment(selector).is_none() {
            return Err(ClimpackError::invalid_field(
                ErrorCode::CONFIG_UNKNOWN_EXPERIMENT,
                "--only",
                format!("no experiment with tag or segment '{}'", selector),
            )
            .into());
        }
    }

    Ok(config
        .experiments
        .iter()
        .filter(|e| only.iter().any(|s| *s == e.tag || *s == e.segment))
        .cloned()
        .collect())
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(report).map_err(|e| {
            ClimpackError::other(format!("failed to render report: {}", e)).with_source(e)
        })?;
        println!("{}", rendered);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn check_report(report: &RunReport) -> Result<()> {
    if !report.has_failures() {
        return Ok(());
    }

    let failed: Vec<&str> = report.failed().map(|e| e.tag.as_str()).collect();
    Err(ClimpackError::execution_with_code(
        ErrorCode::EXEC_SUBPROCESS_FAILED,
        format!("{} experiment(s) failed: {}", failed.len(), failed.join(", ")),
        None,
    )
    .into())
}
