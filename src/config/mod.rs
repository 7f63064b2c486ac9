//! Pipeline configuration
//!
//! A single [`PipelineConfig`] is built at startup and handed to both the
//! manifest generator and the orchestrator. Defaults reproduce the reference
//! deposition; a TOML file may override any field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod loader;
pub mod validator;

pub use loader::ConfigLoader;
pub use validator::ConfigValidator;

/// One simulation configuration: a short tag plus the canonical path segment
/// used in dataset paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub tag: String,
    pub segment: String,
}

impl Experiment {
    pub fn new(tag: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            segment: segment.into(),
        }
    }

    /// File name of this experiment's archive.
    ///
    /// Tags such as `LGM_Mw/Gice` are not valid file names, so the archive is
    /// keyed on the segment.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.segment)
    }
}

/// Temporal-smoothing variant applied to the filtered variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    #[serde(rename = "1y_lp")]
    Annual,
    #[serde(rename = "10d_lp")]
    TenDay,
    #[serde(rename = "10d_lp_residual")]
    TenDayResidual,
}

impl FilterType {
    pub const ALL: [FilterType; 3] = [
        FilterType::Annual,
        FilterType::TenDay,
        FilterType::TenDayResidual,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            FilterType::Annual => "uvqt_clm.npz",
            FilterType::TenDay => "uvqt_10d_lp_clmanom.npz",
            FilterType::TenDayResidual => "uvqt_10d_lp_clmanom_residual.npz",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::Annual => "1y_lp",
            FilterType::TenDay => "10d_lp",
            FilterType::TenDayResidual => "10d_lp_residual",
        }
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the archiver is driven relative to the upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveMode {
    /// Wait for the archiver and check its exit status before uploading
    #[default]
    Synchronous,
    /// Spawn the archiver in the background and upload immediately.
    ///
    /// The upload may see a missing or partially written archive. The
    /// background task is joined at the end of the run so its outcome is
    /// still reported.
    Detached,
}

/// What to do with the remaining experiments after one fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Remote repository (deposition) identifier passed to the uploader
    pub repository_id: String,
    /// Manifest file, relative to `working_dir` unless absolute
    pub manifest_path: PathBuf,
    /// Directory archives are written to and looked up in, relative to `working_dir`
    pub archive_dir: PathBuf,
    /// Directory the archiver and uploader run in; dataset paths are relative to it
    pub working_dir: PathBuf,
    pub variables: Vec<String>,
    /// Variable that is written once per filter type instead of once per experiment
    pub filtered_variable: String,
    pub filter_types: Vec<FilterType>,
    pub archive_program: String,
    pub upload_program: String,
    pub archive_mode: ArchiveMode,
    pub failure_policy: FailurePolicy,
    /// Rebuild archives even if they already exist
    pub force_rebuild: bool,
    pub archive_timeout_secs: Option<u64>,
    pub upload_timeout_secs: Option<u64>,
    pub experiments: Vec<Experiment>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repository_id: "10461149".to_string(),
            manifest_path: PathBuf::from("file_paths.txt"),
            archive_dir: PathBuf::from("."),
            working_dir: PathBuf::from("."),
            experiments: vec![
                Experiment::new("PI", "PI.AMIP_t42.20230831"),
                Experiment::new("LGM_Mw/Gice", "LGM.miroc_glomapice_anomtopo_t42.20230831"),
                Experiment::new("LGM_M", "LGM.miroc_anomtopo_t42.20230831"),
                Experiment::new("LGM_G", "LGM.glomap_anomtopo_t42.20230831"),
            ],
            variables: [
                "grsst",
                "gricr",
                "precwtot",
                "precw_d18O",
                "u250",
                "T2",
                "prcp_d18O",
                "sstgrad",
                "sens",
                "evap",
                "prcp",
                "vflow",
                "vprecwtot",
                "vprecw",
            ]
            .iter()
            .map(|v| v.to_string())
            .collect(),
            filtered_variable: "vprecw".to_string(),
            filter_types: FilterType::ALL.to_vec(),
            archive_program: "zip".to_string(),
            upload_program: "./zenodo_upload.sh".to_string(),
            archive_mode: ArchiveMode::default(),
            failure_policy: FailurePolicy::default(),
            force_rebuild: false,
            archive_timeout_secs: None,
            upload_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Resolve a configured path against the working directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.resolve(&self.manifest_path)
    }

    /// Archive path as handed to the archiver and uploader, which both run in
    /// `working_dir`
    pub fn archive_path(&self, experiment: &Experiment) -> PathBuf {
        if self.archive_dir.as_os_str().is_empty() || self.archive_dir == Path::new(".") {
            PathBuf::from(experiment.archive_name())
        } else {
            self.archive_dir.join(experiment.archive_name())
        }
    }

    /// Where the archive lives on the local filesystem
    pub fn archive_file(&self, experiment: &Experiment) -> PathBuf {
        self.resolve(&self.archive_path(experiment))
    }

    /// Look an experiment up by tag or segment
    pub fn find_experiment(&self, selector: &str) -> Option<&Experiment> {
        self.experiments
            .iter()
            .find(|e| e.tag == selector || e.segment == selector)
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }
}
