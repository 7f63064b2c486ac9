use super::{DatasetPath, Manifest};
use crate::config::{Experiment, FilterType, PipelineConfig};
use crate::error::Result;
use std::path::Path;

const OUTPUT_ROOT: &str = "model_outputs";

/// Enumerates dataset paths for experiments × variables × filter types.
///
/// Entries are grouped by experiment in configuration order. Within an
/// experiment, plain variables come first in variable order, then one file
/// per filter type for the filtered variable.
pub struct ManifestGenerator<'a> {
    experiments: &'a [Experiment],
    variables: &'a [String],
    filtered_variable: &'a str,
    filter_types: &'a [FilterType],
}

impl<'a> ManifestGenerator<'a> {
    pub fn new(
        experiments: &'a [Experiment],
        variables: &'a [String],
        filtered_variable: &'a str,
        filter_types: &'a [FilterType],
    ) -> Self {
        Self {
            experiments,
            variables,
            filtered_variable,
            filter_types,
        }
    }

    pub fn from_config(config: &'a PipelineConfig) -> Self {
        Self::new(
            &config.experiments,
            &config.variables,
            &config.filtered_variable,
            &config.filter_types,
        )
    }

    pub fn generate(&self) -> Manifest {
        let include_filtered = self.variables.iter().any(|v| v == self.filtered_variable);
        let mut entries = Vec::new();

        // Each experiment's filtered files follow its plain variables rather
        // than coming in a second pass over all experiments. Selection by
        // segment yields the same entries either way; only the file order differs.
        for exp in self.experiments {
            for var in self.variables {
                if var != self.filtered_variable {
                    entries.push(Self::variable_path(exp, var));
                }
            }
            if include_filtered {
                for filter in self.filter_types {
                    entries.push(Self::filtered_path(exp, *filter));
                }
            }
        }

        Manifest::new(entries)
    }

    /// Generate and atomically write the manifest to `path`
    pub fn write_to(&self, path: &Path) -> Result<Manifest> {
        let manifest = self.generate();
        tracing::debug!(
            "Generated {} entries for {} experiments",
            manifest.len(),
            self.experiments.len()
        );
        manifest.write_atomic(path)?;
        Ok(manifest)
    }

    fn variable_path(exp: &Experiment, var: &str) -> DatasetPath {
        DatasetPath::new(format!("{}/{}/clm/{}", OUTPUT_ROOT, exp.segment, var))
    }

    fn filtered_path(exp: &Experiment, filter: FilterType) -> DatasetPath {
        DatasetPath::new(format!(
            "{}/{}/clm/ann/{}",
            OUTPUT_ROOT,
            exp.segment,
            filter.file_name()
        ))
    }
}
