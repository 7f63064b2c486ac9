use super::PipelineConfig;
use crate::error::{ClimpackError, ErrorCode, Result};
use std::collections::HashSet;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &PipelineConfig) -> Result<()> {
        Self::validate_experiments(config)?;
        Self::validate_variables(config)?;

        if config.repository_id.trim().is_empty() {
            return Err(Self::invalid("repository_id", "must not be empty"));
        }
        if config.archive_program.trim().is_empty() {
            return Err(Self::invalid("archive_program", "must not be empty"));
        }
        if config.upload_program.trim().is_empty() {
            return Err(Self::invalid("upload_program", "must not be empty"));
        }

        Ok(())
    }

    fn validate_experiments(config: &PipelineConfig) -> Result<()> {
        if config.experiments.is_empty() {
            return Err(Self::invalid("experiments", "at least one experiment is required"));
        }

        let mut tags = HashSet::new();
        for exp in &config.experiments {
            if exp.segment.is_empty() {
                return Err(Self::invalid(
                    "experiments",
                    format!("experiment '{}' has an empty path segment", exp.tag),
                ));
            }
            if exp.segment.contains(['/', '\n', '\r']) {
                return Err(Self::invalid(
                    "experiments",
                    format!(
                        "path segment '{}' must not contain '/' or line breaks",
                        exp.segment
                    ),
                ));
            }
            if !tags.insert(exp.tag.as_str()) {
                return Err(Self::invalid(
                    "experiments",
                    format!("duplicate experiment tag '{}'", exp.tag),
                ));
            }
        }

        // Selection is a substring match, so one segment inside another would
        // put the same files into two archives.
        for (i, a) in config.experiments.iter().enumerate() {
            for b in config.experiments.iter().skip(i + 1) {
                if a.segment.contains(&b.segment) || b.segment.contains(&a.segment) {
                    return Err(ClimpackError::invalid_field(
                        ErrorCode::CONFIG_OVERLAPPING_SEGMENTS,
                        "experiments",
                        format!(
                            "path segments '{}' and '{}' overlap",
                            a.segment, b.segment
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_variables(config: &PipelineConfig) -> Result<()> {
        for var in &config.variables {
            if var.is_empty() || var.contains(['\n', '\r']) {
                return Err(Self::invalid(
                    "variables",
                    format!("invalid variable name {:?}", var),
                ));
            }
        }
        if config.filtered_variable.is_empty() {
            return Err(Self::invalid("filtered_variable", "must not be empty"));
        }
        Ok(())
    }

    fn invalid(field: &str, message: impl Into<String>) -> ClimpackError {
        ClimpackError::invalid_field(ErrorCode::CONFIG_VALIDATION_FAILED, field, message)
    }
}
