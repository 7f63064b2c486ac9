//! Error handling utilities

use tracing::error;

/// Report a fatal error and exit with the matching status code
///
/// - For `ClimpackError`: shows the user message, and the full cause chain in verbose mode
/// - For other errors: shows the error message and exits with 1
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    std::process::exit(report_fatal_error(&error, verbose))
}

/// Print `error` to stderr and return the exit code it maps to
pub fn report_fatal_error(error: &anyhow::Error, verbose: u8) -> i32 {
    use crate::error::ClimpackError;

    error!("Fatal error: {}", error);

    if let Some(err) = error.downcast_ref::<ClimpackError>() {
        eprintln!("Error: {}", err.user_message());
        if verbose >= 1 {
            eprintln!("\n{}", err.developer_message());
        }
        err.exit_code()
    } else {
        eprintln!("Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClimpackError, ErrorCode};

    #[test]
    fn test_exit_code_from_climpack_error() {
        let err = anyhow::Error::new(ClimpackError::config_with_code(
            ErrorCode::CONFIG_OVERLAPPING_SEGMENTS,
            "overlap",
        ));
        assert_eq!(report_fatal_error(&err, 0), 2);
    }

    #[test]
    fn test_exit_code_for_other_errors() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(report_fatal_error(&err, 1), 1);
    }
}
