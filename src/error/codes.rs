/// Error code registry for climpack
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 3000-3999: Storage errors (manifest and archive files)
/// - 4000-4999: Execution errors (failed archive or upload steps)
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1007;
    pub const CONFIG_VALIDATION_FAILED: u16 = 1008;
    pub const CONFIG_OVERLAPPING_SEGMENTS: u16 = 1010;
    pub const CONFIG_UNKNOWN_EXPERIMENT: u16 = 1011;

    // Storage errors (3000-3999)
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_NOT_FOUND: u16 = 3004;
    pub const STORAGE_MANIFEST_WRITE: u16 = 3020;
    pub const STORAGE_MANIFEST_READ: u16 = 3021;
    pub const STORAGE_ARCHIVE_REMOVE: u16 = 3022;

    // Execution errors (4000-4999)
    pub const EXEC_SUBPROCESS_FAILED: u16 = 4003;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1001 => "Configuration file not found",
        1007 => "Failed to parse configuration",
        1008 => "Configuration validation failed",
        1010 => "Experiment path segments overlap",
        1011 => "Unknown experiment selector",

        3001 => "Storage I/O error",
        3004 => "Storage item not found",
        3020 => "Failed to write manifest",
        3021 => "Failed to read manifest",
        3022 => "Failed to remove stale archive",

        4003 => "Subprocess failed",

        9000 => "Generic error",

        _ => "Unknown error code",
    }
}
