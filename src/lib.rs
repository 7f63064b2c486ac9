//! # climpack
//!
//! Packages climate-model outputs into one zip archive per experiment and
//! pushes each archive to a remote data repository through an external
//! upload script.
//!
//! ## Usage
//!
//! ```bash
//! climpack manifest            # list dataset files into file_paths.txt
//! climpack upload              # archive (if missing) and upload every experiment
//! climpack run --only PI       # both steps, for a subset of experiments
//! ```
//!
//! ## Modules
//!
//! - `app` - Logging setup and fatal error reporting
//! - `cli` - Command-line argument parsing and command routing
//! - `config` - Pipeline configuration, loading and validation
//! - `error` - Error types with stable numeric codes
//! - `manifest` - Dataset manifest generation, parsing and selection
//! - `orchestrator` - Sequential archive-then-upload driver and run reports
//! - `subprocess` - Process runner abstraction with archive and upload runners
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod subprocess;
