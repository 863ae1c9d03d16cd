//! Batch conversion of CommonJS files to ES modules.
//!
//! Inputs are files or directories; directories are walked honoring
//! `.gitignore`. Every file is converted independently on the rayon pool and
//! either written back in place, mirrored into an output directory, or kept in
//! the report.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use esmify_convert::{Config, print_report, run_convert};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config::parse_from(["convert", "src", "--out-dir", "dist"]);
//! let result = run_convert(cfg)?;
//! print_report(&mut std::io::stdout(), &result)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod reporter;
mod runner;
mod types;

// Re-export public API
pub use config::{Config, FileConfig, Settings};
pub use reporter::{print_converted_code, print_json, print_report, print_summary};
pub use runner::run_convert;
pub use types::{ConvertResult, FileReport, FileStatus, FileWarning};
