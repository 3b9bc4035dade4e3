//! swagger-from-routes - Command-line tool for generating Swagger 2.0 documentation.
//!
//! Reads a controller manifest (compiled route table plus controller metadata)
//! and optionally a directory of Rust model sources, and writes the resulting
//! Swagger document.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-routes [OPTIONS] <MANIFEST>
//! ```
//!
//! # Examples
//!
//! ```bash
//! swagger-from-routes manifest.yaml -m src/models -o swagger.yaml
//! swagger-from-routes manifest.json -f json --base-path /api --ignore /admin
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_routes::cli;

fn main() -> Result<()> {
    // Parse once so the log level is known before anything is logged
    let parsed = cli::CliArgs::parse();

    let log_level = if parsed.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("swagger-from-routes starting...");

    let args = cli::parse_args_from_parsed(parsed)?;

    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
