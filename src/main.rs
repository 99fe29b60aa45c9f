//! Command-line entry point.
//!
//! ```bash
//! openapi-schema-compiler ./my-api-project -c openapi.yaml -o openapi.yaml
//! openapi-schema-compiler ./my-api-project -f json --naming simple-with-args -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_schema_compiler::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI schema compiler starting...");

    let args = cli::validate_args(args)?;
    cli::run(args)?;

    Ok(())
}
