use crate::catalog::SourceCatalog;
use crate::config::{CollisionPolicy, CompilerConfig, NamingStrategy};
use crate::extractor::RouteExtractor;
use crate::openapi_builder::{OpenApiBuilder, OpenApiDocument};
use crate::serializer::{serialize, write_to_file, OutputFormat};
use crate::source::SourceSet;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Generate an OpenAPI document from the handlers and types of a Rust web project
#[derive(Parser, Debug)]
#[command(name = "openapi-schema-compiler")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Configuration file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Schema naming strategy
    #[arg(long = "naming", value_enum)]
    pub naming: Option<NamingStrategy>,

    /// Policy for two types that compute the same schema name
    #[arg(long = "collision", value_enum)]
    pub collision: Option<CollisionPolicy>,

    /// Maximum nesting depth before a schema becomes opaque
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Maximum number of properties per object schema
    #[arg(long = "max-properties")]
    pub max_properties: Option<usize>,

    /// Document title
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Document version
    #[arg(long = "version-string")]
    pub version_string: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Validate and log already-parsed arguments
pub fn validate_args(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }
    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Load the configuration file, if any, and apply command-line overrides
pub fn load_config(args: &CliArgs) -> Result<CompilerConfig> {
    let mut config = match &args.config_path {
        Some(path) => CompilerConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CompilerConfig::default(),
    };

    if let Some(strategy) = args.naming {
        config.naming.strategy = strategy;
    }
    if let Some(collision) = args.collision {
        config.naming.collision = collision;
    }
    if let Some(max_depth) = args.max_depth {
        config.limits.max_depth = max_depth;
    }
    if let Some(max_properties) = args.max_properties {
        config.limits.max_properties = max_properties;
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(version) = &args.version_string {
        config.version = version.clone();
    }
    config.validate()?;

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Scan, parse, extract and build the document for a project
pub fn generate(project_path: &Path, config: &CompilerConfig) -> Result<OpenApiDocument> {
    info!("Scanning and parsing project sources...");
    let sources = SourceSet::load_excluding(project_path, &config.excludes)?;
    for warning in &sources.warnings {
        warn!("{}", warning);
    }
    if sources.is_empty() {
        anyhow::bail!("No Rust files could be parsed in the project directory");
    }
    info!("Parsed {} files", sources.len());

    let catalog = Arc::new(SourceCatalog::new(&sources.files));
    info!("Indexed {} type declarations", catalog.len());

    let endpoints = RouteExtractor.extract(&sources.files, &catalog);
    info!("Extracted {} endpoints", endpoints.len());
    if endpoints.is_empty() {
        warn!("No routes found in the project");
    }

    let mut builder = OpenApiBuilder::new(config, catalog);
    builder.add_endpoints(endpoints);
    let document = builder.build().context("Failed to build OpenAPI document")?;
    Ok(document)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let config = load_config(&args)?;
    let document = generate(&args.project_path, &config)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = serialize(&document, args.output_format)?;

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Paths: {}", document.paths.len());
    info!(
        "  - Schemas: {}",
        document.components.as_ref().map(|c| c.schemas.len()).unwrap_or(0)
    );

    Ok(())
}
