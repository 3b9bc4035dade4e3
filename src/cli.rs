use crate::config::{ParameterStrategy, ReaderConfig};
use crate::converter::ModelConverter;
use crate::manifest::Manifest;
use crate::model_registry::ModelRegistry;
use crate::reader::Reader;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Swagger from routes - generate a Swagger 2.0 document from a compiled route table and controller manifest
#[derive(Parser, Debug)]
#[command(name = "swagger-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the controller manifest (.yaml, .yml or .json)
    #[arg(value_name = "MANIFEST")]
    pub manifest_path: PathBuf,

    /// Directory of Rust sources defining the response and body models
    #[arg(short = 'm', long = "models", value_name = "MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Base path removed from every route (overrides the manifest)
    #[arg(long = "base-path", value_name = "PATH")]
    pub base_path: Option<String>,

    /// Also document controllers without an api descriptor
    #[arg(long = "scan-all")]
    pub scan_all: bool,

    /// Exclude a path and everything below it (repeatable)
    #[arg(long = "ignore", value_name = "PATH")]
    pub ignore: Vec<String>,

    /// Parameter binding strategy (overrides the manifest)
    #[arg(long = "strategy", value_enum)]
    pub strategy: Option<Strategy>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parameter binding strategies selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Strategy {
    /// Bind from the route's declared parameters
    RouteFirst,
    /// Bind from parameter annotations
    AnnotationFirst,
}

impl From<Strategy> for ParameterStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::RouteFirst => ParameterStrategy::RouteFirst,
            Strategy::AnnotationFirst => ParameterStrategy::AnnotationFirst,
        }
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.is_file() {
        anyhow::bail!("Manifest file does not exist: {}", args.manifest_path.display());
    }
    if let Some(models_dir) = &args.models_dir {
        if !models_dir.is_dir() {
            anyhow::bail!("Models path is not a directory: {}", models_dir.display());
        }
    }

    info!("Manifest: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    match &args.models_dir {
        Some(models_dir) => info!("Models: {}", models_dir.display()),
        None => info!("Models: none, named types become inline objects"),
    }

    Ok(args)
}

/// Apply command-line overrides on top of the manifest configuration
pub fn apply_overrides(args: &CliArgs, config: &mut ReaderConfig) {
    if let Some(base_path) = &args.base_path {
        config.base_path = base_path.clone();
    }
    if args.scan_all {
        config.scan_all_resources = true;
    }
    for ignored in &args.ignore {
        if !config.ignored_routes.contains(ignored) {
            config.ignored_routes.push(ignored.clone());
        }
    }
    if let Some(strategy) = args.strategy {
        config.parameter_strategy = strategy.into();
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting Swagger document generation...");

    // Step 1: Load the manifest
    info!("Loading manifest...");
    let manifest = Manifest::from_file(&args.manifest_path)
        .with_context(|| format!("Failed to load manifest: {}", args.manifest_path.display()))?;
    info!(
        "Found {} routes and {} controllers",
        manifest.routes.len(),
        manifest.controllers.len()
    );

    // Step 2: Resolve configuration
    let mut config = manifest.config.clone();
    apply_overrides(&args, &mut config);
    config.validate().context("Invalid reader configuration")?;
    debug!("Reader configuration: {:?}", config);

    // Step 3: Load model definitions
    let registry = match &args.models_dir {
        Some(models_dir) => {
            info!("Loading models...");
            let registry = ModelRegistry::from_dir(models_dir)
                .with_context(|| format!("Failed to load models from {}", models_dir.display()))?;
            for warning in &registry.warnings {
                warn!("{}", warning);
            }
            info!("Loaded {} models", registry.len());
            registry
        }
        None => ModelRegistry::new(),
    };
    let model_count = registry.len();

    // Step 4: Read controllers
    info!("Reading controllers...");
    let routes = manifest.route_table();
    if routes.is_empty() {
        warn!("The manifest declares no routes");
    }
    let converter = ModelConverter::new(registry);
    let mut reader = Reader::new(&config, &routes, &converter, &manifest);
    reader.read_all().context("Failed to read controllers")?;
    let document = reader.into_swagger();
    info!("Swagger document built successfully");

    // Step 5: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 6: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote Swagger document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    let operations: usize = document.paths.values().map(|item| item.operations().count()).sum();
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Routes: {}", routes.len());
    info!("  - Models loaded: {}", model_count);
    info!("  - Paths: {}", document.paths.len());
    info!("  - Operations: {}", operations);
    info!("  - Definitions: {}", document.definitions.len());

    Ok(())
}
