use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};

use geo_sieve::error::util::validate_directory;
use geo_sieve::io::{find_geojson_files, read_json_file};
use geo_sieve::utils::logging::console;
use geo_sieve::{FeatureCollection, LogContext, ModelRegistry, ProcessorConfig, run_models};

#[derive(Parser, Debug)]
#[command(name = "geo-sieve", version, about = "Extract and deduplicate telecom GeoJSON layers")]
struct Cli {
    /// Model catalogue, the built-in one when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Run settings (JSON); defaults apply when the file is missing
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Log at debug level")]
    verbose: bool,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run models over every GeoJSON file under INPUT_DIR
    Process {
        input_dir: PathBuf,
        output_dir: PathBuf,
        /// Disable the full-signature duplicate pass
        #[arg(long)]
        no_duplicates: bool,
        /// Drop features that fail validation
        #[arg(long)]
        strict: bool,
        /// Model to run (repeatable); all models when omitted
        #[arg(long = "model", value_name = "ID")]
        models: Vec<String>,
        #[arg(long)]
        no_manifest: bool,
        #[arg(long)]
        no_per_file: bool,
    },
    /// Show which models a file matches
    Detect { file: PathBuf },
    /// List the model catalogue
    Models,
}

fn load_registry(path: Option<&Path>) -> anyhow::Result<ModelRegistry> {
    match path {
        Some(path) => {
            ModelRegistry::load(path).with_context(|| format!("Loading models from {}", path.display()))
        }
        None => ModelRegistry::builtin().context("Loading built-in models"),
    }
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<ProcessorConfig> {
    match path {
        Some(path) => {
            ProcessorConfig::load(path).with_context(|| format!("Loading settings from {}", path.display()))
        }
        None => Ok(ProcessorConfig::default()),
    }
}

fn process(cli: &Cli, registry: ModelRegistry, args: ProcessArgs<'_>) -> anyhow::Result<bool> {
    validate_directory(args.input_dir, "input directory")?;
    std::fs::create_dir_all(args.output_dir)
        .with_context(|| format!("Creating output directory {}", args.output_dir.display()))?;

    let mut config = load_settings(cli.settings.as_deref())?.with_strict_mode(args.strict);
    if args.no_duplicates {
        config = config.with_duplicate_detection(false);
    }
    config.write_manifest &= !args.no_manifest;
    config.write_per_file &= !args.no_per_file;
    config.show_progress &= !cli.json;
    info!("{config}");

    let files = find_geojson_files(args.input_dir, Some(args.output_dir))?;
    if files.is_empty() {
        info!("No GeoJSON files found in {}", args.input_dir.display());
    }

    let log = LogContext::new("geo_sieve", "process");
    let report = run_models(Arc::new(registry), args.models, &files, args.output_dir, &config, &log)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        console::print_run_report(&report);
    }
    Ok(report.is_success())
}

struct ProcessArgs<'a> {
    input_dir: &'a Path,
    output_dir: &'a Path,
    no_duplicates: bool,
    strict: bool,
    models: &'a [String],
    no_manifest: bool,
    no_per_file: bool,
}

fn detect(cli: &Cli, registry: &ModelRegistry, file: &Path) -> anyhow::Result<bool> {
    let (value, _) = read_json_file(file)?;
    let name = file.display().to_string();
    let (collection, _) = FeatureCollection::from_value(value, &name)?;
    let observed = collection.observed_fields();
    let matches = registry.detector().detect_all(&observed);

    if cli.json {
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        let out = serde_json::json!({ "file": name, "observed_fields": observed, "matches": ids });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        console::print_detection(&name, &observed, &matches);
    }
    Ok(!matches.is_empty())
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let registry = load_registry(cli.config.as_deref())?;
    match &cli.command {
        Commands::Process {
            input_dir,
            output_dir,
            no_duplicates,
            strict,
            models,
            no_manifest,
            no_per_file,
        } => process(
            cli,
            registry,
            ProcessArgs {
                input_dir,
                output_dir,
                no_duplicates: *no_duplicates,
                strict: *strict,
                models,
                no_manifest: *no_manifest,
                no_per_file: *no_per_file,
            },
        ),
        Commands::Detect { file } => detect(cli, &registry, file),
        Commands::Models => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&registry.export()?)?);
            } else {
                console::print_models(&registry);
            }
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
