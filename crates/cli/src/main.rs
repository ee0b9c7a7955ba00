use nxgradle_cli::cli::commands::{CliArgs, Commands, ConfigArgs, ExtractArgs, IntrospectArgs};
use nxgradle_cli::cli::output::{OutputFormat, OutputFormatter};
use nxgradle_cli::{LOG_TARGETS, NAME, VERSION};
use nxgradle_core::fs::FileType;
use nxgradle_core::{FileSystem, NxGradleConfig, RealFileSystem};
use nxgradle_extract::{
    discover_config_files, split_config_files, Extractor, GradlePluginOptions, JsonFileStore,
};
use nxgradle_introspect::{GradleBuildModel, Introspector, NodesReport};

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Introspect(introspect_args) => handle_introspect(introspect_args, &args),
        Commands::Extract(extract_args) => handle_extract(extract_args, &args),
        Commands::Config(config_args) => handle_config(config_args, &args),
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if let Some(level_str) = &args.log_level {
            parse_level(level_str)
        } else if args.verbose {
            Level::DEBUG
        } else if args.quiet {
            Level::ERROR
        } else {
            let level_str = env::var("NXGRADLE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        };

        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            for target in LOG_TARGETS {
                if let Ok(directive) = format!("{}={}", target, level).parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Environment-derived configuration with command-line overrides applied.
fn load_config(
    cli: &CliArgs,
    workspace_root: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<NxGradleConfig> {
    let mut config = NxGradleConfig::default();

    if let Some(root) = workspace_root {
        config.workspace_root = root
            .canonicalize()
            .with_context(|| format!("Workspace root does not exist: {}", root.display()))?;
    }
    if let Some(dir) = output_dir {
        config.output_dir = Some(dir.to_path_buf());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.to_lowercase();
    }

    config.validate()?;
    debug!("Configuration:\n{}", config);
    Ok(config)
}

fn handle_introspect(args: &IntrospectArgs, cli: &CliArgs) -> i32 {
    match run_introspect(args, cli) {
        Ok(output) => {
            if !cli.quiet {
                print!("{}", ensure_newline(output));
            }
            0
        }
        Err(e) => {
            error!("Introspection failed: {:#}", e);
            1
        }
    }
}

fn run_introspect(args: &IntrospectArgs, cli: &CliArgs) -> Result<String> {
    let config = load_config(cli, args.workspace_root.as_deref(), args.output_dir.as_deref())?;
    let fs = RealFileSystem::new();

    let model = GradleBuildModel::load(&fs, &args.model)?;
    let (introspection, report_path) =
        Introspector::from_config(&config).introspect_to_file(&model, &fs, &config)?;

    for skipped in &introspection.skipped {
        warn!(
            project = %skipped.project_dir,
            reason = %skipped.reason,
            "Project left out of the report"
        );
    }

    let format: OutputFormat = args.format.into();
    OutputFormatter::new(format).format_introspection(&introspection, &report_path)
}

fn handle_extract(args: &ExtractArgs, cli: &CliArgs) -> i32 {
    let output = match run_extract(args, cli) {
        Ok(output) => output,
        Err(e) => {
            error!("Extraction failed: {:#}", e);
            return 1;
        }
    };

    if let Some(output_file) = &args.output {
        match fs::write(output_file, &output) {
            Ok(_) => {
                info!("Output written to: {}", output_file.display());
            }
            Err(e) => {
                error!("Failed to write output to file: {}", e);
                return 1;
            }
        }
    } else {
        print!("{}", ensure_newline(output));
    }

    0
}

fn run_extract(args: &ExtractArgs, cli: &CliArgs) -> Result<String> {
    let config = load_config(cli, args.workspace_root.as_deref(), None)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());

    let mut options = GradlePluginOptions::from_nx_json(fs.as_ref(), &config.workspace_root)?;
    for (task, name) in &args.target_names {
        options.set_target_name(task, name.clone());
    }
    let options = options.normalize();

    let report = load_report(args, &config, fs.as_ref())?;
    info!(projects = report.len(), "Loaded nodes report");

    let files = discover_config_files(&config.workspace_root)?;
    let config_files = split_config_files(&files);
    debug!(
        build_files = config_files.build_files.len(),
        gradle_roots = config_files.gradle_roots().len(),
        "Discovered Gradle files"
    );

    let store = JsonFileStore::new(fs.clone(), config.cache_path(&options.hash()?));
    let extractor = Extractor::new(fs.as_ref(), &report, config.workspace_root.clone());
    let results = extractor.create_nodes(&config_files.build_files, options, &store)?;

    let format: OutputFormat = args.format.into();
    OutputFormatter::new(format).format_nodes(&results)
}

/// Merges the explicitly given reports and models; without either, every
/// report in the report directory is read.
fn load_report(
    args: &ExtractArgs,
    config: &NxGradleConfig,
    fs: &dyn FileSystem,
) -> Result<NodesReport> {
    let mut report = NodesReport::new();

    let report_paths: Vec<PathBuf> = if args.reports.is_empty() && args.models.is_empty() {
        discover_reports(fs, &config.report_dir())?
    } else {
        args.reports.clone()
    };

    for path in &report_paths {
        debug!(path = %path.display(), "Reading nodes report");
        report.merge(NodesReport::load(fs, path)?);
    }

    let introspector = Introspector::from_config(config);
    for path in &args.models {
        let model = GradleBuildModel::load(fs, path)?;
        let introspection = introspector.introspect(&model)?;
        report.merge(introspection.report);
    }

    if report.is_empty() {
        warn!("Nodes report is empty, every build file will yield no project");
    }
    Ok(report)
}

fn discover_reports(fs: &dyn FileSystem, report_dir: &Path) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(report_dir) {
        debug!(dir = %report_dir.display(), "No report directory");
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs
        .read_dir(report_dir)?
        .into_iter()
        .filter(|entry| entry.file_type() == FileType::File && entry.file_name().ends_with(".json"))
        .map(|entry| entry.path)
        .collect();
    paths.sort();
    Ok(paths)
}

fn handle_config(args: &ConfigArgs, cli: &CliArgs) -> i32 {
    let config = match load_config(cli, args.workspace_root.as_deref(), None) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return 1;
        }
    };

    let format: OutputFormat = args.format.into();
    match OutputFormatter::new(format).format_config(&config) {
        Ok(output) => {
            print!("{}", ensure_newline(output));
            0
        }
        Err(e) => {
            error!("Failed to format configuration: {}", e);
            1
        }
    }
}

fn ensure_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}
