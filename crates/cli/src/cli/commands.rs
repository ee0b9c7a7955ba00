use clap::{Parser, Subcommand, ValueEnum};
use nxgradle_core::ConfigError;
use std::path::PathBuf;

/// Gradle project graph extraction for Nx
#[derive(Parser, Debug)]
#[command(
    name = "nxgradle",
    about = "Gradle project graph extraction for Nx",
    version,
    author,
    long_about = "nxgradle turns a realized Gradle project tree into Nx project nodes. \
                  `introspect` writes a nodes report from a project model, `extract` maps \
                  build files to project nodes through a content-hash-keyed targets cache."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Write a nodes report from a Gradle project model",
        long_about = "Walks every project of a Gradle project model (as dumped by the Gradle \
                      side) and writes the nodes report to \
                      <output-dir>/<rootProjectName>.json.\n\n\
                      Examples:\n  \
                      nxgradle introspect --model build/nx/model.json\n  \
                      nxgradle introspect --model model.json --output-dir /tmp/reports"
    )]
    Introspect(IntrospectArgs),

    #[command(
        about = "Create project nodes for the Gradle build files of a workspace",
        long_about = "Discovers build.gradle(.kts) files, looks each project up in the nodes \
                      report and prints one result per file. Results are cached per option \
                      set under <workspaceDataDir>/gradle-<hash>.hash.\n\n\
                      Examples:\n  \
                      nxgradle extract\n  \
                      nxgradle extract --model model.json --format json\n  \
                      nxgradle extract --target-name test=unitTest"
    )]
    Extract(ExtractArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct IntrospectArgs {
    #[arg(long, value_name = "FILE", help = "Gradle project model JSON")]
    pub model: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        help = "Workspace root (defaults to NXGRADLE_WORKSPACE_ROOT or the current directory)"
    )]
    pub workspace_root: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Report directory (defaults to <workspace-root>/.nx/cache)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(
        long,
        value_name = "DIR",
        help = "Workspace root (defaults to NXGRADLE_WORKSPACE_ROOT or the current directory)"
    )]
    pub workspace_root: Option<PathBuf>,

    #[arg(
        long = "model",
        value_name = "FILE",
        help = "Introspect a Gradle project model instead of reading a report (repeatable)"
    )]
    pub models: Vec<PathBuf>,

    #[arg(
        long = "report",
        value_name = "FILE",
        help = "Nodes report to read; later reports win (repeatable)"
    )]
    pub reports: Vec<PathBuf>,

    #[arg(
        long = "target-name",
        value_name = "TASK=NAME",
        value_parser = parse_target_name,
        help = "Rename the target of a task, e.g. test=unitTest (repeatable)"
    )]
    pub target_names: Vec<(String, String)>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long, value_name = "DIR", help = "Workspace root")]
    pub workspace_root: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_target_name(s: &str) -> Result<(String, String), ConfigError> {
    let parse_error = |error: &str| ConfigError::ParseError {
        field: "--target-name".to_string(),
        error: format!("{} in '{}', expected TASK=NAME", error, s),
    };

    let (task, name) = s.split_once('=').ok_or_else(|| parse_error("missing '='"))?;
    let (task, name) = (task.trim(), name.trim());
    if task.is_empty() || name.is_empty() {
        return Err(parse_error("empty task or target name"));
    }
    Ok((task.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_introspect_requires_model() {
        assert!(CliArgs::try_parse_from(["nxgradle", "introspect"]).is_err());

        let args = CliArgs::parse_from(["nxgradle", "introspect", "--model", "model.json"]);
        match args.command {
            Commands::Introspect(introspect) => {
                assert_eq!(introspect.model, PathBuf::from("model.json"));
                assert!(introspect.output_dir.is_none());
                assert_eq!(introspect.format, OutputFormatArg::Human);
            }
            _ => panic!("Expected Introspect command"),
        }
    }

    #[test]
    fn test_default_extract_args() {
        let args = CliArgs::parse_from(["nxgradle", "extract"]);
        match args.command {
            Commands::Extract(extract) => {
                assert!(extract.models.is_empty());
                assert!(extract.reports.is_empty());
                assert!(extract.target_names.is_empty());
                assert_eq!(extract.format, OutputFormatArg::Json);
                assert!(extract.output.is_none());
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_repeatable_flags() {
        let args = CliArgs::parse_from([
            "nxgradle",
            "extract",
            "--report",
            "a.json",
            "--report",
            "b.json",
            "--target-name",
            "test=unitTest",
            "--target-name",
            "jar=package",
        ]);
        match args.command {
            Commands::Extract(extract) => {
                assert_eq!(extract.reports.len(), 2);
                assert_eq!(
                    extract.target_names,
                    vec![
                        ("test".to_string(), "unitTest".to_string()),
                        ("jar".to_string(), "package".to_string())
                    ]
                );
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_invalid_target_name() {
        assert!(parse_target_name("test").is_err());
        assert!(parse_target_name("=unitTest").is_err());
        assert!(parse_target_name("test=").is_err());
        assert!(
            CliArgs::try_parse_from(["nxgradle", "extract", "--target-name", "test"]).is_err()
        );
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["nxgradle", "config", "--log-level", "debug"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));

        assert!(CliArgs::try_parse_from(["nxgradle", "-v", "-q", "config"]).is_err());
    }
}
