use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const REPORT_DIR: &str = ".nx/cache";
const WORKSPACE_DATA_DIR: &str = ".nx/workspace-data";

/// Platform family the generated commands target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    pub fn from_env() -> Self {
        let platform = env::var("NXGRADLE_PLATFORM").ok();

        match platform.as_deref() {
            Some(p) if p.eq_ignore_ascii_case("windows") => Platform::Windows,
            Some(p) if p.eq_ignore_ascii_case("unix") => Platform::Unix,
            _ => Platform::current(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct NxGradleConfig {
    pub workspace_root: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub workspace_data_dir: Option<PathBuf>,
    pub log_level: String,
    pub platform: Platform,
}

impl Default for NxGradleConfig {
    fn default() -> Self {
        let workspace_root = env::var("NXGRADLE_WORKSPACE_ROOT")
            .ok()
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let output_dir = env::var("NXGRADLE_OUTPUT_DIR").ok().map(PathBuf::from);

        let workspace_data_dir = env::var("NX_WORKSPACE_DATA_DIRECTORY")
            .ok()
            .map(PathBuf::from);

        let log_level = env::var("NXGRADLE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            workspace_root,
            output_dir,
            workspace_data_dir,
            log_level,
            platform: Platform::from_env(),
        }
    }
}

impl NxGradleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.workspace_root.is_absolute() {
            return Err(ConfigError::ValidationFailed(format!(
                "Workspace root must be an absolute path, got {}",
                self.workspace_root.display()
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Directory the introspection report is written to.
    pub fn report_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.workspace_root.join(REPORT_DIR))
    }

    pub fn report_path(&self, root_project_name: &str) -> PathBuf {
        self.report_dir()
            .join(format!("{}.json", sanitize(root_project_name)))
    }

    pub fn workspace_data_dir(&self) -> PathBuf {
        self.workspace_data_dir
            .clone()
            .unwrap_or_else(|| self.workspace_root.join(WORKSPACE_DATA_DIR))
    }

    /// Targets cache file for one option set.
    pub fn cache_path(&self, options_hash: &str) -> PathBuf {
        self.workspace_data_dir()
            .join(format!("gradle-{}.hash", sanitize(options_hash)))
    }
}

fn sanitize(name: &str) -> String {
    name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

impl fmt::Display for NxGradleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nxgradle Configuration:")?;
        writeln!(f, "  Workspace Root: {}", self.workspace_root.display())?;
        writeln!(f, "  Report Dir: {}", self.report_dir().display())?;
        writeln!(
            f,
            "  Workspace Data Dir: {}",
            self.workspace_data_dir().display()
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Platform: {:?}", self.platform)?;
        Ok(())
    }
}
