pub mod config;
pub mod error;
pub mod fs;
pub mod output;
pub mod paths;

pub use config::{ConfigError, NxGradleConfig, Platform};
pub use error::NodesError;
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use output::schema::{CreateNodesResult, ProjectNode, ReportEntry, TargetSpec};
