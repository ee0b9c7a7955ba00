pub mod commands;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, ExtractArgs, IntrospectArgs};
pub use output::{OutputFormat, OutputFormatter};
