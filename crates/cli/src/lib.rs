pub mod cli;

/// Crates whose log output the binary filters by the configured level.
pub const LOG_TARGETS: &[&str] = &[
    "nxgradle",
    "nxgradle_cli",
    "nxgradle_core",
    "nxgradle_introspect",
    "nxgradle_extract",
];

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
