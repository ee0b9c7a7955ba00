//! Project node extraction
//!
//! Maps Gradle build files to Nx project nodes using an introspection report.
//! Results are cached per option set under a fingerprint of each project
//! directory, so unchanged projects never hit the report again.

pub mod discovery;
pub mod extractor;
pub mod fingerprint;
pub mod options;
pub mod store;

pub use discovery::{discover_config_files, split_config_files, GradleConfigFiles};
pub use extractor::{apply_target_names, project_root_of, Extractor};
pub use fingerprint::project_fingerprint;
pub use options::{GradlePluginOptions, PLUGIN_NAME};
pub use store::{CacheEntries, CacheStore, JsonFileStore, MemoryStore, TargetsCache};
