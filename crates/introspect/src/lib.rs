//! Gradle project tree introspection
//!
//! Walks a realized project tree and turns every project into a report entry:
//! targets derived from tasks, target groups, and project-level dependency
//! edges to child projects and included builds. Projects whose introspection
//! fails are left out of the report instead of failing the walk.

pub mod command;
pub mod introspector;
pub mod model;
pub mod report;

pub use command::CommandPrefix;
pub use introspector::{
    IntrospectError, Introspection, Introspector, ProjectOutcome, SkippedProject,
};
pub use model::{BuildProject, GradleBuildModel, GradleTask, ProjectTree, TaskRef};
pub use report::NodesReport;
