use nxgradle_core::Platform;

const UNIX_WRAPPER: &str = "./gradlew ";
const WINDOWS_WRAPPER: &str = ".\\gradlew.bat ";

/// Wrapper invocation up to and including the project path separator,
/// e.g. `./gradlew :libs:core:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPrefix(String);

impl CommandPrefix {
    pub fn new(platform: Platform, build_tree_path: &str) -> Self {
        let mut command = match platform {
            Platform::Windows => WINDOWS_WRAPPER,
            Platform::Unix => UNIX_WRAPPER,
        }
        .to_string();

        command.push_str(build_tree_path);
        if !command.ends_with(':') {
            command.push(':');
        }

        Self(command)
    }

    pub fn task_command(&self, task_name: &str) -> String {
        format!("{}{}", self.0, task_name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
