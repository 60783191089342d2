use std::path::PathBuf;

/// Error types for hearth operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration document could not be read.
    #[error("Failed to read config {}: {}", .path.display(), .source)]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON (or has the wrong shape).
    #[error("Failed to parse config {}: {}", .path.display(), .source)]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A hook filter pattern failed to compile.
    #[error("Invalid hook filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A module's contents could not be loaded.
    #[error("Failed to load {}: {}", .path.display(), .source)]
    ModuleLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The generated HTML shell could not be written.
    #[error("Failed to write {}: {}", .path.display(), .source)]
    ShellWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A plugin hook failed.
    #[error("[plugin {plugin}] {hook} hook failed: {source}")]
    Plugin {
        plugin: String,
        hook: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Error reported by the build engine.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Invalid option value.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for hearth operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error raised inside a plugin hook.
    pub fn in_plugin(plugin: impl Into<String>, hook: &'static str, source: Error) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            hook,
            source: Box::new(source),
        }
    }

    pub fn engine(message: impl std::fmt::Display) -> Self {
        Error::Engine(message.to_string())
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::ConfigRead { .. } => "CONFIG_READ",
            Error::ConfigParse { .. } => "CONFIG_PARSE",
            Error::InvalidFilter { .. } => "INVALID_FILTER",
            Error::ModuleLoad { .. } => "MODULE_LOAD",
            Error::ShellWrite { .. } => "SHELL_WRITE",
            Error::Plugin { .. } => "PLUGIN_ERROR",
            Error::Engine(_) => "ENGINE_ERROR",
            Error::InvalidOption(_) => "INVALID_OPTION",
            Error::Io(_) => "IO_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::ConfigRead { path, .. } => Some(Box::new(format!(
                "Check that '{}' exists and is readable.",
                path.display()
            ))),
            Error::ConfigParse { .. } => Some(Box::new(
                "The config must be a JSON object with optional \"imports\" and \"compilerOptions\" keys.",
            )),
            Error::ModuleLoad { path, .. } => Some(Box::new(format!(
                "Check that '{}' exists. Import map targets are not validated up front.",
                path.display()
            ))),
            Error::ShellWrite { .. } => Some(Box::new(
                "Check disk space and permissions on the output directory.",
            )),
            Error::Plugin { source, .. } => source.help(),
            _ => None,
        }
    }
}
