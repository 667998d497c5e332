use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("inventory error for {dataset:?}: {message}")]
    Inventory { dataset: String, message: String },

    #[error("invalid dataset path {0:?}: {1}")]
    Path(String, String),

    #[error("command {command:?} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new inventory error naming the affected dataset
    pub fn inventory<D: Into<String>, S: Into<String>>(dataset: D, msg: S) -> Self {
        Self::Inventory {
            dataset: dataset.into(),
            message: msg.into(),
        }
    }

    /// Creates a new dataset path error
    pub fn path<P: Into<String>, S: Into<String>>(path: P, msg: S) -> Self {
        Self::Path(path.into(), msg.into())
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Inventory { .. } => "inventory",
            Self::Path(..) => "path",
            Self::CommandFailed { .. } => "command",
            Self::Io(_) => "io",
            Self::Yaml(_) => "yaml",
            Self::Join(_) => "async",
        }
    }
}
