use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    PackageManager(#[from] PackageManagerError),

    #[error("no valid version on the registry for {package}")]
    NoValidVersion { package: String },

    #[error("registry unavailable: {}", attempts.join("; "))]
    Unavailable { attempts: Vec<String> },

    #[error("invalid version or tag \"{0}\", see available versions using \"gitbook ls-remote\"")]
    InvalidVersion(String),
}

#[derive(Debug, Error)]
pub enum PackageManagerError {
    #[error("package manager `{program}` not found")]
    Missing { program: String },

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {command}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{program} {command}` timed out after {timeout:?}")]
    Timeout {
        program: String,
        command: String,
        timeout: Duration,
    },
}
