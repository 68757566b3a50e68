//! External package manager invoked as a subprocess

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::version::error::PackageManagerError;

/// Trait for the two package-manager operations the engine needs
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageManager: Send + Sync {
    /// Query published versions and dist-tags of `package`
    ///
    /// # Returns
    /// * `Ok(String)` - Raw JSON output with `versions` and `dist-tags` keys
    /// * `Err(PackageManagerError)` - If the tool is missing, fails or times out
    async fn view(&self, package: &str) -> Result<String, PackageManagerError>;

    /// Install `package@version` under `prefix`
    async fn install(
        &self,
        prefix: &Path,
        package: &str,
        version: &str,
    ) -> Result<(), PackageManagerError>;
}

/// Where the child's stdout goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    /// Captured and returned to the caller
    Capture,
    /// Shown to the user as it is produced
    Inherit,
}

/// `npm` command-line client
pub struct NpmCli {
    program: String,
    timeout: Duration,
}

impl NpmCli {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            timeout,
        }
    }

    /// Run the program with `args` and return its captured stdout (empty
    /// with [`Output::Inherit`]).
    ///
    /// stderr is always captured: it is attached to a failure, or forwarded
    /// to the log line by line after a successful run. The child is killed
    /// if the timeout elapses or the future is dropped.
    async fn run(&self, args: &[&str], stdout: Output) -> Result<Vec<u8>, PackageManagerError> {
        let command = args.join(" ");
        debug!("Running {} {}", self.program, command);

        let stdout_cfg = match stdout {
            Output::Capture => Stdio::piped(),
            Output::Inherit => Stdio::inherit(),
        };

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout_cfg)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => PackageManagerError::Missing {
                    program: self.program.clone(),
                },
                _ => PackageManagerError::Spawn {
                    program: self.program.clone(),
                    source,
                },
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| PackageManagerError::Timeout {
                program: self.program.clone(),
                command: command.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| PackageManagerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PackageManagerError::Failed {
                program: self.program.clone(),
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            if !line.trim().is_empty() {
                warn!(program = %self.program, "{}", line);
            }
        }

        Ok(output.stdout)
    }
}

#[async_trait::async_trait]
impl PackageManager for NpmCli {
    async fn view(&self, package: &str) -> Result<String, PackageManagerError> {
        let stdout = self
            .run(
                &["view", package, "versions", "dist-tags", "--json"],
                Output::Capture,
            )
            .await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn install(
        &self,
        prefix: &Path,
        package: &str,
        version: &str,
    ) -> Result<(), PackageManagerError> {
        let prefix = prefix.to_string_lossy();
        let spec = format!("{package}@{version}");
        self.run(&["install", "--prefix", &prefix, &spec], Output::Inherit)
            .await?;
        Ok(())
    }
}
