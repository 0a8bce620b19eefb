//! External schema generator invocation
//!
//! The schema generator is an external program (typically one that
//! compiles the tracked type definition at a given version and reflects
//! a JSON Schema out of it). The pipeline only depends on the narrow
//! contract here, so tests substitute in-memory fakes.

use std::process::Command;

use crate::error::{LineageError, Result};
use crate::version::TagVersion;

/// Produces raw schema document bytes for one version
pub trait SchemaGenerator {
    fn generate(&self, version: &TagVersion) -> Result<Vec<u8>>;
}

/// Runs a configured external program once per version and captures the
/// schema document from its stdout.
///
/// Every `{version}` occurrence in the argument list is replaced with
/// the tag, and the tag is also exported as `LINEAGE_VERSION` for
/// programs that prefer the environment.
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl SchemaGenerator for CommandGenerator {
    fn generate(&self, version: &TagVersion) -> Result<Vec<u8>> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace("{version}", version.as_str()))
            .collect();

        tracing::debug!(program = %self.program, ?args, version = %version, "running generator");

        let output = Command::new(&self.program)
            .args(&args)
            .env("LINEAGE_VERSION", version.as_str())
            .output()
            .map_err(|err| LineageError::Generation {
                version: version.as_str().to_string(),
                message: format!("failed to run {}: {err}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LineageError::Generation {
                version: version.as_str().to_string(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(output.stdout)
    }
}
