// SPDX-License-Identifier: GPL-3.0-only

//! Execution seam for the GPFS administration commands
//!
//! Everything above this module only sees captured standard output. Non-zero
//! exits surface as [`SysError::CommandFailed`] and are never retried here.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Result, SysError};

/// Runs one command to completion and returns its standard output.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        (**self).run(program, args)
    }
}

pub fn render(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}

/// Runs commands from the GPFS binary directory, falling back to `PATH`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    bin_dir: PathBuf,
}

impl SystemRunner {
    pub fn new<P: Into<PathBuf>>(bin_dir: P) -> Self {
        Self {
            bin_dir: bin_dir.into(),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    fn resolve(&self, program: &str) -> PathBuf {
        let candidate = self.bin_dir.join(program);
        if candidate.is_file() {
            return candidate;
        }
        which::which(program).unwrap_or(candidate)
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let rendered = render(program, args);
        let binary = self.resolve(program);
        debug!("Running {} ({})", rendered, binary.display());

        let output = Command::new(&binary)
            .args(args)
            .output()
            .map_err(|source| SysError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SysError::CommandFailed {
                command: rendered,
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_command_context() {
        let args = vec!["gpfs0".to_string(), "-Y".to_string()];
        assert_eq!(render("mmlsfs", &args), "mmlsfs gpfs0 -Y");
        assert_eq!(render("mmlscluster", &[]), "mmlscluster");
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let runner = SystemRunner::new("/nonexistent/gpfs/bin");
        let err = runner
            .run("mm-definitely-not-installed", &[])
            .expect_err("binary must not exist");
        assert!(matches!(err, SysError::Spawn { .. }));
    }
}
