use std::{error::Error as _, path::PathBuf};

use thiserror::Error;

/// Every way a run can fail. All of them are terminal for the current run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Build directory not found: {}. Build step may have failed.", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Could not connect to {host}:{port}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: RemoteError,
    },

    #[error("{action} failed")]
    Upload {
        action: String,
        #[source]
        source: RemoteError,
    },
}

impl DeployError {
    pub fn upload(action: impl Into<String>, source: RemoteError) -> Self {
        DeployError::Upload {
            action: action.into(),
            source,
        }
    }

    /// Lines to print under the headline: the cause chain, then whatever a
    /// failed build wrote to stdout and stderr.
    pub fn details(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut source = self.source();
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        if let DeployError::Build(build) = self {
            for (stream, output) in [("stdout", &build.stdout), ("stderr", &build.stderr)] {
                let output = output.trim_end();
                if !output.is_empty() {
                    lines.push(format!("build {}:\n{}", stream, output));
                }
            }
        }
        lines
    }
}

/// The build command could not be started or exited unsuccessfully.
#[derive(Debug, Error)]
#[error("Build failed: {message}")]
pub struct BuildError {
    pub message: String,
    pub stdout: String,
    pub stderr: String,
}

/// A failure reported by the remote side or by reading a local file during a transfer.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Ftp(#[from] suppaftp::FtpError),

    #[error(transparent)]
    Tls(#[from] native_tls::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Protocol(String),
}
