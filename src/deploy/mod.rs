use std::fs;

use console::style;
use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use tracing::debug;

use crate::build::Builder;
use crate::cleanup::Cleanup;
use crate::cmd::RunFlags;
use crate::config::{DeployConfig, Environment};
use crate::error::{DeployError, RemoteError};
use crate::ftp::{clear_working_dir, ensure_dir, upload_dir, Connector, RemoteFs};
use crate::io::{is_directory, scan_tree};
use crate::{CONNECTING, TRUCK};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Built only; nothing was uploaded.
    Skipped,
    /// Uploaded, local build output kept.
    Preserved,
    /// Uploaded, local build output removed.
    Cleaned,
    /// Uploaded, but the local build output could not be removed.
    CleanupFailed(String),
}

/// Build, then upload unless skipped, then remove the local output unless preserved.
pub fn run<B, C, D>(
    builder: &B,
    uploader: &Uploader<C>,
    cleanup: &D,
    env: &Environment,
    flags: RunFlags,
) -> Result<Outcome, DeployError>
where
    B: Builder,
    C: Connector,
    D: Cleanup,
{
    debug!(?flags, "building");
    builder.build()?;

    if flags.skip_deploy {
        println!("Skipping deploy (--skip-deploy). Done.");
        return Ok(Outcome::Skipped);
    }

    debug!("deploying");
    let config = DeployConfig::from_env(env)?;
    uploader.upload(&config, flags.clean)?;

    if flags.preserve_dist {
        println!(
            "Preserving {}/ folder (--preserve-dist).",
            config.local_dir.display()
        );
        return Ok(Outcome::Preserved);
    }

    debug!("cleaning up");
    let local_dir = fs::canonicalize(&config.local_dir).unwrap_or(config.local_dir);
    match cleanup.remove(&local_dir) {
        Ok(()) => Ok(Outcome::Cleaned),
        Err(err) => {
            eprintln!(
                "{} could not delete {}: {}",
                style("warning:").yellow().bold(),
                local_dir.display(),
                err
            );
            Ok(Outcome::CleanupFailed(err.to_string()))
        }
    }
}

pub struct Uploader<C> {
    connector: C,
}

/// Closes the session when dropped, whichever way the upload ends.
struct Connection<S: RemoteFs>(S);

impl<S: RemoteFs> Drop for Connection<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl<C: Connector> Uploader<C> {
    pub fn new(connector: C) -> Self {
        Uploader { connector }
    }

    pub fn upload(&self, config: &DeployConfig, clean: bool) -> Result<(), DeployError> {
        if !is_directory(&config.local_dir) {
            return Err(DeployError::MissingArtifact(config.local_dir.clone()));
        }
        let tree = scan_tree(&config.local_dir).map_err(|e| {
            DeployError::upload(
                format!("Reading {}", config.local_dir.display()),
                RemoteError::Io(e),
            )
        })?;

        println!("{}", config.target_line());
        println!(
            "{} {} Connecting to {}:{} (secure={}) ...",
            style("[2/3]").bold().dim(),
            CONNECTING,
            config.host,
            config.port,
            config.secure
        );
        let session = self
            .connector
            .connect(config)
            .map_err(|source| DeployError::Connection {
                host: config.host.clone(),
                port: config.port,
                source,
            })?;
        let mut conn = Connection(session);

        println!("Ensuring remote directory: {}", config.remote_dir);
        ensure_dir(&mut conn.0, &config.remote_dir).map_err(|e| {
            DeployError::upload(format!("Ensuring remote directory {}", config.remote_dir), e)
        })?;

        if clean {
            println!("Clearing remote directory (--clean)...");
            clear_working_dir(&mut conn.0)
                .map_err(|e| DeployError::upload("Clearing remote directory", e))?;
        }

        let local = fs::canonicalize(&config.local_dir).unwrap_or_else(|_| config.local_dir.clone());
        println!(
            "{} {} Uploading {} files from {} -> {}",
            style("[2/3]").bold().dim(),
            TRUCK,
            tree.file_count(),
            local.display(),
            config.remote_dir
        );
        let total_size_pb = create_total_progressbar(tree.total_size());
        upload_dir(&mut conn.0, &tree, &total_size_pb)?;
        total_size_pb.finish_and_clear();

        println!("{}", style("Deployment completed successfully.").green());
        Ok(())
    }
}

fn create_total_progressbar(total_bytes: u64) -> ProgressBar {
    let total_size_pb = ProgressBar::new(total_bytes);
    if let Ok(sty) = ProgressStyle::with_template(
        "[{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}",
    ) {
        let sty = sty
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("#>-");
        total_size_pb.set_style(sty);
    }
    total_size_pb
}
