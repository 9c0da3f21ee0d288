use std::process::{Command, Output};

use console::style;
use tracing::debug;

use crate::error::BuildError;
use crate::HAMMER;

pub trait Builder {
    fn build(&self) -> Result<(), BuildError>;
}

/// Runs a build command line through the platform shell.
pub struct ShellBuilder {
    command: String,
}

impl ShellBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        ShellBuilder {
            command: command.into(),
        }
    }

    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", self.command.as_str()]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", self.command.as_str()]);
            cmd
        }
    }
}

impl Builder for ShellBuilder {
    fn build(&self) -> Result<(), BuildError> {
        println!(
            "{} {} Building site with `{}` ...",
            style("[1/3]").bold().dim(),
            HAMMER,
            self.command
        );
        debug!(command = %self.command, "spawning build");

        let output = self.shell().output().map_err(|e| BuildError {
            message: format!("could not run `{}`: {}", self.command, e),
            stdout: String::new(),
            stderr: String::new(),
        })?;

        let (stdout, stderr) = captured(&output);

        // on failure the caller reports the captured output along with the error
        if !output.status.success() {
            return Err(BuildError {
                message: format!("`{}` exited with {}", self.command, output.status),
                stdout,
                stderr,
            });
        }

        echo(&stdout, &stderr);
        println!("{}", style("Build completed successfully.").green());
        Ok(())
    }
}

fn captured(output: &Output) -> (String, String) {
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

fn echo(stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        println!("{}", stdout);
    }
    if !stderr.is_empty() {
        eprintln!("{}", stderr);
    }
}
