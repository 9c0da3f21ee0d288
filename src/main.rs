use std::{env, process::ExitCode};

use build::ShellBuilder;
use cleanup::RemoveBuildDir;
use config::Environment;
use console::{style, Emoji};
use deploy::Uploader;
use ftp::FtpConnector;
use tracing::debug;

mod build;
mod cleanup;
mod cmd;
mod config;
mod deploy;
mod error;
mod ftp;
mod io;
mod logging;
mod util;

static HAMMER: Emoji<'_, '_> = Emoji("🔨  ", "");
static CONNECTING: Emoji<'_, '_> = Emoji("🔗  ", "");
static TRUCK: Emoji<'_, '_> = Emoji("🚚  ", "");
static BROOM: Emoji<'_, '_> = Emoji("🧹  ", "");

fn main() -> ExitCode {
    if let Err(err) = logging::try_init(env::var("RUST_LOG").ok().as_deref(), std::io::stderr) {
        eprintln!("could not set up logging: {}", err);
    }

    let flags = cmd::parse_flags(env::args_os().map(|a| a.to_string_lossy().into_owned()));
    let env = Environment::load();

    let builder = ShellBuilder::new(env.build_command());
    let uploader = Uploader::new(FtpConnector);

    match deploy::run(&builder, &uploader, &RemoveBuildDir, &env, flags) {
        Ok(outcome) => {
            debug!(?outcome, "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {}", style("Failed:").red().bold(), err);
            for line in err.details() {
                eprintln!("  {}", line);
            }
            ExitCode::FAILURE
        }
    }
}
