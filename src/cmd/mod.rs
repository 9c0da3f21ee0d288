use clap::Parser;

const KNOWN_TOKENS: [&str; 7] = [
    "--clean",
    "--skip-deploy",
    "--preserve-dist",
    "--help",
    "-h",
    "--version",
    "-V",
];

/// Build the site and publish it over FTP.
///
/// Connection settings come from the environment or a local `.env` file:
/// FTP_HOST, FTP_PORT, FTP_USER, FTP_PASSWORD, FTP_SECURE, FTP_TLS_INSECURE,
/// REMOTE_DIR, LOCAL_DIR and BUILD_COMMAND.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CmdArgs {
    /// Clear all files in the remote directory before uploading
    #[arg(long)]
    pub clean: bool,

    /// Only build locally, skip the FTP upload step
    #[arg(long)]
    pub skip_deploy: bool,

    /// Keep the build folder after a successful deployment
    #[arg(long)]
    pub preserve_dist: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub clean: bool,
    pub skip_deploy: bool,
    pub preserve_dist: bool,
}

impl From<CmdArgs> for RunFlags {
    fn from(args: CmdArgs) -> Self {
        RunFlags {
            clean: args.clean,
            skip_deploy: args.skip_deploy,
            preserve_dist: args.preserve_dist,
        }
    }
}

/// Parses the raw argument list, program name first. Flags are presence-only;
/// anything that is not a known flag is dropped, and repeats are folded,
/// before clap sees it.
pub fn parse_flags<I, S>(args: I) -> RunFlags
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::<String>::into);
    let program = args.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    let mut known: Vec<String> = Vec::new();
    for arg in args {
        if KNOWN_TOKENS.contains(&arg.as_str()) && !known.contains(&arg) {
            known.push(arg);
        }
    }

    CmdArgs::parse_from(std::iter::once(program).chain(known)).into()
}
