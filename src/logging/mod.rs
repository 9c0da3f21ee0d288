use std::error::Error;

use tracing_subscriber::{filter::Directive, fmt::MakeWriter, EnvFilter};

const DEFAULT_FILTER: &str = "warn";
// suppaftp traces every control command verbatim, PASS included
const FTP_CLIENT_CAP: &str = "suppaftp=debug";

/// Builds the filter from `RUST_LOG`-style directives, falling back to `warn`.
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    let filter = directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));
    match FTP_CLIENT_CAP.parse::<Directive>() {
        Ok(cap) => filter.add_directive(cap),
        Err(_) => filter,
    }
}

/// Installs the global subscriber. The `log` bridge is not compiled in, so
/// records from crates that log through `log` are dropped.
pub fn try_init<W>(directives: Option<&str>, writer: W) -> Result<(), Box<dyn Error + Send + Sync>>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives))
        .with_writer(writer)
        .try_init()
}
