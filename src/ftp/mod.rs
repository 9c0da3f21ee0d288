use std::{fs::File, io::Read, str::FromStr};

use indicatif::ProgressBar;
use native_tls::TlsConnector;
use suppaftp::{list, types::FileType, FtpStream, NativeTlsConnector, NativeTlsFtpStream};
use tracing::debug;

use crate::config::DeployConfig;
use crate::error::{DeployError, RemoteError};
use crate::io::LocalDir;

#[cfg(test)]
pub mod memory;

macro_rules! on_stream {
    ($session:expr, $s:ident => $body:expr) => {
        match &mut $session.stream {
            Stream::Plain($s) => $body,
            Stream::Secure($s) => $body,
        }
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

/// The operations the deploy needs from a remote file system. Names are
/// resolved against the session's working directory.
pub trait RemoteFs {
    fn make_dir(&mut self, name: &str) -> Result<(), RemoteError>;
    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError>;
    fn parent_dir(&mut self) -> Result<(), RemoteError>;
    fn list_dir(&mut self) -> Result<Vec<RemoteEntry>, RemoteError>;
    fn remove_file(&mut self, name: &str) -> Result<(), RemoteError>;
    fn remove_dir(&mut self, name: &str) -> Result<(), RemoteError>;
    fn put_file(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, RemoteError>;
    /// Ends the session. Must be safe to call more than once.
    fn close(&mut self);
}

pub trait Connector {
    type Session: RemoteFs;

    fn connect(&self, config: &DeployConfig) -> Result<Self::Session, RemoteError>;
}

/// Opens real FTP sessions, upgraded with AUTH TLS when `secure` is set.
pub struct FtpConnector;

impl Connector for FtpConnector {
    type Session = FtpSession;

    fn connect(&self, config: &DeployConfig) -> Result<FtpSession, RemoteError> {
        let addr = (config.host.as_str(), config.port);
        let stream = if config.secure {
            let tls = TlsConnector::builder()
                .danger_accept_invalid_certs(config.tls_insecure)
                .danger_accept_invalid_hostnames(config.tls_insecure)
                .build()?;
            debug!(host = %config.host, port = config.port, "AUTH TLS");
            Stream::Secure(
                NativeTlsFtpStream::connect(addr)?
                    .into_secure(NativeTlsConnector::from(tls), &config.host)?,
            )
        } else {
            debug!(host = %config.host, port = config.port, "connect");
            Stream::Plain(FtpStream::connect(addr)?)
        };

        let mut session = FtpSession {
            stream,
            closed: false,
            mlsd: None,
        };
        debug!(user = %config.user, "USER/PASS");
        on_stream!(session, s => s.login(config.user.as_str(), config.password.expose()))?;
        on_stream!(session, s => s.transfer_type(FileType::Binary))?;
        Ok(session)
    }
}

enum Stream {
    Plain(FtpStream),
    Secure(NativeTlsFtpStream),
}

pub struct FtpSession {
    stream: Stream,
    closed: bool,
    mlsd: Option<bool>,
}

impl FtpSession {
    fn supports_mlsd(&mut self) -> bool {
        if let Some(known) = self.mlsd {
            return known;
        }
        debug!("FEAT");
        let known = match on_stream!(self, s => s.feat()) {
            Ok(features) => features.keys().any(|k| k.eq_ignore_ascii_case("MLST")),
            Err(err) => {
                debug!("FEAT failed: {}", err);
                false
            }
        };
        self.mlsd = Some(known);
        known
    }
}

impl RemoteFs for FtpSession {
    fn make_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        debug!("MKD {}", name);
        Ok(on_stream!(self, s => s.mkdir(name))?)
    }

    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        debug!("CWD {}", path);
        Ok(on_stream!(self, s => s.cwd(path))?)
    }

    fn parent_dir(&mut self) -> Result<(), RemoteError> {
        debug!("CDUP");
        Ok(on_stream!(self, s => s.cdup())?)
    }

    fn list_dir(&mut self) -> Result<Vec<RemoteEntry>, RemoteError> {
        if self.supports_mlsd() {
            debug!("MLSD");
            let lines = on_stream!(self, s => s.mlsd(None))?;
            return parse_listing(&lines, ListingFormat::Mlsx);
        }

        // a bare LIST hides dotfiles on many servers
        debug!("LIST -a");
        let lines = match on_stream!(self, s => s.list(Some("-a"))) {
            Ok(lines) => lines,
            Err(err) => {
                debug!("LIST -a refused ({}), retrying with LIST", err);
                on_stream!(self, s => s.list(None))?
            }
        };
        parse_listing(&lines, ListingFormat::List)
    }

    fn remove_file(&mut self, name: &str) -> Result<(), RemoteError> {
        debug!("DELE {}", name);
        Ok(on_stream!(self, s => s.rm(name))?)
    }

    fn remove_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        debug!("RMD {}", name);
        Ok(on_stream!(self, s => s.rmdir(name))?)
    }

    fn put_file(&mut self, name: &str, mut reader: &mut dyn Read) -> Result<u64, RemoteError> {
        debug!("STOR {}", name);
        Ok(on_stream!(self, s => s.put_file(name, &mut reader))?)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!("QUIT");
        if let Err(err) = on_stream!(self, s => s.quit()) {
            debug!("QUIT failed: {}", err);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListingFormat {
    Mlsx,
    List,
}

/// Turns a directory listing into entries. `.` and `..` are dropped, as are
/// blank and `total N` lines. Any other line that does not parse is an error,
/// so nothing is skipped silently.
fn parse_listing(lines: &[String], format: ListingFormat) -> Result<Vec<RemoteEntry>, RemoteError> {
    let mut entries = Vec::new();
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() || is_total_line(line) {
            continue;
        }
        if format == ListingFormat::Mlsx && is_cdir_or_pdir(line) {
            continue;
        }
        let file = match format {
            ListingFormat::Mlsx => list::File::from_mlsx_line(line),
            ListingFormat::List => list::File::from_str(line),
        }
        .map_err(|_| RemoteError::Protocol(format!("unrecognised listing line {:?}", line)))?;

        if file.name() == "." || file.name() == ".." {
            continue;
        }
        entries.push(RemoteEntry {
            name: file.name().to_string(),
            is_dir: file.is_directory(),
        });
    }
    Ok(entries)
}

fn is_total_line(line: &str) -> bool {
    line.strip_prefix("total ").is_some_and(|n| {
        let n = n.trim();
        !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())
    })
}

fn is_cdir_or_pdir(line: &str) -> bool {
    let facts = line.split_once(' ').map_or(line, |(facts, _)| facts);
    facts.split(';').any(|fact| {
        fact.eq_ignore_ascii_case("type=cdir") || fact.eq_ignore_ascii_case("type=pdir")
    })
}

/// Enters `path`, creating any segment that is missing. An absolute path
/// starts from the server root.
pub fn ensure_dir<R: RemoteFs + ?Sized>(remote: &mut R, path: &str) -> Result<(), RemoteError> {
    if path.starts_with('/') {
        remote.change_dir("/")?;
    }
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if remote.change_dir(segment).is_err() {
            remote.make_dir(segment)?;
            remote.change_dir(segment)?;
        }
    }
    Ok(())
}

/// Deletes everything inside the working directory, which itself stays.
pub fn clear_working_dir<R: RemoteFs + ?Sized>(remote: &mut R) -> Result<(), RemoteError> {
    for entry in remote.list_dir()? {
        if entry.is_dir {
            remote.change_dir(&entry.name)?;
            clear_working_dir(remote)?;
            remote.parent_dir()?;
            remote.remove_dir(&entry.name)?;
        } else {
            remote.remove_file(&entry.name)?;
        }
    }
    Ok(())
}

/// Uploads the contents of `dir` into the working directory, mirroring its
/// structure. The first failure aborts the upload.
pub fn upload_dir<R: RemoteFs + ?Sized>(
    remote: &mut R,
    dir: &LocalDir,
    progress: &ProgressBar,
) -> Result<(), DeployError> {
    for file in &dir.files {
        progress.set_message(format!("Uploading {}", file.file_path.display()));
        let mut reader = File::open(&file.file_path).map_err(|e| {
            DeployError::upload(
                format!("Reading {}", file.file_path.display()),
                RemoteError::Io(e),
            )
        })?;
        remote
            .put_file(&file.name, &mut reader)
            .map_err(|e| DeployError::upload(format!("Uploading {}", file.file_path.display()), e))?;
        progress.inc(file.size);
    }

    for sub in &dir.dirs {
        ensure_dir(remote, &sub.name).map_err(|e| {
            DeployError::upload(format!("Creating remote directory {}", sub.name), e)
        })?;
        upload_dir(remote, sub, progress)?;
        remote
            .parent_dir()
            .map_err(|e| DeployError::upload(format!("Leaving remote directory {}", sub.name), e))?;
    }

    Ok(())
}
