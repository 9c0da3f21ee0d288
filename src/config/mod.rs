use std::{collections::HashMap, env, path::PathBuf};

use tracing::debug;

use crate::error::DeployError;
use crate::util::{mask, Secret};

pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_REMOTE_DIR: &str = "/public_html/";
pub const DEFAULT_LOCAL_DIR: &str = "dist";
pub const DEFAULT_BUILD_COMMAND: &str = "pnpm run build";

/// Snapshot of the process environment, taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Loads `.env` from the working directory, if there is one, then captures
    /// the environment. Variables already set in the process win over the file.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded {}", path.display()),
            Err(err) if err.not_found() => debug!("no .env file"),
            Err(err) => debug!("ignoring .env: {}", err),
        }
        Environment {
            vars: env::vars().collect(),
        }
    }

    #[cfg(test)]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Environment {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value of `key`, treating an empty value as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn flag(&self, key: &str, default: bool) -> bool {
        bool_from_env(self.get(key), default)
    }

    pub fn local_dir(&self) -> PathBuf {
        PathBuf::from(self.get("LOCAL_DIR").unwrap_or(DEFAULT_LOCAL_DIR))
    }

    pub fn build_command(&self) -> String {
        self.get("BUILD_COMMAND")
            .unwrap_or(DEFAULT_BUILD_COMMAND)
            .to_string()
    }
}

/// `1`, `true`, `yes` and `on` (any case) are true. Unset or blank gives `default`.
pub fn bool_from_env(value: Option<&str>, default: bool) -> bool {
    let value = match value.map(str::trim) {
        None | Some("") => return default,
        Some(v) => v.to_ascii_lowercase(),
    };
    matches!(value.as_str(), "1" | "true" | "yes" | "on")
}

#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub secure: bool,
    pub tls_insecure: bool,
    pub remote_dir: String,
    pub local_dir: PathBuf,
}

impl DeployConfig {
    pub fn from_env(env: &Environment) -> Result<Self, DeployError> {
        let (host, user, password) =
            match (env.get("FTP_HOST"), env.get("FTP_USER"), env.get("FTP_PASSWORD")) {
                (Some(host), Some(user), Some(password)) => (host, user, password),
                _ => {
                    return Err(DeployError::Configuration(
                        "Missing FTP credentials: set FTP_HOST, FTP_USER, FTP_PASSWORD (via .env or environment)."
                            .to_string(),
                    ))
                }
            };

        let port = match env.get("FTP_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| {
                DeployError::Configuration(format!("Invalid FTP_PORT: {:?}", raw))
            })?,
        };

        Ok(DeployConfig {
            host: host.to_string(),
            port,
            user: user.to_string(),
            password: Secret::new(password),
            secure: env.flag("FTP_SECURE", false),
            tls_insecure: env.flag("FTP_TLS_INSECURE", false),
            remote_dir: env
                .get("REMOTE_DIR")
                .unwrap_or(DEFAULT_REMOTE_DIR)
                .to_string(),
            local_dir: env.local_dir(),
        })
    }

    /// One-line summary of the target for the console. The password is masked.
    pub fn target_line(&self) -> String {
        format!(
            "FTP target: {}:{} secure={} user={} pass={}",
            self.host,
            self.port,
            self.secure,
            self.user,
            mask(self.password.expose())
        )
    }
}
