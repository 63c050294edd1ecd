//! Per-target connection settings read from a small line-oriented file.
//!
//! ```text
//! Server *.prod.internal:*
//!     Security tls
//!     IdentityFile /etc/grpcscope/ca.pem
//!     ServerNameOverride api.prod.internal
//!
//! Server localhost:9999
//!     RealAddress 127.0.0.1:50051
//! ```
//!
//! Patterns accept `*` and `?`. The first block whose pattern matches the
//! target wins.

use crate::client::ConnectOptions;
use crate::{Result, ScopeError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GRPCSCOPE_CONFIG";

/// File name looked up in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "grpcscope_config";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecurityType {
    #[default]
    Insecure,
    Tls,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub pattern: String,
    /// Dial this instead of the target as given.
    pub real_address: Option<String>,
    pub security: SecurityType,
    /// CA certificate used to verify the server.
    pub identity_file: Option<PathBuf>,
    pub server_name_override: Option<String>,
}

impl ServerConfig {
    pub fn matches(&self, target: &str) -> bool {
        wildcard_match(&self.pattern, target)
    }

    /// Connection options for `target` under this block.
    pub fn connect_options(&self, target: &str) -> ConnectOptions {
        let tls = self.security == SecurityType::Tls;
        ConnectOptions {
            address: self
                .real_address
                .clone()
                .unwrap_or_else(|| target.to_string()),
            tls,
            ca_file: self.identity_file.clone().filter(|_| tls),
            server_name_override: self.server_name_override.clone(),
        }
    }
}

/// Glob match over characters. `*` matches any run, `?` any one character.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen, and the text position it was tried at.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    star = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

fn config_error(origin: &str, line: usize, message: impl std::fmt::Display) -> ScopeError {
    ScopeError::Config(format!("{}:{}: {}", origin, line, message))
}

/// Parse config text. `origin` names the source in error messages.
pub fn parse_config(text: &str, origin: &str) -> Result<Vec<ServerConfig>> {
    let mut configs: Vec<ServerConfig> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let key = parts.next().unwrap_or_default();
        let value = parts.next();
        if parts.next().is_some() {
            return Err(config_error(origin, line_no, format!("invalid line: {}", line)));
        }

        if key == "Server" {
            let pattern = value
                .ok_or_else(|| config_error(origin, line_no, "Server requires a pattern"))?;
            configs.push(ServerConfig {
                pattern: pattern.to_string(),
                ..Default::default()
            });
            continue;
        }

        let current = configs.last_mut().ok_or_else(|| {
            config_error(origin, line_no, format!("{} appears before any Server", key))
        })?;
        let value = value
            .ok_or_else(|| config_error(origin, line_no, format!("{} requires a value", key)))?;

        match key {
            "RealAddress" => current.real_address = Some(value.to_string()),
            "Security" => {
                current.security = match value.to_ascii_lowercase().as_str() {
                    "insecure" => SecurityType::Insecure,
                    "tls" => SecurityType::Tls,
                    other => {
                        return Err(config_error(
                            origin,
                            line_no,
                            format!("unsupported security model: {}", other),
                        ))
                    }
                }
            }
            "IdentityFile" => current.identity_file = Some(PathBuf::from(value)),
            "ServerNameOverride" => current.server_name_override = Some(value.to_string()),
            other => warn!(origin, line = line_no, key = other, "Ignoring unknown option"),
        }
    }

    Ok(configs)
}

pub fn load_from_file(path: &Path) -> Result<Vec<ServerConfig>> {
    let text = fs::read_to_string(path).map_err(|e| {
        ScopeError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    let configs = parse_config(&text, &path.display().to_string())?;
    debug!(path = %path.display(), blocks = configs.len(), "Loaded server configs");
    Ok(configs)
}

fn user_config_dir() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// First existing config file in lookup order, if any.
pub fn discover_config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    user_config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

/// First block matching `target`, or defaults when none does.
pub fn find_server_config(configs: &[ServerConfig], target: &str) -> ServerConfig {
    configs
        .iter()
        .find(|config| config.matches(target))
        .cloned()
        .unwrap_or_default()
}

/// Look up `target` in the discovered config file, if there is one.
pub fn server_config_for(target: &str) -> Result<ServerConfig> {
    let configs = match discover_config_path() {
        Some(path) => load_from_file(&path)?,
        None => Vec::new(),
    };
    Ok(find_server_config(&configs, target))
}
