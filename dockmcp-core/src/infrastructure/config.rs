// SPDX-License-Identifier: MIT
//! YAML configuration surface (spec.md §6) and the loader that turns it
//! into the immutable [`SecurityPolicy`] plus server/audit settings.
//!
//! Config parsing itself is out of the core's *design* scope (spec.md §1),
//! but something has to own the struct the CLI deserializes into before a
//! `Policy` can exist, so it lives here rather than being re-invented by
//! every caller.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::policy::{
    BlockedPathRule, DangerousExec, ExecWhitelistEntry, HostPathMask, OutputMasking, Permissions,
    PolicyMode, SecurityPolicy,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DockMcpConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            host: "127.0.0.1".to_string(),
        }
    }
}

/// Raw YAML shape of `security.exec_whitelist` / `exec_dangerously.commands`
/// — a mapping, not a list, on the wire. `IndexMap` is used (not
/// `HashMap`) because the mapping's iteration order must reproduce
/// declaration order for `SecurityPolicy::exec_allowed`'s tie-break rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub mode: PolicyMode,
    pub allowed_containers: Vec<String>,
    pub permissions: Permissions,
    pub exec_whitelist: IndexMap<String, Vec<String>>,
    pub exec_dangerously: DangerousExecConfig,
    pub blocked_paths: Vec<BlockedPathRule>,
    pub output_masking: OutputMasking,
    pub host_path_masks: Vec<HostPathMask>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DangerousExecConfig {
    pub enabled: bool,
    pub commands: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub file: String,
    pub events: AuditEventsConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: String::new(),
            events: AuditEventsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditEventsConfig {
    pub tool_calls: bool,
    pub access_denied: bool,
    pub client_connections: bool,
    pub security_policy: bool,
}

impl Default for AuditEventsConfig {
    fn default() -> Self {
        Self {
            tool_calls: true,
            access_denied: true,
            client_connections: true,
            security_policy: true,
        }
    }
}

/// Resolved server bind settings (distinct from the raw YAML struct so
/// callers don't have to reach through `DockMcpConfig::server`).
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Resolved audit sink settings.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub enabled: bool,
    pub file: Option<PathBuf>,
    pub events: AuditEventsConfig,
}

impl DockMcpConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            host: self.server.host.clone(),
            port: self.server.port,
        }
    }

    pub fn audit_settings(&self) -> AuditSettings {
        AuditSettings {
            enabled: self.audit.enabled,
            file: if self.audit.file.is_empty() {
                None
            } else {
                Some(PathBuf::from(&self.audit.file))
            },
            events: self.audit.events.clone(),
        }
    }

    /// Builds the immutable [`SecurityPolicy`] the rest of the server
    /// consumes, converting the YAML's map-shaped whitelists into the
    /// declaration-ordered `Vec<ExecWhitelistEntry>` the policy engine
    /// matches against.
    pub fn into_policy(self) -> SecurityPolicy {
        SecurityPolicy {
            mode: self.security.mode,
            allowed_containers: self.security.allowed_containers,
            permissions: self.security.permissions,
            exec_whitelist: entries_from_map(self.security.exec_whitelist),
            exec_dangerously: DangerousExec {
                enabled: self.security.exec_dangerously.enabled,
                commands: entries_from_map(self.security.exec_dangerously.commands),
            },
            blocked_paths: self.security.blocked_paths,
            output_masking: self.security.output_masking,
            host_path_masks: self.security.host_path_masks,
        }
    }
}

fn entries_from_map(map: IndexMap<String, Vec<String>>) -> Vec<ExecWhitelistEntry> {
    map.into_iter()
        .map(|(container_pattern, templates)| ExecWhitelistEntry {
            container_pattern,
            templates,
        })
        .collect()
}
