//! Layered server configuration.
//!
//! Precedence: built-in defaults → YAML file → `ORGGATE__`-prefixed
//! environment variables → CLI overrides.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

use orggate_directory::LevelConfig;
use orggate_gate::config::GateConfig;
use orggate_gate::proxy::ProxyConfig;
use orggate_rebac::HttpEngineConfig;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
            database_url: "sqlite::memory:".to_owned(),
        }
    }
}

/// Which relationship engine to talk to.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineConfig {
    /// In-process engine; development and tests only.
    InMemory,
    /// Deployed engine reachable over HTTP.
    Http(HttpEngineConfig),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::InMemory
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Provision a default child container under each new root.
    pub provision_default_child: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            provision_default_child: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Hierarchy levels, root first. Invalid chains abort startup.
    #[serde(default = "default_hierarchy")]
    pub hierarchy: Vec<LevelConfig>,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub gate: GateConfig,
    /// Downstream business service; without it the server only exposes the
    /// directory surface.
    #[serde(default)]
    pub downstream: Option<ProxyConfig>,
}

fn default_hierarchy() -> Vec<LevelConfig> {
    let roles = vec!["admin".to_owned(), "member".to_owned(), "viewer".to_owned()];
    vec![
        LevelConfig {
            name: "organization".to_owned(),
            display_name: "Organization".to_owned(),
            roles: roles.clone(),
            root: true,
        },
        LevelConfig {
            name: "workspace".to_owned(),
            display_name: "Workspace".to_owned(),
            roles,
            root: false,
        },
    ]
}

impl AppConfig {
    /// Load the layered configuration.
    ///
    /// # Errors
    /// Missing required values (the session secret) or malformed YAML/env.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed("ORGGATE__").split("__"))
            .extract()?;
        Ok(config)
    }
}
