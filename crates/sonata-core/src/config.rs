//! Workspace configuration with precedence
//!
//! Loads validator settings from multiple sources, low to high:
//! 1. Embedded defaults (built into binary)
//! 2. Workspace config (`<workspace>/workspace.yml`)
//! 3. Environment variables (`SON_*` prefix)
//! 4. CLI flags (handled by caller)
//!
//! The workspace root is `$WORKSPACE_DIR` when set, `~/.son-workspace`
//! otherwise.

use crate::error::{Error, Result};
use crate::events::EventCatalog;
use crate::utils::get_home_dir;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/config/"]
#[prefix = ""]
pub(crate) struct EmbeddedConfigs;

/// Environment variable overriding the workspace root
pub const WORKSPACE_ENV: &str = "WORKSPACE_DIR";

/// Workspace directory name under the home directory
pub const DEFAULT_WORKSPACE_DIR: &str = ".son-workspace";

const WORKSPACE_CONFIG_FILE: &str = "workspace.yml";
const EVENT_CONFIG_FILE: &str = "eventcfg.yml";

/// Resolved validator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory holding schema documents, checked first
    pub schemas_local_master: Option<PathBuf>,

    /// Base URL of the remote schema master, checked last
    pub schemas_remote_master: Option<String>,

    /// Timeout for a remote schema fetch
    pub schema_fetch_timeout_secs: u64,

    /// Whether the schemas compiled into the binary are consulted
    pub bundled_schemas: bool,
}

impl WorkspaceConfig {
    pub fn schema_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.schema_fetch_timeout_secs)
    }
}

/// Partial configuration as written in `workspace.yml`
#[derive(Debug, Default, Deserialize)]
struct WorkspaceConfigFile {
    schemas_local_master: Option<PathBuf>,
    schemas_remote_master: Option<String>,
    schema_fetch_timeout_secs: Option<u64>,
    bundled_schemas: Option<bool>,
}

/// Workspace directory and the configuration files it holds
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Locate the workspace from `$WORKSPACE_DIR` or the home directory
    pub fn locate() -> Result<Self> {
        if let Ok(dir) = env::var(WORKSPACE_ENV) {
            if !dir.trim().is_empty() {
                return Ok(Self::with_root(dir));
            }
        }

        let home = get_home_dir().map_err(|e| Error::invalid_config(e.to_string()))?;
        Ok(Self::with_root(home.join(DEFAULT_WORKSPACE_DIR)))
    }

    /// Use an explicit workspace root
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Schema directory used when no local master is configured
    pub fn default_schema_dir(&self) -> PathBuf {
        self.root.join("schemas")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(WORKSPACE_CONFIG_FILE)
    }

    pub fn event_config_path(&self) -> PathBuf {
        self.root.join(EVENT_CONFIG_FILE)
    }

    /// Load the workspace configuration with precedence applied
    pub fn load_config(&self) -> Result<WorkspaceConfig> {
        let mut config = Self::load_embedded_defaults()?;

        let path = self.config_path();
        if path.exists() {
            debug!("Loading workspace config from {:?}", path);
            let content = fs::read_to_string(&path)?;
            let file: WorkspaceConfigFile = serde_yaml_ng::from_str(&content)
                .map_err(|e| Error::invalid_config(format!("Failed to parse {:?}: {}", path, e)))?;
            config = Self::merge(config, file);
        }

        config = Self::apply_env_overrides(config)?;

        // Relative schema directories are relative to the workspace root
        config.schemas_local_master = Some(match config.schemas_local_master.take() {
            Some(dir) if dir.is_relative() => self.root.join(dir),
            Some(dir) => dir,
            None => self.default_schema_dir(),
        });

        Ok(config)
    }

    /// Load the event catalog with workspace level overrides applied
    pub fn load_event_catalog(&self) -> Result<EventCatalog> {
        let mut catalog = EventCatalog::embedded()?;
        catalog.load_overrides(&self.event_config_path())?;
        Ok(catalog)
    }

    fn load_embedded_defaults() -> Result<WorkspaceConfig> {
        let file = EmbeddedConfigs::get("workspace-defaults.yaml").ok_or_else(|| {
            Error::invalid_config("Embedded config not found: workspace-defaults.yaml")
        })?;

        let content = std::str::from_utf8(&file.data).map_err(|_| {
            Error::invalid_config("Invalid UTF-8 in embedded config: workspace-defaults.yaml")
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config workspace-defaults.yaml: {}",
                e
            ))
        })
    }

    fn merge(mut base: WorkspaceConfig, overlay: WorkspaceConfigFile) -> WorkspaceConfig {
        if overlay.schemas_local_master.is_some() {
            base.schemas_local_master = overlay.schemas_local_master;
        }
        if overlay.schemas_remote_master.is_some() {
            base.schemas_remote_master = overlay.schemas_remote_master;
        }
        if let Some(timeout) = overlay.schema_fetch_timeout_secs {
            base.schema_fetch_timeout_secs = timeout;
        }
        if let Some(bundled) = overlay.bundled_schemas {
            base.bundled_schemas = bundled;
        }
        base
    }

    fn apply_env_overrides(mut config: WorkspaceConfig) -> Result<WorkspaceConfig> {
        if let Ok(val) = env::var("SON_SCHEMAS_LOCAL_MASTER") {
            config.schemas_local_master = Some(PathBuf::from(val));
        }

        // An empty value or "none" disables the remote master
        if let Ok(val) = env::var("SON_SCHEMAS_REMOTE_MASTER") {
            config.schemas_remote_master = match val.trim() {
                "" | "none" => None,
                url => Some(url.to_string()),
            };
        }

        if let Ok(val) = env::var("SON_SCHEMA_TIMEOUT_SECS") {
            config.schema_fetch_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("SON_SCHEMA_TIMEOUT_SECS must be a valid number")
            })?;
        }

        Ok(config)
    }
}
