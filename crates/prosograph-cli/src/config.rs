//! Configuration for the Prosograph CLI.
//!
//! Provides the [`ProsographConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `PROSOGRAPH_CONFIG` environment variable
//! 3. XDG default: `~/.config/prosograph/config.toml`
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};

use prosograph_api::ServerOptions;
use prosograph_core::traits::ConfigProvider;
use prosograph_core::util::paths::expand_path;
use prosograph_core::{Error, Result};
use prosograph_graph::{EngineSettings, LayoutParams, LocalLayoutParams, NodeStyle};

/// File name of the graph export when `source.path` is unset.
pub const DEFAULT_EXPORT_FILE: &str = "graph-export.json";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProsographConfig {
    /// Project name, used for env var prefixes and default paths.
    pub project_name: String,

    /// Where the snapshot and fingerprint are kept.
    pub archive: ArchiveConfig,

    /// The property-graph export.
    pub source: SourceConfig,

    /// Full-layout simulation parameters.
    pub layout: LayoutParams,

    /// Overrides for interactive re-layout.
    pub local_layout: LocalLayoutParams,

    /// Node sizes and colours.
    pub style: NodeStyle,

    /// HTTP server.
    pub server: ServerConfig,
}

/// Archive directory configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive directory; `~` and `$VARS` are expanded. Defaults to
    /// `./archive`.
    pub path: Option<String>,
}

/// Graph source configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON export of the property graph. Defaults to
    /// `<archive>/graph-export.json`.
    pub path: Option<String>,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,

    /// Host address to bind to.
    pub host: String,

    /// Seconds between background rebuild checks; unset or 0 disables them.
    pub rebuild_interval_secs: Option<u64>,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for ProsographConfig {
    fn default() -> Self {
        Self {
            project_name: "prosograph".to_string(),
            archive: ArchiveConfig::default(),
            source: SourceConfig::default(),
            layout: LayoutParams::default(),
            local_layout: LocalLayoutParams::default(),
            style: NodeStyle::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
            rebuild_interval_secs: None,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl ProsographConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Layout parameters are validated after loading.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("PROSOGRAPH");
        env_opts.add_section("archive");
        env_opts.add_section("source");
        env_opts.add_section("layout");
        env_opts.add_section("server");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        config.layout.validate()?;
        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("PROSOGRAPH_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("prosograph").join("config.toml"))
    }

    /// Engine tuning taken from this config.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            layout: self.layout.clone(),
            local_layout: self.local_layout.clone(),
            style: self.style.clone(),
        }
    }

    /// Server options taken from this config.
    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            host: self.server.host.clone(),
            port: self.server.port,
            rebuild_interval: self
                .server
                .rebuild_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `PROSOGRAPH_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "PROSOGRAPH", &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for ProsographConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn archive_dir(&self) -> Result<PathBuf> {
        match &self.archive.path {
            Some(p) => expand_path(p),
            None => std::env::current_dir()
                .map(|cwd| cwd.join("archive"))
                .map_err(|e| Error::config(format!("Could not determine archive path: {e}"))),
        }
    }

    fn source_path(&self) -> Result<PathBuf> {
        match &self.source.path {
            Some(p) => expand_path(p),
            None => Ok(self.archive_dir()?.join(DEFAULT_EXPORT_FILE)),
        }
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    // ------------------------------------------------------------------------
    // Default tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_default() {
        let config = ProsographConfig::default();
        assert_eq!(config.project_name, "prosograph");
        assert!(config.archive.path.is_none());
        assert!(config.source.path.is_none());
        assert_eq!(config.layout, LayoutParams::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.server.rebuild_interval_secs.is_none());
    }

    // ------------------------------------------------------------------------
    // Serialization tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            project_name = "archive-site"

            [archive]
            path = "/srv/archive"

            [source]
            path = "/srv/export.json"

            [layout]
            link_distance = 150.0
            charge_strength = -60.0

            [server]
            port = 8080
            host = "0.0.0.0"
            rebuild_interval_secs = 900
        "#;

        let config: ProsographConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.project_name, "archive-site");
        assert_eq!(config.archive.path.as_deref(), Some("/srv/archive"));
        assert_eq!(config.layout.link_distance, 150.0);
        assert_eq!(config.layout.charge_strength, -60.0);
        assert_eq!(config.layout.alpha_decay, LayoutParams::default().alpha_decay);
        assert_eq!(config.server.rebuild_interval_secs, Some(900));
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = ProsographConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("project_name = \"prosograph\""));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[layout]"));

        let parsed: ProsographConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    // ------------------------------------------------------------------------
    // Loading tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
                project_name = "loaded-app"
                [server]
                port = 9090
            "#,
        );

        let config = ProsographConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.project_name, "loaded-app");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_config_load_missing_file_uses_defaults() {
        let config = ProsographConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.project_name, "prosograph");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_config_load_rejects_bad_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
                [layout]
                alpha_decay = 1.5
            "#,
        );

        let err = ProsographConfig::load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("alpha_decay"));
    }

    #[test]
    fn test_config_load_env_overlay() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
                [source]
                path = "/from/file.json"
            "#,
        );

        // confyg passes env values as strings, so only string fields are
        // overridable this way.
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("PROSOGRAPH_SOURCE_PATH", "/from/env.json") };
        let config = ProsographConfig::load(Some(path.to_str().unwrap()));
        unsafe { std::env::remove_var("PROSOGRAPH_SOURCE_PATH") };

        assert_eq!(
            config.unwrap().source.path.as_deref(),
            Some("/from/env.json")
        );
    }

    // ------------------------------------------------------------------------
    // Path resolution tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_config_path_explicit() {
        let path = ProsographConfig::resolve_config_path(Some("/explicit/config.toml"));
        assert_eq!(path, Some(PathBuf::from("/explicit/config.toml")));
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = ProsographConfig::default_config_path() {
            assert!(p.ends_with("prosograph/config.toml"));
        }
    }

    // ------------------------------------------------------------------------
    // ConfigProvider tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_archive_dir_explicit() {
        let config = ProsographConfig {
            archive: ArchiveConfig {
                path: Some("/srv/archive".into()),
            },
            ..Default::default()
        };
        assert_eq!(config.archive_dir().unwrap(), PathBuf::from("/srv/archive"));
        assert_eq!(
            config.snapshot_path().unwrap(),
            PathBuf::from("/srv/archive/graph-network.json")
        );
        assert_eq!(
            config.fingerprint_path().unwrap(),
            PathBuf::from("/srv/archive/graph-network-counts.json")
        );
    }

    #[test]
    fn test_archive_dir_default_is_under_cwd() {
        let config = ProsographConfig::default();
        assert_eq!(
            config.archive_dir().unwrap(),
            std::env::current_dir().unwrap().join("archive")
        );
    }

    #[test]
    fn test_archive_dir_expands_tilde() {
        let config = ProsographConfig {
            archive: ArchiveConfig {
                path: Some("~/archive".into()),
            },
            ..Default::default()
        };
        assert!(!config.archive_dir().unwrap().starts_with("~"));
    }

    #[test]
    fn test_source_path_defaults_into_archive() {
        let config = ProsographConfig {
            archive: ArchiveConfig {
                path: Some("/srv/archive".into()),
            },
            ..Default::default()
        };
        assert_eq!(
            config.source_path().unwrap(),
            PathBuf::from("/srv/archive/graph-export.json")
        );
    }

    // ------------------------------------------------------------------------
    // Derived settings
    // ------------------------------------------------------------------------

    #[test]
    fn test_server_options() {
        let mut config = ProsographConfig::default();
        assert!(config.server_options().rebuild_interval.is_none());

        config.server.rebuild_interval_secs = Some(0);
        assert!(config.server_options().rebuild_interval.is_none());

        config.server.rebuild_interval_secs = Some(120);
        config.server.port = 4000;
        let options = config.server_options();
        assert_eq!(options.rebuild_interval, Some(Duration::from_secs(120)));
        assert_eq!(options.address(), "127.0.0.1:4000");
    }

    #[test]
    fn test_engine_settings() {
        let mut config = ProsographConfig::default();
        config.layout.link_distance = 120.0;
        config.style.focused_size = 40.0;
        let settings = config.engine_settings();
        assert_eq!(settings.layout.link_distance, 120.0);
        assert_eq!(settings.style.focused_size, 40.0);
    }

    #[test]
    fn test_config_to_env_vars() {
        let vars = ProsographConfig::default().to_env_vars().unwrap();
        let map: HashMap<_, _> = vars.into_iter().collect();
        assert_eq!(map.get("PROSOGRAPH_PROJECT_NAME").unwrap(), "prosograph");
        assert_eq!(map.get("PROSOGRAPH_SERVER_PORT").unwrap(), "3000");
        assert_eq!(map.get("PROSOGRAPH_SERVER_HOST").unwrap(), "127.0.0.1");
        assert!(map.contains_key("PROSOGRAPH_LAYOUT_ALPHA_DECAY"));
    }

    #[test]
    fn test_config_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProsographConfig>();
    }
}
