//! `prosograph config {path,get,set,init,export}`.
//!
//! Each command has a pure core returning what would be printed, so the
//! behaviour is testable without capturing stdout.

use std::path::{Path, PathBuf};

use prosograph_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::ProsographConfig;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path rather than a loaded config, since
/// `path` and `init` must work before any config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let (path, exists) = resolved_path(config_path)?;
            println!("{}", path.display());
            if !exists {
                eprintln!("(not created yet, run `prosograph config init`)");
            }
        }
        ConfigAction::Get { key } => {
            let config = ProsographConfig::load(config_path)?;
            println!("{}", get_value(&config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let (path, _) = resolved_path(config_path)?;
            set_value(&path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
        }
        ConfigAction::Init { file, force } => {
            let path = init_config(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
        }
        ConfigAction::Export { docker_env } => {
            let config = ProsographConfig::load(config_path)?;
            for line in export_lines(&config, docker_env)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn resolved_path(config_path: Option<&str>) -> Result<(PathBuf, bool)> {
    let path = ProsographConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine a config directory on this platform"))?;
    let exists = path.exists();
    Ok((path, exists))
}

/// Display form of the value at a dotted key of the effective config.
fn get_value(config: &ProsographConfig, key: &str) -> Result<String> {
    let root = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    let value = key
        .split('.')
        .try_fold(&root, |node, part| node.as_table()?.get(part))
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;
    Ok(display_value(value))
}

/// Write `raw` at a dotted key of the config file.
///
/// The edited document must still load as a valid configuration, so a
/// typo'd section or an out-of-range layout parameter is refused before
/// anything is written.
fn set_value(path: &Path, key: &str, raw: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `prosograph config init` first.",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let mut doc: toml::Value = toml::from_str(&text)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    insert_dotted(&mut doc, key, parse_scalar(raw))?;

    let checked: ProsographConfig = doc
        .clone()
        .try_into()
        .map_err(|e| Error::config(format!("'{key} = {raw}' is not valid: {e}")))?;
    checked.layout.validate()?;

    let out = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(path, out).map_err(|e| Error::io_with_path(e, path))
}

/// Write a default config file, returning where it went.
fn init_config(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => ProsographConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let body = ProsographConfig::default().to_toml_string()?;
    std::fs::write(&path, body).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// `KEY=value` lines, or `--env KEY=value` for `docker run`.
fn export_lines(config: &ProsographConfig, docker_env: bool) -> Result<Vec<String>> {
    let prefix = if docker_env { "--env " } else { "" };
    Ok(config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| format!("{prefix}{key}={value}"))
        .collect())
}

// ============================================================================
// TOML helpers
// ============================================================================

/// Insert `value` at a dotted key, creating missing tables on the way.
fn insert_dotted(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config(format!("Invalid key '{key}'")));
    }

    let mut table = root
        .as_table_mut()
        .ok_or_else(|| Error::config("Config root is not a table"))?;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        table = table
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()))
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("'{part}' in '{key}' is not a section")))?;
    }
    table.insert(leaf.to_string(), value);
    Ok(())
}

/// Type a command-line value: bool, then integer, then float, else string.
fn parse_scalar(raw: &str) -> toml::Value {
    match raw {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .or_else(|_| raw.parse::<f64>().map(toml::Value::Float))
            .unwrap_or_else(|_| toml::Value::String(raw.to_string())),
    }
}

fn display_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Table(_) | toml::Value::Array(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
