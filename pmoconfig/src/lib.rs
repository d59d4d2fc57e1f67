//! # pmoconfig - Configuration YAML de PMOMusic
//!
//! Gestion d'un document YAML unique :
//! - document par défaut embarqué dans le binaire (`pmomusic.yaml`)
//! - fusion avec le `config.yaml` de l'utilisateur
//! - surcharges par variables d'environnement `PMOMUSIC_CONFIG__A__B`
//! - accès concurrent via [`get_config`]
//!
//! Les crates de service (`pmospotify`, ...) ajoutent leurs accesseurs typés
//! par des traits d'extension construits sur [`Config::get_value`] et
//! [`Config::set_value`].
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let level = config.get_log_min_level()?;
//! config.set_log_min_level("DEBUG".to_string())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

const DEFAULT_CONFIG: &str = include_str!("pmomusic.yaml");

const CONFIG_FILE: &str = "config.yaml";
const CONFIG_DIR_NAME: &str = ".pmomusic";
const ENV_CONFIG_DIR: &str = "PMOMUSIC_CONFIG";
const ENV_PREFIX: &str = "PMOMUSIC_CONFIG__";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMOMusic configuration"));
}

/// Provenance du répertoire de configuration retenu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Argument,
    Environment,
    WorkingDir,
    HomeDir,
    /// Aucun répertoire existant : `./.pmomusic` sera créé
    Fallback,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigSource::Argument => "argument",
            ConfigSource::Environment => ENV_CONFIG_DIR,
            ConfigSource::WorkingDir => "working directory",
            ConfigSource::HomeDir => "home directory",
            ConfigSource::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// Configuration chargée, persistée dans `<dir>/config.yaml`
#[derive(Debug)]
pub struct Config {
    dir: PathBuf,
    source: ConfigSource,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            source: self.source,
            data: Mutex::new(self.lock().clone()),
        }
    }
}

impl Config {
    /// Localise le répertoire de configuration
    ///
    /// Ordre de recherche :
    /// 1. `directory` s'il n'est pas vide
    /// 2. la variable `PMOMUSIC_CONFIG`
    /// 3. `.pmomusic` dans le répertoire courant
    /// 4. `.pmomusic` dans le répertoire personnel
    pub fn locate(directory: &str) -> (PathBuf, ConfigSource) {
        if !directory.is_empty() {
            return (PathBuf::from(directory), ConfigSource::Argument);
        }

        if let Some(dir) = env::var_os(ENV_CONFIG_DIR).filter(|d| !d.is_empty()) {
            return (PathBuf::from(dir), ConfigSource::Environment);
        }

        let local = Path::new(CONFIG_DIR_NAME);
        if local.is_dir() {
            return (local.to_path_buf(), ConfigSource::WorkingDir);
        }

        if let Some(home) = home_dir().map(|h| h.join(CONFIG_DIR_NAME)) {
            if home.is_dir() {
                return (home, ConfigSource::HomeDir);
            }
        }

        (local.to_path_buf(), ConfigSource::Fallback)
    }

    /// Crée le répertoire si besoin et vérifie qu'il est inscriptible
    fn prepare_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        if !dir.is_dir() {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }

        let probe = dir.join(".write_test");
        fs::write(&probe, b"test")
            .map_err(|e| anyhow!("{} is not writable: {}", dir.display(), e))?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    /// Charge la configuration depuis `directory` (ou l'emplacement par défaut)
    ///
    /// Le document embarqué est fusionné avec `config.yaml`, les clés sont
    /// passées en minuscules, les surcharges d'environnement appliquées, puis
    /// le résultat est réécrit sur disque.
    pub fn load_config(directory: &str) -> Result<Self> {
        let (dir, source) = Self::locate(directory);
        Self::prepare_dir(&dir)?;
        info!(config_dir = %dir.display(), %source, "Using config directory");

        let mut data: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        let file = dir.join(CONFIG_FILE);
        match fs::read_to_string(&file) {
            Ok(text) => {
                info!(config_file = %file.display(), "Loaded config file");
                let user: Value = serde_yaml::from_str(&text)
                    .map_err(|e| anyhow!("Invalid {}: {}", file.display(), e))?;
                if !user.is_null() {
                    merge_yaml(&mut data, lowercase_keys(user));
                }
            }
            Err(_) => {
                info!(config_file = %file.display(), "Config file not found, using embedded defaults");
            }
        }

        let mut data = lowercase_keys(data);
        apply_overrides(&mut data, env::vars());

        let config = Config {
            dir,
            source,
            data: Mutex::new(data),
        };
        config.save()?;
        Ok(config)
    }

    /// Répertoire contenant `config.yaml`
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }

    fn lock(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Réécrit `config.yaml`
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock())?;
        fs::write(self.dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }

    /// Définit la valeur au chemin `path` (ex. `&["spotify", "market"]`) et sauvegarde
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        insert_at(&mut self.lock(), path, value)?;
        self.save()
    }

    /// Valeur au chemin `path` ; erreur si le chemin n'existe pas
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        lookup(&self.lock(), path).cloned()
    }

    /// Niveau de log minimum (`host.logger.min_level`)
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(s),
            Ok(other) => {
                warn!("Invalid log level {:?}, using {}", other, DEFAULT_LOG_MIN_LEVEL);
                Ok(DEFAULT_LOG_MIN_LEVEL.to_string())
            }
            Err(_) => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Configuration globale, chargée au premier accès
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn key(segment: &str) -> Value {
    Value::String(segment.to_lowercase())
}

fn lookup<'a>(data: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut node = data;
    for (depth, segment) in path.iter().enumerate() {
        let map = node
            .as_mapping()
            .ok_or_else(|| anyhow!("{} is not a mapping", path[..depth].join(".")))?;
        node = map
            .get(&key(segment))
            .ok_or_else(|| anyhow!("Path {} does not exist", path[..=depth].join(".")))?;
    }
    Ok(node)
}

fn insert_at(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *data = value;
        return Ok(());
    };

    let mut node = data;
    for (depth, segment) in parents.iter().enumerate() {
        let map = node
            .as_mapping_mut()
            .ok_or_else(|| anyhow!("{} is not a mapping", path[..depth].join(".")))?;
        node = map
            .entry(key(segment))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }

    node.as_mapping_mut()
        .ok_or_else(|| anyhow!("{} is not a mapping", parents.join(".")))?
        .insert(key(last), value);
    Ok(())
}

/// Applique les variables `PMOMUSIC_CONFIG__A__B=valeur` sur `a.b`
fn apply_overrides(data: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (name, raw) in vars {
        let Some(stripped) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = stripped.split("__").filter(|s| !s.is_empty()).collect();
        if path.is_empty() {
            continue;
        }
        debug!(env_var = %name, "Applying config override");
        if let Err(err) = insert_at(data, &path, parse_env_value(&raw)) {
            warn!(env_var = %name, "Ignoring env override: {}", err);
        }
    }
}

/// Interprète une valeur d'environnement comme un scalaire YAML
fn parse_env_value(raw: &str) -> Value {
    serde_yaml::from_str::<Value>(raw)
        .ok()
        .filter(|v| !v.is_mapping() && !v.is_sequence())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lowercase_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Fusionne `external` dans `base` : les mappings sont fusionnés clé par
/// clé, les scalaires et séquences remplacés
fn merge_yaml(base: &mut Value, external: Value) {
    match (base, external) {
        (Value::Mapping(base_map), Value::Mapping(ext_map)) => {
            for (k, v) in ext_map {
                match base_map.get_mut(&k) {
                    Some(existing) => merge_yaml(existing, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}
