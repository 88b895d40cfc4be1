use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::types::OuraConfig;

const CONFIG_FILE: &str = "ouraclaw.toml";

/// Directory holding OuraClaw state: `$OURACLAW_CONFIG_DIR`, else `~/.ouraclaw`.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os("OURACLAW_CONFIG_DIR").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
    Ok(home.home_dir().join(".ouraclaw"))
}

/// TOML-file backed config store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the default location (see [`config_dir`]).
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::with_path(config_dir()?.join(CONFIG_FILE)))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config; a missing file yields the defaults.
    pub fn load(&self) -> anyhow::Result<OuraConfig> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file yet, using defaults");
                return Ok(OuraConfig::default());
            },
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()));
            },
        };
        toml::from_str(&text).with_context(|| format!("invalid config in {}", self.path.display()))
    }

    /// Write the whole config, replacing the file atomically.
    pub fn save(&self, config: &OuraConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(config).context("failed to serialize config")?;

        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text).with_context(|| format!("failed to write {}", tmp.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Load, apply `f`, save. Returns the saved config.
    pub fn update<F>(&self, f: F) -> anyhow::Result<OuraConfig>
    where
        F: FnOnce(&mut OuraConfig),
    {
        let mut config = self.load()?;
        f(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}
