use std::fs::{create_dir_all, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{error, warn};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CFG_DIR: &str = "ledcsv";
const CFG_FILE_NAME: &str = "ledcsv.ron";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where to write the scaled bitmap, `None` to skip it
    pub temp_file: Option<String>,
    /// RON layout to use instead of the built-in HERA layout
    pub layout_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            temp_file: Some("temp.bmp".to_owned()),
            layout_file: None,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/ledcsv`
    pub fn config_dir() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or(Error::XdgVars)?;
        path.push(CFG_DIR);
        Ok(path)
    }

    pub fn load() -> Result<Config> {
        Self::load_from(&Self::config_dir()?)
    }

    /// Read the config in `dir`. An empty or missing file is replaced by the
    /// defaults. A file that fails to parse is moved aside to `<file>-old`.
    pub fn load_from(dir: &Path) -> Result<Config> {
        if !dir.exists() {
            create_dir_all(dir)?;
        }
        let path = dir.join(CFG_FILE_NAME);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let mut buf = String::new();
        let read_len = file.read_to_string(&mut buf)?;
        if read_len != 0 {
            match ron::from_str::<Config>(&buf) {
                Ok(data) => return Ok(data),
                Err(e) => {
                    warn!("Could not deserialise {path:?}: {e}");
                    Self::rename_file_old(&path);
                }
            }
        }

        let default = Config::default();
        default.write(&path)?;
        Ok(default)
    }

    /// Write in pretty RON format
    pub fn write(&self, path: &Path) -> Result<()> {
        let ron = ron::ser::to_string_pretty(self, PrettyConfig::new().depth_limit(2))
            .map_err(|e| {
                error!("Parse {path:?} to RON failed, error: {e}");
                Error::ConfigLoadFail
            })?;
        std::fs::write(path, ron)?;
        Ok(())
    }

    fn rename_file_old(path: &Path) {
        let old = path.to_string_lossy().to_string() + "-old";
        warn!("Renaming {path:?} to {old} and recreating config");
        std::fs::rename(path, &old)
            .unwrap_or_else(|err| error!("Could not rename {path:?}: {err}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join("nested");
        let config = Config::load_from(&cfg_dir).unwrap();
        assert_eq!(config, Config::default());
        assert!(cfg_dir.join(CFG_FILE_NAME).exists());
        // the written defaults load back
        assert_eq!(Config::load_from(&cfg_dir).unwrap(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CFG_FILE_NAME),
            "(layout_file: Some(\"custom.ron\"))",
        )
        .unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.layout_file.as_deref(), Some("custom.ron"));
        assert_eq!(config.temp_file.as_deref(), Some("temp.bmp"));
    }

    #[test]
    fn broken_file_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CFG_FILE_NAME);
        std::fs::write(&path, "{{ nope").unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(format!("{CFG_FILE_NAME}-old")).exists());
    }
}
