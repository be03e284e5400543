//! INI file configuration adapter.

use crate::domain::error::EngineError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| EngineError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, EngineError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| EngineError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn invalid(section: &str, key: &str, expected: &str, raw: Option<String>) -> EngineError {
        EngineError::config_invalid(
            section,
            key,
            format!(
                "expected {expected}, got {:?}",
                raw.unwrap_or_default()
            ),
        )
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, EngineError> {
        match self.config.getint(section, key) {
            Ok(value) => Ok(value.unwrap_or(default)),
            Err(_) => Err(Self::invalid(
                section,
                key,
                "an integer",
                self.get_string(section, key),
            )),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, EngineError> {
        match self.config.getfloat(section, key) {
            Ok(value) => Ok(value.unwrap_or(default)),
            Err(_) => Err(Self::invalid(
                section,
                key,
                "a number",
                self.get_string(section, key),
            )),
        }
    }
}
