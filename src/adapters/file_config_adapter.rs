//! INI file configuration adapter.
//!
//! Keys are case-insensitive and values are trimmed; integers are parsed
//! from the trimmed string so `page_size = 24 ` reads as 24.

use crate::domain::error::PlotterError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    ini: Ini,
    origin: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PlotterError> {
        let origin = path.as_ref().display().to_string();
        let mut ini = Ini::new();
        ini.load(path.as_ref())
            .map_err(|reason| PlotterError::ConfigParse {
                file: origin.clone(),
                reason,
            })?;
        tracing::debug!(file = %origin, sections = ini.sections().len(), "loaded config");
        Ok(Self { ini, origin })
    }

    pub fn from_string(content: &str) -> Result<Self, PlotterError> {
        let origin = "<inline>".to_string();
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| PlotterError::ConfigParse {
                file: origin.clone(),
                reason,
            })?;
        Ok(Self { ini, origin })
    }

    /// Where the settings came from: a file path or `<inline>`.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
