// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

mod error;

pub use error::ConfigError;

/// Prefix of environment variables that override settings.
const ENV_PREFIX: &str = "KLICKSESSION";

/// Settings for the conversion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Note type written on tempo points.
    pub tempo_note_type: u32,
    /// Whether emitted markers are locked.
    pub lock_markers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tempo_note_type: 4,
            lock_markers: false,
        }
    }
}

impl Settings {
    /// Loads settings from the defaults, the optional YAML file and then the
    /// environment, each overriding the last.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading settings");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()
    }

    /// Parses settings from YAML text alone.
    pub fn from_yaml(yaml: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    fn validate(self) -> Result<Settings, ConfigError> {
        if self.tempo_note_type == 0 {
            return Err(ConfigError::Invalid(
                "tempo_note_type must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}
