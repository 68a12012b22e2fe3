use std::path::{Path, PathBuf};
use std::time::Duration;

use padlink_guid::SdlVersion;
use padlink_mapping::{SourceSettings, DEFAULT_HELPER_TIMEOUT};
use serde::Deserialize;

use crate::ConfigError;

const CONFIG_FILE: &str = "padlink.yaml";
const APP_DIR: &str = "padlink";
const HOME_CONFIG_DIR: &str = ".config";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub sdl_library: Option<PathBuf>,
    /// Layout identities are converted to; the library's own when unset.
    pub sdl_version: Option<SdlVersion>,
    pub hints: Option<String>,
    pub helper: Option<PathBuf>,
    pub helper_timeout: Duration,
    /// Mapping database replacing the bundled one.
    pub database: Option<PathBuf>,
    /// Frontend input capture file.
    pub captures: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sdl_library: None,
            sdl_version: None,
            hints: None,
            helper: None,
            helper_timeout: DEFAULT_HELPER_TIMEOUT,
            database: None,
            captures: None,
        }
    }
}

impl Settings {
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            library: self.sdl_library.clone(),
            hints: self.hints.clone(),
            helper: self.helper.clone(),
            helper_timeout: Some(self.helper_timeout),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct VersionedConfig {
    version: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigV1 {
    #[allow(dead_code)]
    version: u8,
    #[serde(default)]
    sdl: ConfigV1Sdl,
    #[serde(default)]
    helper: ConfigV1Helper,
    #[serde(default)]
    database: ConfigV1Path,
    #[serde(default)]
    captures: ConfigV1Path,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigV1Sdl {
    library: Option<PathBuf>,
    version: Option<String>,
    hints: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigV1Helper {
    path: Option<PathBuf>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigV1Path {
    path: Option<PathBuf>,
}

impl ConfigV1 {
    fn into_settings(self, base: Option<&Path>) -> Result<Settings, ConfigError> {
        let sdl_version = self
            .sdl
            .version
            .as_deref()
            .map(|v| v.parse::<SdlVersion>().map_err(ConfigError::InvalidVersion))
            .transpose()?;
        let timeout = self
            .helper
            .timeout_ms
            .map_or(DEFAULT_HELPER_TIMEOUT, Duration::from_millis);
        let relative = |path: Option<PathBuf>| match (path, base) {
            (Some(path), Some(base)) if path.is_relative() => Some(base.join(path)),
            (path, _) => path,
        };

        Ok(Settings {
            sdl_library: relative(self.sdl.library),
            sdl_version,
            hints: self.sdl.hints.filter(|h| !h.is_empty()),
            helper: relative(self.helper.path),
            helper_timeout: timeout,
            database: relative(self.database.path),
            captures: relative(self.captures.path),
        })
    }
}

/// Parses a configuration file body. Relative paths are taken relative to
/// `base` when given.
pub fn parse_config(input: &str, base: Option<&Path>) -> Result<Settings, ConfigError> {
    let versioned: VersionedConfig = serde_yaml::from_str(input)?;
    match versioned.version {
        1 => {
            let config: ConfigV1 = serde_yaml::from_str(input)?;
            config.into_settings(base)
        }
        other => Err(ConfigError::UnsupportedVersion(other)),
    }
}

pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let input = std::fs::read_to_string(path)?;
    parse_config(&input, path.parent())
}

/// Default configuration location: `%APPDATA%\padlink\padlink.yaml` on
/// Windows, `~/.config/padlink/padlink.yaml` elsewhere.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if cfg!(windows) {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| ConfigError::EnvVarNotSet("APPDATA".to_string()))?;
        return Ok(PathBuf::from(appdata).join(APP_DIR).join(CONFIG_FILE));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::EnvVarNotSet("HOME".to_string()))?;
    Ok(PathBuf::from(home)
        .join(HOME_CONFIG_DIR)
        .join(APP_DIR)
        .join(CONFIG_FILE))
}

/// Finds the configuration file to use.
///
/// An explicit path must exist. Without one the default location is used
/// when present; `None` means built-in defaults.
pub fn resolve_config(target: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match target {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ConfigError::NotFound(path.display().to_string())),
        None => {
            let path = default_config_path()?;
            Ok(path.exists().then_some(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
version: 1
sdl:
  library: C:\emulators\SDL2.dll
  version: "2.30"
  hints: "SDL_JOYSTICK_HIDAPI=0"
helper:
  path: padlink32.exe
  timeout_ms: 2500
database:
  path: gamecontrollerdb.txt
captures:
  path: es_input.cfg
"#;
        let settings = parse_config(yaml, None).expect("config");
        assert_eq!(settings.sdl_library, Some(PathBuf::from("C:\\emulators\\SDL2.dll")));
        assert_eq!(settings.sdl_version, Some(SdlVersion::Sdl2_30));
        assert_eq!(settings.hints.as_deref(), Some("SDL_JOYSTICK_HIDAPI=0"));
        assert_eq!(settings.helper_timeout, Duration::from_millis(2500));
        assert_eq!(settings.database, Some(PathBuf::from("gamecontrollerdb.txt")));
        assert_eq!(settings.captures, Some(PathBuf::from("es_input.cfg")));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let settings = parse_config("version: 1\n", None).expect("config");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.source_settings().helper_timeout, Some(DEFAULT_HELPER_TIMEOUT));
    }

    #[test]
    fn rejects_unknown_fields_and_versions() {
        assert!(matches!(
            parse_config("version: 1\nsdl:\n  libary: x\n", None),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(parse_config("version: 2\n", None), Err(ConfigError::UnsupportedVersion(2))));
        assert!(matches!(parse_config("sdl: {}\n", None), Err(ConfigError::Yaml(_))));
        assert!(matches!(
            parse_config("version: 1\nsdl:\n  version: banana\n", None),
            Err(ConfigError::InvalidVersion(_))
        ));
    }

    #[test]
    fn resolves_relative_paths_against_config_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "version: 1\ndatabase:\n  path: db.txt").expect("write");

        let settings = load_config(&path).expect("config");
        assert_eq!(settings.database, Some(dir.path().join("db.txt")));
        assert_eq!(resolve_config(Some(&path)).expect("resolve"), Some(path));
        assert!(matches!(
            resolve_config(Some(Path::new("/nonexistent/padlink.yaml"))),
            Err(ConfigError::NotFound(_))
        ));
    }
}
