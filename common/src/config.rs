//! Configuration parsing – reads the INI file shared with the recording
//! daemon (`/etc/camsrv.ini`).
//!
//! Values are kept raw: no interpolation, no type coercion.  Typed access
//! lives in [`crate::settings`].

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::ConfigError;

/// Parsed INI file, addressed with dotted `section.key` paths.
#[derive(Debug, Clone, Default)]
pub struct Config {
    globals: HashMap<String, String>,
    sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Default config path.
    pub fn default_path() -> &'static str {
        "/etc/camsrv.ini"
    }

    /// Look up a leaf value such as `webinterface.title`.
    ///
    /// A path naming a whole section (e.g. `webinterface`) is an error, as
    /// is a path that does not exist.
    pub fn get(&self, setting: &str) -> Result<&str, ConfigError> {
        self.lookup(setting)?
            .ok_or_else(|| ConfigError::Missing(setting.to_string()))
    }

    /// Like [`Config::get`], but a missing key yields `None`.
    pub fn get_opt(&self, setting: &str) -> Result<Option<&str>, ConfigError> {
        self.lookup(setting)
    }

    fn lookup(&self, setting: &str) -> Result<Option<&str>, ConfigError> {
        if setting.is_empty() {
            return Err(ConfigError::EmptyKey);
        }

        match setting.split_once('.') {
            None => {
                if self.sections.contains_key(setting) {
                    return Err(ConfigError::NotLeaf(setting.to_string()));
                }
                Ok(self.globals.get(setting).map(String::as_str))
            }
            // Only `section.key`; deeper paths name nothing.
            Some((_, key)) if key.contains('.') => Ok(None),
            Some((section, key)) => Ok(self
                .sections
                .get(section)
                .and_then(|values| values.get(key))
                .map(String::as_str)),
        }
    }
}

/// Read and parse an INI file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_ini(&text);
    info!(
        "Loaded config from {} ({} sections)",
        path.display(),
        config.sections.len()
    );
    Ok(config)
}

/// Parse INI text into a [`Config`].
///
/// Lines starting with `;` or `#` are comments.  Values may be optionally
/// double-quoted.  Keys before the first `[section]` header are globals.
/// Lines that are neither headers nor `key = value` pairs are ignored.
pub fn parse_ini(text: &str) -> Config {
    let mut config = Config::default();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            config.sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        if let Some((key, val)) = line.split_once('=') {
            let key = key.trim().to_string();
            let val = unquote(val.trim()).to_string();
            match &current {
                Some(section) => {
                    config
                        .sections
                        .entry(section.clone())
                        .or_default()
                        .insert(key, val);
                }
                None => {
                    config.globals.insert(key, val);
                }
            }
        }
    }

    config
}

fn unquote(val: &str) -> &str {
    val.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(val)
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
; camsrv configuration
rootvalue = 1

[camsrvd]
filenametpl = /srv/cams/%CAMERA%/%Y%m%d-%H%M%S-MOTION-%MOTION%.mp4

[webinterface]
title = "Camera Server"
cameras = front,back
# heat map
heatmapcolors = 0:FFFFFF|10:FF0000
"#;

    #[test]
    fn test_dotted_lookup() {
        let config = parse_ini(SAMPLE);
        assert_eq!(config.get("webinterface.title").unwrap(), "Camera Server");
        assert_eq!(config.get("webinterface.cameras").unwrap(), "front,back");
        assert_eq!(
            config.get("webinterface.heatmapcolors").unwrap(),
            "0:FFFFFF|10:FF0000"
        );
        assert_eq!(config.get("rootvalue").unwrap(), "1");
    }

    #[test]
    fn test_missing_key() {
        let config = parse_ini(SAMPLE);
        assert!(matches!(
            config.get("webinterface.nope"),
            Err(ConfigError::Missing(key)) if key == "webinterface.nope"
        ));
        assert!(matches!(
            config.get("nosection.title"),
            Err(ConfigError::Missing(_))
        ));
        assert_eq!(config.get_opt("webinterface.nope").unwrap(), None);
    }

    #[test]
    fn test_paths_deeper_than_section_key_are_missing() {
        let config = parse_ini("[a]\nb.c = 1\n");
        assert!(matches!(
            config.get("a.b.c"),
            Err(ConfigError::Missing(key)) if key == "a.b.c"
        ));
        assert_eq!(config.get_opt("webinterface.title.x").unwrap(), None);
    }

    #[test]
    fn test_section_is_not_a_leaf() {
        let config = parse_ini(SAMPLE);
        assert!(matches!(
            config.get("webinterface"),
            Err(ConfigError::NotLeaf(_))
        ));
    }

    #[test]
    fn test_empty_key() {
        let config = parse_ini(SAMPLE);
        assert!(matches!(config.get(""), Err(ConfigError::EmptyKey)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camsrv.ini");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.get("webinterface.title").unwrap(), "Camera Server");

        let missing = load(&dir.path().join("absent.ini"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
