//! Typed view of the settings the web interface needs, built once at
//! start-up and shared read-only between requests.

use std::path::{Path, PathBuf};

use crate::color::ColorScale;
use crate::config::{self, Config};
use crate::dates::DateFormatter;
use crate::error::ConfigError;
use crate::html::escape;
use crate::recording::{MotionMarker, ScanOptions};

/// One camera section, e.g. `[front]`.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub id: String,
    pub title: String,
    /// Directory camsrvd writes the recordings of this camera to.
    pub destination: PathBuf,
    /// URL prefix under which `destination` is reachable by the browser.
    pub local_url: String,
    /// `livestream`, falling back to `stream`.
    pub stream: Option<String>,
}

/// Navigation entry; `id` and `title` are HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub title: String,
    pub cameras: Vec<CameraSettings>,
    /// Recording file extension, taken from `camsrvd.filenametpl`.
    pub extension: String,
    pub heatmap_enabled: bool,
    pub stream_enabled: bool,
    /// Grabber command with a `{STREAM}` placeholder.
    pub stream_command: Option<String>,
    pub locale: Option<String>,
    pub colors: ColorScale,
    pub dates: DateFormatter,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_config(&config::load(path)?)
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let cameras = config
            .get("webinterface.cameras")?
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| camera(config, id))
            .collect::<Result<Vec<_>, _>>()?;

        let template = config.get("camsrvd.filenametpl")?;
        let extension = Path::new(template)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ConfigError::Invalid {
                key: "camsrvd.filenametpl".into(),
                reason: format!("\"{template}\" has no file extension"),
            })?
            .to_string();

        Ok(Self {
            title: config.get("webinterface.title")?.to_string(),
            cameras,
            extension,
            heatmap_enabled: flag(config.get("webinterface.enableheatmap")?),
            stream_enabled: flag(config.get("webinterface.enablestream")?),
            stream_command: non_empty(config.get_opt("webinterface.streamcommand")?),
            locale: non_empty(config.get_opt("webinterface.locale")?),
            colors: ColorScale::parse(config.get("webinterface.heatmapcolors")?)?,
            dates: DateFormatter::from_config(config)?,
        })
    }

    pub fn camera(&self, id: &str) -> Option<&CameraSettings> {
        self.cameras.iter().find(|c| c.id == id)
    }

    /// Navigation menu with `selected` marked (empty for the overview).
    pub fn menu(&self, selected: &str) -> Vec<MenuEntry> {
        self.cameras
            .iter()
            .map(|c| MenuEntry {
                id: escape(&c.id),
                title: escape(&c.title),
                selected: c.id == selected,
            })
            .collect()
    }

    /// Scan options for the recording selector.
    pub fn list_scan(&self) -> ScanOptions {
        ScanOptions::new(self.extension.clone(), MotionMarker::Optional)
    }

    /// Scan options for the heat map.
    pub fn heatmap_scan(&self) -> ScanOptions {
        ScanOptions::new(self.extension.clone(), MotionMarker::Required)
    }
}

fn camera(config: &Config, id: &str) -> Result<CameraSettings, ConfigError> {
    let setting = |key: &str| format!("{id}.{key}");
    let stream = match non_empty(config.get_opt(&setting("livestream"))?) {
        Some(s) => Some(s),
        None => non_empty(config.get_opt(&setting("stream"))?),
    };

    Ok(CameraSettings {
        id: id.to_string(),
        title: config.get(&setting("title"))?.to_string(),
        destination: PathBuf::from(config.get(&setting("destination"))?),
        local_url: config.get(&setting("localurl"))?.to_string(),
        stream,
    })
}

fn flag(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok_and(|v| v == 1)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_ini;

    const SAMPLE: &str = r#"
[camsrvd]
filenametpl = /srv/cams/%CAMERA%/%Y%m%d-%H%M%S-MOTION-%MOTION%.mp4

[webinterface]
title = Home & Garden
cameras = front, ,back
enableheatmap = 1
enablestream = 0
streamcommand = ffmpeg -i {STREAM} -c copy -f mp4 -
heatmapcolors = 0:FFFFFF|10:FF0000
dateformatcombobox = %Y-%m-%d
timeformatcombobox = %H:%M
dateformatheatmap = %d.%m.
timeformatheatmap = %H

[front]
title = Front <door>
destination = /srv/cams/front
localurl = /recordings/front
livestream =
stream = rtsp://cam-front/stream

[back]
title = Back
destination = /srv/cams/back
localurl = /recordings/back
livestream = rtsp://cam-back/low
stream = rtsp://cam-back/high
"#;

    #[test]
    fn test_from_config() {
        let settings = Settings::from_config(&parse_ini(SAMPLE)).unwrap();

        assert_eq!(settings.title, "Home & Garden");
        assert_eq!(settings.extension, "mp4");
        assert!(settings.heatmap_enabled);
        assert!(!settings.stream_enabled);
        assert_eq!(
            settings.stream_command.as_deref(),
            Some("ffmpeg -i {STREAM} -c copy -f mp4 -")
        );
        assert_eq!(settings.colors.color_for(10), "#FF0000");

        let ids: Vec<&str> = settings.cameras.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["front", "back"]);

        let front = settings.camera("front").unwrap();
        assert_eq!(front.destination, PathBuf::from("/srv/cams/front"));
        assert_eq!(front.stream.as_deref(), Some("rtsp://cam-front/stream"));
        assert_eq!(
            settings.camera("back").unwrap().stream.as_deref(),
            Some("rtsp://cam-back/low")
        );
        assert!(settings.camera("side").is_none());
    }

    #[test]
    fn test_menu_is_escaped() {
        let settings = Settings::from_config(&parse_ini(SAMPLE)).unwrap();
        let menu = settings.menu("front");
        assert_eq!(menu[0].title, "Front &lt;door&gt;");
        assert!(menu[0].selected);
        assert!(!menu[1].selected);
    }

    #[test]
    fn test_missing_camera_setting_fails() {
        let text = SAMPLE.replace("destination = /srv/cams/back\n", "");
        assert!(matches!(
            Settings::from_config(&parse_ini(&text)),
            Err(ConfigError::Missing(key)) if key == "back.destination"
        ));
    }

    #[test]
    fn test_bad_color_table_fails() {
        let text = SAMPLE.replace("0:FFFFFF|10:FF0000", "0:FFFFFF|10:red");
        assert!(matches!(
            Settings::from_config(&parse_ini(&text)),
            Err(ConfigError::InvalidColorTable(_))
        ));
    }

    #[test]
    fn test_template_without_extension_fails() {
        let text = SAMPLE.replace("-MOTION-%MOTION%.mp4", "-MOTION-%MOTION%");
        assert!(matches!(
            Settings::from_config(&parse_ini(&text)),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
