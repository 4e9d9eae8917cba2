//! Date/time formatting with the strftime patterns from the
//! `[webinterface]` section.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::config::Config;
use crate::error::ConfigError;

/// The named formats the pages use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Date group labels in the recording selector.
    DateCombobox,
    /// Time range labels in the recording selector.
    TimeCombobox,
    /// Row labels of the heat map.
    DateHeatmap,
    /// Hour column labels of the heat map.
    TimeHeatmap,
}

impl FormatKind {
    pub const ALL: [FormatKind; 4] = [
        FormatKind::DateCombobox,
        FormatKind::TimeCombobox,
        FormatKind::DateHeatmap,
        FormatKind::TimeHeatmap,
    ];

    /// Dotted config key holding the pattern.
    pub fn setting(self) -> &'static str {
        match self {
            FormatKind::DateCombobox => "webinterface.dateformatcombobox",
            FormatKind::TimeCombobox => "webinterface.timeformatcombobox",
            FormatKind::DateHeatmap => "webinterface.dateformatheatmap",
            FormatKind::TimeHeatmap => "webinterface.timeformatheatmap",
        }
    }

    fn index(self) -> usize {
        match self {
            FormatKind::DateCombobox => 0,
            FormatKind::TimeCombobox => 1,
            FormatKind::DateHeatmap => 2,
            FormatKind::TimeHeatmap => 3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

/// Renders Unix timestamps with the configured patterns.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    patterns: [String; 4],
    zone: Zone,
}

impl DateFormatter {
    /// Build a formatter from `(kind, pattern)` pairs.  Kinds that are not
    /// listed fall back to ISO-like defaults.
    pub fn new<'a>(
        patterns: impl IntoIterator<Item = (FormatKind, &'a str)>,
    ) -> Result<Self, ConfigError> {
        let mut all = [
            "%Y-%m-%d".to_string(),
            "%H:%M:%S".to_string(),
            "%Y-%m-%d".to_string(),
            "%H:%M".to_string(),
        ];
        for (kind, pattern) in patterns {
            validate(kind, pattern)?;
            all[kind.index()] = pattern.to_string();
        }
        Ok(Self {
            patterns: all,
            zone: Zone::Local,
        })
    }

    /// Read all four patterns from the `[webinterface]` section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut patterns = Vec::with_capacity(FormatKind::ALL.len());
        for kind in FormatKind::ALL {
            patterns.push((kind, config.get(kind.setting())?));
        }
        Self::new(patterns)
    }

    /// Render in a fixed UTC offset instead of the host's local zone.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.zone = Zone::Fixed(offset);
        self
    }

    pub fn format(&self, kind: FormatKind, timestamp: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
            return String::new();
        };
        let items = StrftimeItems::new(&self.patterns[kind.index()]);

        let mut out = String::new();
        let _ = match self.zone {
            Zone::Local => write!(
                out,
                "{}",
                utc.with_timezone(&Local).format_with_items(items)
            ),
            Zone::Fixed(offset) => write!(
                out,
                "{}",
                utc.with_timezone(&offset).format_with_items(items)
            ),
        };
        out
    }
}

fn validate(kind: FormatKind, pattern: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidFormat {
            key: kind.setting().to_string(),
            pattern: pattern.to_string(),
        });
    }
    Ok(())
}
