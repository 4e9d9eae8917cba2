//! Heat-map color scale.
//!
//! The scale is configured as `threshold:HEX|threshold:HEX|...`.  A motion
//! count that hits a threshold exactly gets that color; anything between
//! two thresholds is linearly interpolated per RGB channel, starting from
//! white at zero.  Values past the last threshold keep its color.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;

const DEFAULT_FALLBACK: &str = "FFFFFF";

/// Implicit lower bound every scale interpolates from.
static ORIGIN: ColorStop = ColorStop {
    threshold: 0,
    hex: String::new(),
    rgb: Rgb {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    /// Decode a validated 3- or 6-digit hex color.
    fn from_hex(hex: &str) -> Option<Self> {
        let expanded: String = match hex.len() {
            6 => hex.to_string(),
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            _ => return None,
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        })
    }

    fn lerp(self, other: Rgb, p: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - p) + f64::from(b) * p) as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    fn to_css(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColorStop {
    threshold: i64,
    /// Uppercased, exactly as configured (3 or 6 digits).
    hex: String,
    rgb: Rgb,
}

impl ColorStop {
    fn css(&self) -> String {
        if self.hex.is_empty() {
            self.rgb.to_css()
        } else {
            format!("#{}", self.hex)
        }
    }
}

/// Parsed threshold → color table, sorted ascending by threshold.
///
/// Build it once from configuration and share it; lookups are pure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorScale {
    stops: Vec<ColorStop>,
}

impl ColorScale {
    /// Parse `threshold:HEX|threshold:HEX|...`.
    ///
    /// A blank setting gives an empty scale.  A single malformed entry
    /// rejects the whole table.
    pub fn parse(setting: &str) -> Result<Self, ConfigError> {
        let setting = setting.trim();
        if setting.is_empty() {
            return Ok(Self::default());
        }

        let mut stops: Vec<ColorStop> = Vec::new();
        for entry in setting.split('|') {
            let parts: Vec<&str> = entry.split(':').collect();
            let [threshold, hex] = parts.as_slice() else {
                return Err(ConfigError::InvalidColorTable(format!(
                    "illegal value \"{entry}\""
                )));
            };

            let threshold = parse_number(threshold).ok_or_else(|| {
                ConfigError::InvalidColorTable(format!("threshold \"{threshold}\" must be numeric"))
            })?;

            let hex = hex.trim();
            if !hex_re().is_match(hex) {
                return Err(ConfigError::InvalidColorTable(format!(
                    "color \"{hex}\" must be hex"
                )));
            }
            let hex = hex.to_ascii_uppercase();
            let rgb = Rgb::from_hex(&hex).ok_or_else(|| {
                ConfigError::InvalidColorTable(format!("color \"{hex}\" must have 3 or 6 digits"))
            })?;

            // A repeated threshold keeps the last color.
            stops.retain(|stop| stop.threshold != threshold);
            stops.push(ColorStop {
                threshold,
                hex,
                rgb,
            });
        }

        stops.sort_by_key(|stop| stop.threshold);
        Ok(Self { stops })
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// CSS color for a motion count, falling back to white.
    pub fn color_for(&self, motion: u64) -> String {
        self.color_for_or(motion, DEFAULT_FALLBACK)
    }

    /// CSS color for a motion count; `#<fallback>` when the scale is empty.
    pub fn color_for_or(&self, motion: u64, fallback: &str) -> String {
        self.lookup(i64::try_from(motion).unwrap_or(i64::MAX))
            .unwrap_or_else(|| format!("#{fallback}"))
    }

    /// CSS color for an unparsed value; non-numeric input gives `#<fallback>`.
    pub fn color_for_raw(&self, value: &str, fallback: &str) -> String {
        match parse_number(value) {
            Some(value) => self
                .lookup(value)
                .unwrap_or_else(|| format!("#{fallback}")),
            None => format!("#{fallback}"),
        }
    }

    fn lookup(&self, value: i64) -> Option<String> {
        if self.stops.is_empty() {
            return None;
        }

        let mut previous = &ORIGIN;
        for stop in &self.stops {
            if stop.threshold == value {
                return Some(stop.css());
            }

            if stop.threshold > value {
                let span = (stop.threshold as f64) - (previous.threshold as f64);
                if span <= 0.0 {
                    return Some(stop.css());
                }
                let p = ((value as f64 - previous.threshold as f64) / span).clamp(0.0, 1.0);
                return Some(previous.rgb.lerp(stop.rgb, p).to_css());
            }

            previous = stop;
        }

        Some(previous.css())
    }
}

impl FromStr for ColorScale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn hex_re() -> &'static Regex {
    static HEX_RE: OnceLock<Regex> = OnceLock::new();
    HEX_RE.get_or_init(|| Regex::new(r"(?i)^[A-F0-9]+$").unwrap())
}

/// Integer, or a finite decimal truncated towards zero.
fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
}
