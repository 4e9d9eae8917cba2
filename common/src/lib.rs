//! Shared core of the camsrv web interface: configuration, the recording
//! scanner and the list / heat-map shaping that the pages render.

pub mod color;
pub mod config;
pub mod dates;
pub mod error;
pub mod heatmap;
pub mod html;
pub mod recording;
pub mod settings;
pub mod video_list;

pub use crate::error::{ConfigError, Error, Result};
