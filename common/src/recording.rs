//! Directory scanner for the recordings written by camsrvd.
//!
//! Recordings are plain files in one directory per camera.  The recorder
//! encodes the number of motion events in the file name
//! (`...-MOTION-42.mp4`); the file's mtime doubles as its id.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// Files touched more recently than this are assumed to still be recording.
pub const SETTLE_TIME: Duration = Duration::from_secs(10);

/// One finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Unix seconds; also the recording id.
    pub modified_at: i64,
    pub motion_count: u64,
}

/// Whether a file without a `-MOTION-<n>` marker is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMarker {
    /// Missing marker counts as zero motion (recording list).
    Optional,
    /// Missing marker skips the file (heat map).
    Required,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub extension: String,
    pub marker: MotionMarker,
}

impl ScanOptions {
    pub fn new(extension: impl Into<String>, marker: MotionMarker) -> Self {
        Self {
            extension: extension.into(),
            marker,
        }
    }
}

/// Scan `dir` for settled recordings, oldest first.
pub fn scan(dir: &Path, options: &ScanOptions) -> Result<Vec<RecordingFile>> {
    scan_at(dir, options, SystemTime::now())
}

/// [`scan`] with an explicit "now".
pub fn scan_at(dir: &Path, options: &ScanOptions, now: SystemTime) -> Result<Vec<RecordingFile>> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    let root = fs::canonicalize(dir).map_err(io_err)?;
    let entries = fs::read_dir(&root).map_err(io_err)?;
    let now = unix_seconds(now);

    let mut recordings = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(v) => v,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {e}", root.display());
                continue;
            }
        };

        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !has_extension(&file_name, &options.extension) {
            continue;
        }

        let motion_count = match (motion_count(&file_name), options.marker) {
            (Some(motion), _) => motion,
            (None, MotionMarker::Optional) => 0,
            (None, MotionMarker::Required) => continue,
        };

        // Resolve symlinks and refuse anything that lands outside `root`.
        let path = match fs::canonicalize(entry.path()) {
            Ok(p) if p.starts_with(&root) => p,
            Ok(p) => {
                debug!("Skipping {} (outside {})", p.display(), root.display());
                continue;
            }
            Err(e) => {
                debug!("Skipping {file_name}: {e}");
                continue;
            }
        };

        let meta = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                debug!("Skipping {file_name}: {e}");
                continue;
            }
        };
        let Ok(modified) = meta.modified() else {
            continue;
        };

        let modified_at = unix_seconds(modified);
        if now - modified_at < SETTLE_TIME.as_secs() as i64 {
            // Still being written
            continue;
        }

        recordings.push(RecordingFile {
            path,
            file_name,
            modified_at,
            motion_count,
        });
    }

    recordings.sort_by(|a, b| {
        a.modified_at
            .cmp(&b.modified_at)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    Ok(recordings)
}

/// Motion events encoded as `-MOTION-<digits>` anywhere in the name.
pub fn motion_count(file_name: &str) -> Option<u64> {
    static MOTION_RE: OnceLock<Regex> = OnceLock::new();
    let re = MOTION_RE.get_or_init(|| Regex::new(r"-MOTION-(\d+)").unwrap());
    let digits = re.captures(file_name)?.get(1)?.as_str();
    Some(digits.parse().unwrap_or(u64::MAX))
}

fn has_extension(file_name: &str, extension: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
