//! Motion heat map: one row per day, one cell per hour.
//!
//! Hour buckets are epoch-aligned (`floor(t / 3600) * 3600`) and labelled
//! through the same formatter as the column headers, so a cell is found by
//! its label.  Columns are rendered for the first epoch day, so a zone
//! whose offset today differs from its 1970 offset by a fraction of an
//! hour produces bucket labels with no column; those recordings are left
//! out of the grid.

use serde::Serialize;
use tracing::debug;

use crate::color::ColorScale;
use crate::dates::{DateFormatter, FormatKind};
use crate::html::escape;
use crate::recording::RecordingFile;

const HOURS: i64 = 24;
const HOUR_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCell {
    /// Earliest recording in this bucket, used as the link target.
    pub first_id: Option<i64>,
    pub motion: u64,
    /// `motion` with thousands separators, HTML-escaped.
    pub motion_label: String,
    pub color: String,
}

impl HourCell {
    fn empty() -> Self {
        Self {
            first_id: None,
            motion: 0,
            motion_label: String::new(),
            color: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapRow {
    /// HTML-escaped date label.
    pub date: String,
    /// Always 24 cells, in column order.
    pub cells: Vec<HourCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub columns: Vec<String>,
    pub rows: Vec<HeatmapRow>,
}

impl Heatmap {
    /// Aggregate `files` (ascending by mtime) into day × hour buckets.
    pub fn build(files: &[RecordingFile], formatter: &DateFormatter, scale: &ColorScale) -> Self {
        let columns = heatmap_columns(formatter);
        let mut rows: Vec<HeatmapRow> = Vec::new();

        for file in files {
            let date = escape(&formatter.format(FormatKind::DateHeatmap, file.modified_at));
            let hour_start = file.modified_at.div_euclid(HOUR_SECS) * HOUR_SECS;
            let hour = escape(&formatter.format(FormatKind::TimeHeatmap, hour_start));

            let slot = rows.iter().position(|r| r.date == date);
            let row = match slot {
                Some(i) => &mut rows[i],
                None => {
                    rows.push(HeatmapRow {
                        date,
                        cells: columns.iter().map(|_| HourCell::empty()).collect(),
                    });
                    let last = rows.len() - 1;
                    &mut rows[last]
                }
            };

            let Some(col) = columns.iter().position(|c| *c == hour) else {
                debug!(
                    "No heat map column for {} (bucket label {hour})",
                    file.file_name
                );
                continue;
            };

            let cell = &mut row.cells[col];
            cell.motion = cell.motion.saturating_add(file.motion_count);
            if cell.first_id.is_none() && file.modified_at > 0 {
                cell.first_id = Some(file.modified_at);
            }
        }

        for cell in rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
            cell.color = scale.color_for(cell.motion);
            cell.motion_label = escape(&group_thousands(cell.motion));
        }

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The 24 hour labels, escaped, for the epoch hours `0..24`.
pub fn heatmap_columns(formatter: &DateFormatter) -> Vec<String> {
    (0..HOURS)
        .map(|hour| escape(&formatter.format(FormatKind::TimeHeatmap, hour * HOUR_SECS)))
        .collect()
}

/// `1234567` → `1,234,567`.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::path::PathBuf;

    // 2024-03-01 00:00:00 UTC
    const DAY: i64 = 1_709_251_200;

    fn formatter() -> DateFormatter {
        DateFormatter::new([
            (FormatKind::DateHeatmap, "%Y-%m-%d"),
            (FormatKind::TimeHeatmap, "%H"),
        ])
        .unwrap()
        .with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn file(modified_at: i64, motion_count: u64) -> RecordingFile {
        RecordingFile {
            path: PathBuf::from(format!("/srv/cams/front/{modified_at}.mp4")),
            file_name: format!("{modified_at}-MOTION-{motion_count}.mp4"),
            modified_at,
            motion_count,
        }
    }

    #[test]
    fn test_columns_are_hours_of_day() {
        let columns = heatmap_columns(&formatter());
        assert_eq!(columns.len(), 24);
        assert_eq!(columns[0], "00");
        assert_eq!(columns[13], "13");
        assert_eq!(columns[23], "23");
    }

    #[test]
    fn test_same_hour_sums_motion_and_keeps_first_id() {
        let scale = ColorScale::parse("20:FF0000").unwrap();
        let files = [file(DAY + 5 * 3600 + 60, 3), file(DAY + 5 * 3600 + 1800, 7)];

        let heatmap = Heatmap::build(&files, &formatter(), &scale);

        assert_eq!(heatmap.rows.len(), 1);
        let cell = &heatmap.rows[0].cells[5];
        assert_eq!(cell.motion, 10);
        assert_eq!(cell.motion_label, "10");
        assert_eq!(cell.first_id, Some(DAY + 5 * 3600 + 60));
        assert_eq!(cell.color, "#FF7F7F");
    }

    #[test]
    fn test_every_date_gets_all_hours() {
        let scale = ColorScale::parse("10:FF0000").unwrap();
        let files = [file(DAY + 3600, 1), file(DAY + 2 * 86_400 + 22 * 3600, 4)];

        let heatmap = Heatmap::build(&files, &formatter(), &scale);

        let dates: Vec<&str> = heatmap.rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["2024-03-01", "2024-03-03"]);
        for row in &heatmap.rows {
            assert_eq!(row.cells.len(), 24);
        }

        let empty = &heatmap.rows[0].cells[0];
        assert_eq!(empty.first_id, None);
        assert_eq!(empty.motion, 0);
        assert_eq!(empty.motion_label, "0");
        assert_eq!(empty.color, "#FFFFFF");
        assert_eq!(heatmap.rows[1].cells[22].motion, 4);
    }

    #[test]
    fn test_half_hour_offset_still_lines_up() {
        let formatter = DateFormatter::new([(FormatKind::TimeHeatmap, "%H:%M")])
            .unwrap()
            .with_offset(FixedOffset::east_opt(5 * 3600 + 1800).unwrap());
        let heatmap = Heatmap::build(&[file(DAY + 3600, 2)], &formatter, &ColorScale::default());

        assert_eq!(heatmap.columns[0], "05:30");
        assert_eq!(heatmap.columns[1], "06:30");
        assert_eq!(heatmap.rows[0].cells.len(), 24);
        assert_eq!(heatmap.rows[0].cells[1].motion, 2);
    }

    #[test]
    fn test_bucket_without_column_is_skipped() {
        // Columns are labelled for 1970-01-01, so a pattern with the date in
        // it never matches a bucket from another day.
        let formatter = DateFormatter::new([(FormatKind::TimeHeatmap, "%m-%d %H")])
            .unwrap()
            .with_offset(FixedOffset::east_opt(0).unwrap());
        let heatmap = Heatmap::build(&[file(DAY + 5 * 3600, 9)], &formatter, &ColorScale::default());

        assert_eq!(heatmap.columns[5], "01-01 05");
        assert_eq!(heatmap.rows.len(), 1);
        let row = &heatmap.rows[0];
        assert_eq!(row.cells.len(), 24);
        assert!(row.cells.iter().all(|c| c.motion == 0 && c.first_id.is_none()));
    }

    #[test]
    fn test_empty_input() {
        let heatmap = Heatmap::build(&[], &formatter(), &ColorScale::default());
        assert!(heatmap.is_empty());
        assert_eq!(heatmap.columns.len(), 24);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
