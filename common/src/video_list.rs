//! Recording selector data: recordings grouped by day, newest first.
//!
//! Each entry is labelled with the span since the previous recording
//! ("12:00 - 12:05"), so labels are computed oldest-first and the result
//! is reversed afterwards.

use serde::Serialize;

use crate::color::ColorScale;
use crate::dates::{DateFormatter, FormatKind};
use crate::html::escape;
use crate::recording::RecordingFile;

/// One selectable recording.  `time_label` and `url` are HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingEntry {
    pub id: i64,
    pub time_label: String,
    pub url: String,
    pub color: String,
}

/// Recordings sharing a date label.  `date` is HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingDay {
    pub date: String,
    pub entries: Vec<RecordingEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordingList {
    days: Vec<RecordingDay>,
}

impl RecordingList {
    /// Group `files` (ascending by mtime) for display.
    pub fn build(
        files: &[RecordingFile],
        base_url: &str,
        formatter: &DateFormatter,
        scale: &ColorScale,
    ) -> Self {
        let mut days: Vec<RecordingDay> = Vec::new();
        let mut previous: Option<i64> = None;

        for file in files {
            let date = escape(&formatter.format(FormatKind::DateCombobox, file.modified_at));
            let time = formatter.format(FormatKind::TimeCombobox, file.modified_at);
            let time_label = match previous {
                Some(prev) => escape(&format!(
                    "{} - {}",
                    formatter.format(FormatKind::TimeCombobox, prev),
                    time
                )),
                None => escape(&time),
            };
            previous = Some(file.modified_at);

            let entry = RecordingEntry {
                id: file.modified_at,
                time_label,
                url: escape(&format!("{base_url}/{}", file.file_name)),
                color: scale.color_for(file.motion_count),
            };

            let slot = days.iter().position(|d| d.date == date);
            let day = match slot {
                Some(i) => &mut days[i],
                None => {
                    days.push(RecordingDay {
                        date,
                        entries: Vec::new(),
                    });
                    let last = days.len() - 1;
                    &mut days[last]
                }
            };
            // Same label twice: the later recording replaces the earlier one.
            let same = day
                .entries
                .iter()
                .position(|e| e.time_label == entry.time_label);
            match same {
                Some(i) => day.entries[i] = entry,
                None => day.entries.push(entry),
            }
        }

        days.reverse();
        for day in &mut days {
            day.entries.reverse();
        }

        Self { days }
    }

    pub fn days(&self) -> &[RecordingDay] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Id of the newest recording.
    pub fn first_recording_id(&self) -> Option<i64> {
        self.days
            .first()
            .and_then(|day| day.entries.first())
            .map(|entry| entry.id)
    }

    /// Escaped URL of the recording with `id`.
    pub fn find_url(&self, id: i64) -> Option<&str> {
        self.days
            .iter()
            .flat_map(|day| day.entries.iter())
            .find(|entry| entry.id == id)
            .map(|entry| entry.url.as_str())
    }
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
            (FormatKind::DateCombobox, "%Y-%m-%d"),
            (FormatKind::TimeCombobox, "%H:%M"),
        ])
        .unwrap()
        .with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn file(name: &str, modified_at: i64, motion_count: u64) -> RecordingFile {
        RecordingFile {
            path: PathBuf::from("/srv/cams/front").join(name),
            file_name: name.to_string(),
            modified_at,
            motion_count,
        }
    }

    fn sample() -> Vec<RecordingFile> {
        vec![
            file("a.mp4", DAY + 23 * 3600, 0),
            file("b-MOTION-10.mp4", DAY + 23 * 3600 + 30 * 60, 10),
            file("c.mp4", DAY + 86_400 + 3600, 5),
        ]
    }

    #[test]
    fn test_labels_span_since_previous_recording() {
        let scale = ColorScale::parse("10:FF0000").unwrap();
        let list = RecordingList::build(&sample(), "/rec/front", &formatter(), &scale);

        let days = list.days();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-03-02");
        assert_eq!(days[0].entries[0].time_label, "23:30 - 01:00");
        assert_eq!(days[0].entries[0].color, "#FF7F7F");

        assert_eq!(days[1].date, "2024-03-01");
        let labels: Vec<&str> = days[1].entries.iter().map(|e| e.time_label.as_str()).collect();
        assert_eq!(labels, ["23:00 - 23:30", "23:00"]);
        assert_eq!(days[1].entries[0].url, "/rec/front/b-MOTION-10.mp4");
        assert_eq!(days[1].entries[0].color, "#FF0000");
        assert_eq!(days[1].entries[1].color, "#FFFFFF");
    }

    #[test]
    fn test_repeated_label_replaces_entry_in_place() {
        let files = vec![
            file("a.mp4", DAY + 10, 0),
            file("b.mp4", DAY + 20, 0),
            file("c-MOTION-10.mp4", DAY + 30, 10),
            file("d.mp4", DAY + 120, 0),
        ];
        let scale = ColorScale::parse("10:FF0000").unwrap();
        let list = RecordingList::build(&files, "/rec", &formatter(), &scale);

        let entries = &list.days()[0].entries;
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        let labels: Vec<&str> = entries.iter().map(|e| e.time_label.as_str()).collect();
        assert_eq!(ids, [DAY + 120, DAY + 30, DAY + 10]);
        assert_eq!(labels, ["00:00 - 00:02", "00:00 - 00:00", "00:00"]);
        assert_eq!(entries[1].url, "/rec/c-MOTION-10.mp4");
        assert_eq!(entries[1].color, "#FF0000");
    }

    #[test]
    fn test_queries() {
        let list = RecordingList::build(&sample(), "/rec", &formatter(), &ColorScale::default());
        assert_eq!(list.first_recording_id(), Some(DAY + 86_400 + 3600));
        assert_eq!(list.find_url(DAY + 23 * 3600), Some("/rec/a.mp4"));
        assert_eq!(list.find_url(42), None);
    }

    #[test]
    fn test_empty_list() {
        let list = RecordingList::build(&[], "/rec", &formatter(), &ColorScale::default());
        assert!(list.is_empty());
        assert_eq!(list.first_recording_id(), None);
    }

    #[test]
    fn test_labels_and_urls_are_escaped() {
        let files = vec![file("a&b.mp4", DAY, 0)];
        let formatter = DateFormatter::new([(FormatKind::DateCombobox, "<%Y>")])
            .unwrap()
            .with_offset(FixedOffset::east_opt(0).unwrap());
        let list = RecordingList::build(&files, "/rec", &formatter, &ColorScale::default());
        assert_eq!(list.days()[0].date, "&lt;2024&gt;");
        assert_eq!(list.find_url(DAY), Some("/rec/a&amp;b.mp4"));
    }
}
