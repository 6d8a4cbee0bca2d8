use csv::{QuoteStyle, WriterBuilder};

use crate::error::ExportError;
use crate::models::ScheduleEntry;

/// Writes the timetable as CSV: a header row of field names, then one row
/// per entry. Every field is quoted; embedded quotes are doubled.
pub fn timetable_to_csv(schedule: &[ScheduleEntry]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .has_headers(true)
        .from_writer(Vec::new());

    if schedule.is_empty() {
        writer.write_record(HEADER)?;
    }
    for entry in schedule {
        writer.serialize(entry)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::new(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::new(e.to_string()))
}

const HEADER: [&str; 12] = [
    "section_id",
    "course_id",
    "class_group_id",
    "day",
    "lecturer_id",
    "time_slot_id",
    "room_id",
    "program_id",
    "semester",
    "credit_hours",
    "start_time",
    "end_time",
];
