//! Mapping between particle positions and concrete timetables.
//!
//! Every section owns two consecutive dimensions: `2*i` selects one of its
//! candidate start slots and `2*i + 1` selects a room. A dimension with `N`
//! choices spans the closed interval `[0, N-1]`; decoding rounds to the
//! nearest index and clamps.

use crate::catalog::Catalog;
use crate::models::{ScheduleEntry, Timetable};

#[derive(Debug, Clone)]
pub struct Encoding<'c> {
    catalog: &'c Catalog,
    upper: Vec<f64>,
}

impl<'c> Encoding<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        let rooms = catalog.rooms().len();
        let upper = (0..catalog.sections().len())
            .flat_map(|i| {
                let starts = catalog.candidate_starts(i).len();
                [(starts - 1) as f64, (rooms - 1) as f64]
            })
            .collect();
        Self { catalog, upper }
    }

    #[inline]
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.upper.len()
    }

    /// Upper bound of each dimension; the lower bound is always zero.
    #[inline]
    pub fn bounds(&self) -> &[f64] {
        &self.upper
    }

    /// Projects a position back into the search box.
    pub fn clamp(&self, position: &mut [f64]) {
        for (x, &hi) in position.iter_mut().zip(&self.upper) {
            *x = if x.is_nan() { 0.0 } else { (*x).clamp(0.0, hi) };
        }
    }

    /// Decodes a position into one entry per section, in catalog order.
    ///
    /// Total for any input: missing or non-finite coordinates decode to index 0.
    pub fn decode(&self, position: &[f64]) -> Timetable {
        let catalog = self.catalog;
        let slots = catalog.time_slots();
        let rooms = catalog.rooms();

        catalog
            .sections()
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let starts = catalog.candidate_starts(i);
                let t = to_index(position.get(2 * i).copied(), starts.len());
                let r = to_index(position.get(2 * i + 1).copied(), rooms.len());

                let first = starts[t];
                let last = catalog.span_end(first, section.span());
                let start_slot = &slots[first];

                ScheduleEntry {
                    section_id: section.id,
                    course_id: section.course_id,
                    class_group_id: section.class_group_id,
                    day: start_slot.day,
                    lecturer_id: section.lecturer_id,
                    time_slot_id: start_slot.id,
                    room_id: rooms[r].id,
                    program_id: section.program_id,
                    semester: section.semester,
                    credit_hours: section.credit_hours,
                    start_time: start_slot.start_time,
                    end_time: slots[last].end_time,
                }
            })
            .collect()
    }
}

#[inline]
fn to_index(value: Option<f64>, choices: usize) -> usize {
    match value {
        Some(x) if x.is_finite() => x.round().clamp(0.0, (choices - 1) as f64) as usize,
        _ => 0,
    }
}
