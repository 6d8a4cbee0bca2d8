//! Immutable catalog built once per request from the raw input records.

use hashbrown::HashSet;

use crate::error::ValidationError;
use crate::models::{CatalogInput, CourseSection, Lecturer, Room, TimeSlot};

#[derive(Debug, Clone)]
pub struct Catalog {
    sections: Vec<CourseSection>,
    lecturers: Vec<Lecturer>,
    rooms: Vec<Room>,
    /// Sorted by `(day, start_time, id)`.
    time_slots: Vec<TimeSlot>,
    /// For each slot index, the index of the last slot on the same day.
    day_end: Vec<usize>,
    /// For each section, the slot indices where its span fits inside one day.
    candidate_starts: Vec<Vec<usize>>,
}

impl Catalog {
    pub fn new(input: CatalogInput) -> Result<Self, ValidationError> {
        let CatalogInput {
            sections,
            lecturers,
            rooms,
            mut time_slots,
            class_groups,
        } = input;

        if sections.is_empty() {
            return Err(ValidationError::EmptySections);
        }
        if time_slots.is_empty() {
            return Err(ValidationError::EmptyTimeSlots);
        }
        if rooms.is_empty() {
            return Err(ValidationError::EmptyRooms);
        }
        if lecturers.is_empty() {
            return Err(ValidationError::EmptyPreferences);
        }

        let mut seen = HashSet::new();
        for s in &sections {
            if !seen.insert(s.id) {
                return Err(ValidationError::DuplicateSection(s.id));
            }
        }
        seen.clear();
        for slot in &time_slots {
            if !seen.insert(slot.id) {
                return Err(ValidationError::DuplicateTimeSlot(slot.id));
            }
            if slot.start_time >= slot.end_time {
                return Err(ValidationError::InvalidSlotRange(slot.id));
            }
        }
        seen.clear();
        for room in &rooms {
            if !seen.insert(room.id) {
                return Err(ValidationError::DuplicateRoom(room.id));
            }
        }

        // An empty group table means groups are implied by the sections.
        if !class_groups.is_empty() {
            let known: HashSet<_> = class_groups.iter().map(|g| g.id).collect();
            if let Some(s) = sections.iter().find(|s| !known.contains(&s.class_group_id)) {
                return Err(ValidationError::UnknownClassGroup {
                    section: s.id,
                    class_group: s.class_group_id,
                });
            }
        }

        time_slots.sort_by_key(|t| (t.day, t.start_time, t.id));

        let n = time_slots.len();
        let mut day_end = vec![0; n];
        let mut last = n - 1;
        for i in (0..n).rev() {
            if time_slots[i].day != time_slots[last].day {
                last = i;
            }
            day_end[i] = last;
        }

        let candidate_starts = sections
            .iter()
            .map(|s| {
                let span = s.span();
                let fitting: Vec<usize> = (0..n).filter(|&i| i + span - 1 <= day_end[i]).collect();
                if fitting.is_empty() {
                    (0..n).collect()
                } else {
                    fitting
                }
            })
            .collect();

        Ok(Self {
            sections,
            lecturers,
            rooms,
            time_slots,
            day_end,
            candidate_starts,
        })
    }

    #[inline]
    pub fn sections(&self) -> &[CourseSection] {
        &self.sections
    }

    #[inline]
    pub fn lecturers(&self) -> &[Lecturer] {
        &self.lecturers
    }

    #[inline]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[inline]
    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    /// Slot indices at which section `section_idx` may start.
    #[inline]
    pub fn candidate_starts(&self, section_idx: usize) -> &[usize] {
        &self.candidate_starts[section_idx]
    }

    /// Index of the last slot occupied when a span of `span` slots starts at
    /// `start`. The range never crosses into the next day.
    #[inline]
    pub fn span_end(&self, start: usize, span: usize) -> usize {
        (start + span - 1).min(self.day_end[start])
    }
}
