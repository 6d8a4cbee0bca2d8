use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

pub type SectionId = u32;
pub type CourseId = u32;
pub type ProgramId = u32;
pub type LecturerId = u32;
pub type RoomId = u32;
pub type TimeSlotId = u32;
pub type ClassGroupId = u32;
pub type Day = u32;

/// One course-section offering that needs a slot and a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSection {
    pub id: SectionId,
    pub course_id: CourseId,
    pub program_id: ProgramId,
    pub semester: u32,
    /// Number of contiguous slot units the section occupies.
    pub credit_hours: u32,
    pub class_group_id: ClassGroupId,
    pub lecturer_id: LecturerId,
}

impl CourseSection {
    /// Slot span of the section. A zero credit count still occupies one slot.
    #[inline]
    pub fn span(&self) -> usize {
        self.credit_hours.max(1) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PreferredSlot {
    pub day: Day,
    pub time_slot_id: TimeSlotId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecturer {
    pub id: LecturerId,
    #[serde(default)]
    pub preferences: BTreeSet<PreferredSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// A teaching period. Times are minutes after midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub day: Day,
    pub start_time: u32,
    pub end_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: ClassGroupId,
}

/// Raw catalog records as produced by the upstream ingestion step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogInput {
    pub sections: Vec<CourseSection>,
    pub lecturers: Vec<Lecturer>,
    pub rooms: Vec<Room>,
    pub time_slots: Vec<TimeSlot>,
    pub class_groups: Vec<ClassGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub section_id: SectionId,
    pub course_id: CourseId,
    pub class_group_id: ClassGroupId,
    pub day: Day,
    pub lecturer_id: LecturerId,
    pub time_slot_id: TimeSlotId,
    pub room_id: RoomId,
    pub program_id: ProgramId,
    pub semester: u32,
    pub credit_hours: u32,
    pub start_time: u32,
    pub end_time: u32,
}

impl ScheduleEntry {
    #[inline]
    pub fn overlaps(&self, other: &ScheduleEntry) -> bool {
        self.day == other.day
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

pub type Timetable = Vec<ScheduleEntry>;

/// Two sections double-booking the same room, lecturer or class group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConflict {
    pub first: SectionId,
    pub second: SectionId,
    pub day: Day,
    /// Room, lecturer or class-group id, depending on the category.
    pub resource: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceConflict {
    pub section_id: SectionId,
    pub lecturer_id: LecturerId,
    pub day: Day,
    pub time_slot_id: TimeSlotId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConflictReport {
    pub room_conflicts: Vec<PairConflict>,
    pub lecturer_conflicts: Vec<PairConflict>,
    pub class_group_conflicts: Vec<PairConflict>,
    pub preference_conflicts: Vec<PreferenceConflict>,
    pub hard_total: u32,
    pub total: u32,
    pub messages: Vec<String>,
}

/// Wire form of an elapsed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElapsedTime {
    pub secs: u64,
    pub nanos: u32,
}

impl From<Duration> for ElapsedTime {
    fn from(d: Duration) -> Self {
        Self {
            secs: d.as_secs(),
            nanos: d.subsec_nanos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProgress {
    pub iteration: usize,
    pub best_fitness: f64,
    pub current_run: usize,
    pub total_runs: usize,
    pub all_best_fitness: Vec<f64>,
    pub elapsed_time: ElapsedTime,
    pub is_finished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub success: bool,
    pub fitness: f64,
    pub schedule: Timetable,
    pub conflicts: ConflictReport,
    pub all_best_fitness: Vec<f64>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
