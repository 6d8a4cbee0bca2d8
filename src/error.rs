use crate::models::{ClassGroupId, RoomId, SectionId, TimeSlotId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptySections,
    EmptyTimeSlots,
    EmptyRooms,
    EmptyPreferences,
    DuplicateSection(SectionId),
    DuplicateTimeSlot(TimeSlotId),
    DuplicateRoom(RoomId),
    UnknownClassGroup {
        section: SectionId,
        class_group: ClassGroupId,
    },
    InvalidSlotRange(TimeSlotId),
    InvalidParameter {
        field: &'static str,
        reason: String,
    },
}

impl ValidationError {
    pub fn parameter(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptySections => write!(f, "The course catalog has no sections."),
            ValidationError::EmptyTimeSlots => write!(f, "The course catalog has no time slots."),
            ValidationError::EmptyRooms => write!(f, "The course catalog has no rooms."),
            ValidationError::EmptyPreferences => {
                write!(f, "The lecturer preference input is empty.")
            }
            ValidationError::DuplicateSection(id) => write!(f, "Duplicate section id {}", id),
            ValidationError::DuplicateTimeSlot(id) => write!(f, "Duplicate time slot id {}", id),
            ValidationError::DuplicateRoom(id) => write!(f, "Duplicate room id {}", id),
            ValidationError::UnknownClassGroup {
                section,
                class_group,
            } => write!(
                f,
                "Section {} references unknown class group {}",
                section, class_group
            ),
            ValidationError::InvalidSlotRange(id) => {
                write!(f, "Time slot {} does not start before it ends", id)
            }
            ValidationError::InvalidParameter { field, reason } => {
                write!(f, "Invalid parameter `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub struct ExportError {
    reason: String,
}

impl ExportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Timetable export failed: {}", self.reason)
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::new(err.to_string())
    }
}

#[derive(Debug)]
pub enum OptimizeError {
    Validation(ValidationError),
    Export(ExportError),
}

impl std::fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizeError::Validation(e) => write!(f, "{}", e),
            OptimizeError::Export(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for OptimizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OptimizeError::Validation(e) => Some(e),
            OptimizeError::Export(e) => Some(e),
        }
    }
}

impl From<ValidationError> for OptimizeError {
    fn from(err: ValidationError) -> Self {
        OptimizeError::Validation(err)
    }
}

impl From<ExportError> for OptimizeError {
    fn from(err: ExportError) -> Self {
        OptimizeError::Export(err)
    }
}
