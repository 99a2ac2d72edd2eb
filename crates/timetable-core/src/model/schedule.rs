// Weekly timetable entries and one-off changes to them.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{Classroom, EntityId, Group, Subject, Teacher};

/// What happens in a timetable slot: a regular subject or a named event
/// (assembly, excursion, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lesson {
    Subject(Subject),
    Event(String),
}

impl Lesson {
    /// Display label: subject name or event name.
    pub fn title(&self) -> &str {
        match self {
            Self::Subject(subject) => &subject.name,
            Self::Event(name) => name,
        }
    }
}

/// Alternating-week marker used by two-week timetables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeekAlternation {
    Numerator,
    Denominator,
}

impl WeekAlternation {
    pub fn is_numerator(self) -> bool {
        matches!(self, Self::Numerator)
    }

    pub fn from_numerator(is_numerator: bool) -> Self {
        if is_numerator {
            Self::Numerator
        } else {
            Self::Denominator
        }
    }
}

/// A recurring weekly slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: Option<EntityId>,
    pub group: Group,
    pub classroom: Classroom,
    pub teacher: Teacher,
    pub lesson: Lesson,
    pub lesson_number: i64,
    pub day: Weekday,
    pub week_alternation: WeekAlternation,
}

/// A dated replacement for the regular timetable. The teacher may be
/// absent for events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub id: Option<EntityId>,
    pub group: Group,
    pub classroom: Classroom,
    pub teacher: Option<Teacher>,
    pub lesson: Lesson,
    pub lesson_number: i64,
    pub date: NaiveDate,
    pub week_alternation: WeekAlternation,
}
