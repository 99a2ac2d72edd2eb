// Student groups, teachers and the user accounts bound to either.

use serde::{Deserialize, Serialize};

use super::{Course, Discipline, EntityId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Option<EntityId>,
    pub number: i64,
    pub course: Course,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Option<EntityId>,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub discipline: Discipline,
    pub is_head_teacher: bool,
}

impl Teacher {
    /// "Last First Middle", skipping an empty middle name.
    pub fn full_name(&self) -> String {
        [&self.last_name, &self.first_name, &self.middle_name]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a user account is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOwner {
    Group(Group),
    Teacher(Teacher),
    Unassigned,
}

/// A login account. Accounts are created by the auth service; the admin
/// tool only (re)assigns them to a group or a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<EntityId>,
    pub owner: UserOwner,
}
