// Flat reference records: rooms, courses, disciplines and subjects.

use serde::{Deserialize, Serialize};

use super::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: Option<EntityId>,
    pub name: String,
}

/// A year of study ("1st course", "2nd course", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<EntityId>,
    pub number: i64,
}

/// A teaching department; every teacher belongs to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discipline {
    pub id: Option<EntityId>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Option<EntityId>,
    pub name: String,
}

impl Classroom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Course {
    pub fn new(number: i64) -> Self {
        Self { id: None, number }
    }
}

impl Discipline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}
