// ── Domain model ──
//
// Canonical representation of every record the admin tool manages.
// Wire DTOs from `timetable_api::types` are converted into these in
// `crate::convert`; relations are embedded by value, booleans from the
// wire become enums where they encode a choice.

pub mod access_key;
pub mod catalog;
pub mod entity_id;
pub mod people;
pub mod schedule;

use std::fmt::Debug;

use timetable_api::Resource;

use crate::error::CoreError;
use crate::paging::Identified;

// ── Re-exports ──────────────────────────────────────────────────────

pub use access_key::AccessKey;
pub use catalog::{Classroom, Course, Discipline, Subject};
pub use entity_id::EntityId;
pub use people::{Group, Teacher, User, UserOwner};
pub use schedule::{Change, Lesson, ScheduleItem, WeekAlternation};

/// Wire response type of an entity.
pub type ResponseOf<E> = <<E as Entity>::Resource as Resource>::Response;
/// Wire request type of an entity.
pub type RequestOf<E> = <<E as Entity>::Resource as Resource>::Request;
/// List filter accepted by an entity's collection.
pub type FilterOf<E> = <<E as Entity>::Resource as Resource>::Filter;

/// A record stored in one backend collection.
///
/// Ties the domain type to its REST resource and to the conversions in
/// both directions. `to_request` validates the record before it goes out.
pub trait Entity: Identified<Key = Option<EntityId>> + Clone + Debug + Send + Sync + 'static {
    type Resource: Resource;

    /// Singular, lowercase name used in logs and messages.
    const KIND: &'static str;

    /// `None` until the backend has stored the record.
    fn id(&self) -> Option<EntityId>;

    fn from_response(response: ResponseOf<Self>) -> Result<Self, CoreError>;

    fn to_request(&self) -> Result<RequestOf<Self>, CoreError>;
}
