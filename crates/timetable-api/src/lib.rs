// timetable-api: Async Rust client for the timetable administration backend

pub mod client;
pub mod error;
pub mod resources;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::Error;
pub use resources::{
    ChangeFilter, Changes, Classrooms, Courses, Disciplines, GroupFilter, Groups, QueryFilter,
    Resource, Schedule, ScheduleFilter, SearchFilter, Subjects, TeacherFilter, Teachers, Users,
};
pub use transport::TransportConfig;
