//! Command dispatch: bridges CLI args -> core repositories and pagers -> output.

pub mod access_key;
pub mod config_cmd;
pub mod delete;
pub mod list;
pub mod util;

use timetable_core::Backend;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Call a generic handler with the entity type matching a `ResourceKind`.
macro_rules! with_entity {
    ($kind:expr, $handler:ident ( $($arg:expr),* $(,)? )) => {
        match $kind {
            $crate::cli::ResourceKind::Classrooms => $handler::<timetable_core::Classroom>($($arg),*).await,
            $crate::cli::ResourceKind::Courses => $handler::<timetable_core::Course>($($arg),*).await,
            $crate::cli::ResourceKind::Disciplines => $handler::<timetable_core::Discipline>($($arg),*).await,
            $crate::cli::ResourceKind::Subjects => $handler::<timetable_core::Subject>($($arg),*).await,
            $crate::cli::ResourceKind::Groups => $handler::<timetable_core::Group>($($arg),*).await,
            $crate::cli::ResourceKind::Teachers => $handler::<timetable_core::Teacher>($($arg),*).await,
            $crate::cli::ResourceKind::Users => $handler::<timetable_core::User>($($arg),*).await,
            $crate::cli::ResourceKind::Schedule => $handler::<timetable_core::ScheduleItem>($($arg),*).await,
            $crate::cli::ResourceKind::Changes => $handler::<timetable_core::Change>($($arg),*).await,
        }
    };
}
pub(crate) use with_entity;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, backend: &Backend, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(backend, &args, global).await,
        Command::Delete(args) => delete::handle(backend, &args, global).await,
        Command::AccessKey => access_key::handle(backend, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before connecting".into(),
        )),
    }
}
