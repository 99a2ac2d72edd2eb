//! `list` command: pages through a collection with a `Pager`.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, warn};

use timetable_api::{ChangeFilter, GroupFilter, ScheduleFilter, SearchFilter, TeacherFilter};
use timetable_core::model::FilterOf;
use timetable_core::{
    Backend, Change, Classroom, Course, Discipline, Entity, Group, PagingState, ScheduleItem,
    Subject, Teacher, User, UserOwner, WeekAlternation,
};

use crate::cli::{GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

use super::util::show_id;
use super::with_entity;

// ── Listing contract ────────────────────────────────────────────────

/// An entity the CLI can list: its table row and how flags become its
/// collection filter.
trait Listed: Entity + Serialize {
    type Row: Tabled;

    fn row(&self) -> Self::Row;

    fn filter(args: &ListArgs) -> Result<FilterOf<Self>, CliError>;
}

/// Flags that narrow a listing, paired with whether they were given.
fn given_flags(args: &ListArgs) -> [(&'static str, bool); 8] {
    [
        ("query", args.query.is_some()),
        ("course", args.course.is_some()),
        ("discipline", args.discipline.is_some()),
        ("group", args.group.is_some()),
        ("teacher", args.teacher.is_some()),
        ("day", args.day.is_some()),
        ("week", args.week.is_some()),
        ("date", args.date.is_some()),
    ]
}

/// Fail on any given flag the collection does not filter by.
fn only_flags(args: &ListArgs, kind: &str, allowed: &[&str]) -> Result<(), CliError> {
    match given_flags(args)
        .into_iter()
        .find(|(name, given)| *given && !allowed.contains(name))
    {
        Some((name, _)) => Err(CliError::Validation {
            field: format!("--{name}"),
            reason: format!("cannot filter {kind} records by {name}"),
        }),
        None => Ok(()),
    }
}

fn search(args: &ListArgs, kind: &str) -> Result<SearchFilter, CliError> {
    only_flags(args, kind, &["query"])?;
    Ok(SearchFilter::new(args.query.clone().unwrap_or_default()))
}

fn yes_no(flag: bool) -> String {
    if flag { "yes".into() } else { String::new() }
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct NamedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct CourseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Course")]
    number: i64,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Group")]
    number: i64,
    #[tabled(rename = "Course")]
    course: i64,
}

#[derive(Tabled)]
struct TeacherRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Discipline")]
    discipline: String,
    #[tabled(rename = "Head")]
    head: String,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Assigned to")]
    owner: String,
}

#[derive(Tabled)]
struct SlotRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "No.")]
    lesson_number: i64,
    #[tabled(rename = "Week")]
    week: WeekAlternation,
    #[tabled(rename = "Group")]
    group: i64,
    #[tabled(rename = "Lesson")]
    lesson: String,
    #[tabled(rename = "Teacher")]
    teacher: String,
    #[tabled(rename = "Room")]
    room: String,
}

// ── Per-entity listing ──────────────────────────────────────────────

macro_rules! named_listing {
    ($($entity:ty),*) => {$(
        impl Listed for $entity {
            type Row = NamedRow;

            fn row(&self) -> NamedRow {
                NamedRow {
                    id: show_id(self.id),
                    name: self.name.clone(),
                }
            }

            fn filter(args: &ListArgs) -> Result<SearchFilter, CliError> {
                search(args, Self::KIND)
            }
        }
    )*};
}

named_listing!(Classroom, Discipline, Subject);

impl Listed for Course {
    type Row = CourseRow;

    fn row(&self) -> CourseRow {
        CourseRow {
            id: show_id(self.id),
            number: self.number,
        }
    }

    fn filter(args: &ListArgs) -> Result<SearchFilter, CliError> {
        search(args, Self::KIND)
    }
}

impl Listed for Group {
    type Row = GroupRow;

    fn row(&self) -> GroupRow {
        GroupRow {
            id: show_id(self.id),
            number: self.number,
            course: self.course.number,
        }
    }

    fn filter(args: &ListArgs) -> Result<GroupFilter, CliError> {
        only_flags(args, Self::KIND, &["query", "course"])?;
        Ok(GroupFilter {
            query: args.query.clone().unwrap_or_default(),
            course_id: args.course.map(|id| id.get()),
        })
    }
}

impl Listed for Teacher {
    type Row = TeacherRow;

    fn row(&self) -> TeacherRow {
        TeacherRow {
            id: show_id(self.id),
            name: self.full_name(),
            discipline: self.discipline.name.clone(),
            head: yes_no(self.is_head_teacher),
        }
    }

    fn filter(args: &ListArgs) -> Result<TeacherFilter, CliError> {
        only_flags(args, Self::KIND, &["query", "discipline"])?;
        Ok(TeacherFilter {
            query: args.query.clone().unwrap_or_default(),
            discipline_id: args.discipline.map(|id| id.get()),
        })
    }
}

impl Listed for User {
    type Row = UserRow;

    fn row(&self) -> UserRow {
        let owner = match &self.owner {
            UserOwner::Group(group) => format!("group {}", group.number),
            UserOwner::Teacher(teacher) => teacher.full_name(),
            UserOwner::Unassigned => "-".into(),
        };
        UserRow {
            id: show_id(self.id),
            owner,
        }
    }

    fn filter(args: &ListArgs) -> Result<SearchFilter, CliError> {
        search(args, Self::KIND)
    }
}

impl Listed for ScheduleItem {
    type Row = SlotRow;

    fn row(&self) -> SlotRow {
        SlotRow {
            id: show_id(self.id),
            when: self.day.to_string(),
            lesson_number: self.lesson_number,
            week: self.week_alternation,
            group: self.group.number,
            lesson: self.lesson.title().to_owned(),
            teacher: self.teacher.full_name(),
            room: self.classroom.name.clone(),
        }
    }

    fn filter(args: &ListArgs) -> Result<ScheduleFilter, CliError> {
        only_flags(args, Self::KIND, &["group", "teacher", "day", "week"])?;
        Ok(ScheduleFilter {
            day_number: args.day.map(i64::from),
            is_numerator: args.week.map(|w| WeekAlternation::from(w).is_numerator()),
            group_id: args.group.map(|id| id.get()),
            teacher_id: args.teacher.map(|id| id.get()),
        })
    }
}

impl Listed for Change {
    type Row = SlotRow;

    fn row(&self) -> SlotRow {
        SlotRow {
            id: show_id(self.id),
            when: self.date.to_string(),
            lesson_number: self.lesson_number,
            week: self.week_alternation,
            group: self.group.number,
            lesson: self.lesson.title().to_owned(),
            teacher: self
                .teacher
                .as_ref()
                .map(Teacher::full_name)
                .unwrap_or_default(),
            room: self.classroom.name.clone(),
        }
    }

    fn filter(args: &ListArgs) -> Result<ChangeFilter, CliError> {
        only_flags(args, Self::KIND, &["group", "teacher", "week", "date"])?;
        Ok(ChangeFilter {
            date: args.date.map(|d| d.format("%Y-%m-%d").to_string()),
            is_numerator: args.week.map(|w| WeekAlternation::from(w).is_numerator()),
            group_id: args.group.map(|id| id.get()),
            teacher_id: args.teacher.map(|id| id.get()),
        })
    }
}

// ── Paging ──────────────────────────────────────────────────────────

fn settled<T>(state: &PagingState<T>) -> bool {
    !state.load_state.refresh.is_loading() && !state.load_state.append.is_loading()
}

/// Load rows until `limit` are in hand (0 = no limit) or the collection
/// ends. Each round asks the pager for its last loaded row, which pulls
/// the next page in. A page that adds no new rows also ends the listing,
/// so a backend that ignores `offset` cannot loop forever.
async fn collect<E: Entity>(
    backend: &Backend,
    filter: FilterOf<E>,
    limit: usize,
) -> Result<Vec<Arc<E>>, CliError> {
    let pager = backend
        .repository::<E>()
        .pager(backend.pager_config(), filter);
    let mut stream = pager.observe();
    let mut requested_at = None;

    loop {
        let state = stream
            .wait_for(settled)
            .await
            .ok_or_else(|| CliError::Internal("pager closed while loading".into()))?;

        if let Some(kind) = state
            .load_state
            .refresh
            .error()
            .or_else(|| state.load_state.append.error())
        {
            return Err(CliError::load_failed(E::KIND, kind));
        }

        let loaded = state.snapshot.len();
        let enough = limit > 0 && loaded >= limit;
        let done = enough || state.snapshot.end_reached();
        if !done && requested_at == Some(loaded) {
            warn!(kind = E::KIND, loaded, "next page added no new rows; stopping");
        } else if !done {
            debug!(kind = E::KIND, loaded, "requesting next page");
            pager.request_item(loaded.saturating_sub(1));
            if pager.state().load_state.append.is_loading() {
                requested_at = Some(loaded);
                continue;
            }
        }

        let mut items: Vec<Arc<E>> = state.snapshot.iter().cloned().collect();
        if limit > 0 {
            items.truncate(limit);
        }
        return Ok(items);
    }
}

async fn run<E: Listed>(
    backend: &Backend,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let filter = E::filter(args)?;
    let items = collect::<E>(backend, filter, args.limit).await?;

    let out = output::render_list(
        global.output,
        &items,
        |e| e.row(),
        |e| show_id(Entity::id(e.as_ref())),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(backend: &Backend, args: &ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    with_entity!(args.resource, run(backend, args, global))
}
