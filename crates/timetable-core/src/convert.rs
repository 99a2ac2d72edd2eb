// ── API-to-domain type conversions ──
//
// Bridges `timetable_api::types` DTOs and `crate::model` records in both
// directions. Responses become domain records (parsing day numbers and
// dates into strong types); domain records become requests after
// validation, referencing related records by id.

use chrono::{DateTime, NaiveDate, Weekday};

use timetable_api::types::{
    AccessKeyResponse, ChangeRequest, ChangeResponse, ClassroomRequest, ClassroomResponse, CourseRequest,
    CourseResponse, DisciplineRequest, DisciplineResponse, GroupRequest, GroupResponse,
    ScheduleRequest, ScheduleResponse, SubjectRequest, SubjectResponse, TeacherRequest,
    TeacherResponse, UserRequest, UserResponse,
};
use timetable_api::{Changes, Classrooms, Courses, Disciplines, Groups, Schedule, Subjects, Teachers, Users};

use crate::error::CoreError;
use crate::model::{
    AccessKey, Change, Classroom, Course, Discipline, Entity, EntityId, Group, Lesson, ScheduleItem, Subject,
    Teacher, User, UserOwner, WeekAlternation,
};
use crate::paging::Identified;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Helpers ────────────────────────────────────────────────────────

/// Wire day number (1 = Monday ... 7 = Sunday) to `Weekday`.
pub fn weekday_from_number(number: i64) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_to_number(day: Weekday) -> i64 {
    i64::from(day.number_from_monday())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| CoreError::Internal(format!("invalid date {raw:?} from backend: {e}")))
}

fn non_blank(value: &str, field: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::validation(format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_owned())
    }
}

fn positive(value: i64, field: &str) -> Result<i64, CoreError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(CoreError::validation(format!("{field} must be positive")))
    }
}

fn required_id(id: Option<EntityId>, what: &str) -> Result<i64, CoreError> {
    id.map(EntityId::get)
        .ok_or_else(|| CoreError::validation(format!("{what} must be an existing record")))
}

/// Split a lesson into the wire's `(subjectId, eventName)` pair.
///
/// Event names are trimmed; a blank one means the form is incomplete.
fn lesson_fields(lesson: &Lesson) -> Result<(Option<i64>, Option<String>), CoreError> {
    match lesson {
        Lesson::Subject(subject) => Ok((Some(required_id(subject.id, "subject")?), None)),
        Lesson::Event(name) => Ok((None, Some(non_blank(name, "event name")?))),
    }
}

/// Rebuild a lesson from the wire triple. A subject wins when both are
/// present and flagged as such; an event with no name is malformed.
fn lesson_from_wire(
    is_subject: bool,
    subject: Option<SubjectResponse>,
    event_name: Option<String>,
) -> Result<Lesson, CoreError> {
    match (is_subject, subject, event_name) {
        (true, Some(subject), _) => Ok(Lesson::Subject(subject.into())),
        (false, _, Some(name)) if !name.trim().is_empty() => Ok(Lesson::Event(name)),
        (_, Some(subject), None) => Ok(Lesson::Subject(subject.into())),
        _ => Err(CoreError::Internal(
            "timetable entry has neither a subject nor an event name".into(),
        )),
    }
}

// ── Response → domain ──────────────────────────────────────────────

impl From<ClassroomResponse> for Classroom {
    fn from(r: ClassroomResponse) -> Self {
        Self {
            id: Some(r.id.into()),
            name: r.name,
        }
    }
}

impl From<CourseResponse> for Course {
    fn from(r: CourseResponse) -> Self {
        Self {
            id: Some(r.id.into()),
            number: r.number,
        }
    }
}

impl From<DisciplineResponse> for Discipline {
    fn from(r: DisciplineResponse) -> Self {
        Self {
            id: Some(r.id.into()),
            name: r.name,
        }
    }
}

impl From<SubjectResponse> for Subject {
    fn from(r: SubjectResponse) -> Self {
        Self {
            id: Some(r.id.into()),
            name: r.name,
        }
    }
}

impl From<GroupResponse> for Group {
    fn from(r: GroupResponse) -> Self {
        Self {
            id: Some(r.id.into()),
            number: r.number,
            course: r.course.into(),
        }
    }
}

impl From<TeacherResponse> for Teacher {
    fn from(r: TeacherResponse) -> Self {
        Self {
            id: Some(r.id.into()),
            first_name: r.first_name,
            last_name: r.last_name,
            middle_name: r.middle_name,
            discipline: r.discipline.into(),
            is_head_teacher: r.is_head_teacher,
        }
    }
}

impl From<UserResponse> for User {
    fn from(r: UserResponse) -> Self {
        let owner = match (r.is_group, r.group, r.teacher) {
            (true, Some(group), _) | (false, Some(group), None) => UserOwner::Group(group.into()),
            (_, _, Some(teacher)) => UserOwner::Teacher(teacher.into()),
            _ => UserOwner::Unassigned,
        };
        Self {
            id: Some(r.id.into()),
            owner,
        }
    }
}

impl TryFrom<ScheduleResponse> for ScheduleItem {
    type Error = CoreError;

    fn try_from(r: ScheduleResponse) -> Result<Self, Self::Error> {
        let day = weekday_from_number(r.day_number).ok_or_else(|| {
            CoreError::Internal(format!("invalid day number {} from backend", r.day_number))
        })?;
        Ok(Self {
            id: Some(r.id.into()),
            group: r.group.into(),
            classroom: r.classroom.into(),
            teacher: r.teacher.into(),
            lesson: lesson_from_wire(r.is_subject, r.subject, r.event_name)?,
            lesson_number: r.lesson_number,
            day,
            week_alternation: WeekAlternation::from_numerator(r.is_numerator),
        })
    }
}

impl TryFrom<ChangeResponse> for Change {
    type Error = CoreError;

    fn try_from(r: ChangeResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(r.id.into()),
            group: r.group.into(),
            classroom: r.classroom.into(),
            teacher: r.teacher.map(Into::into),
            lesson: lesson_from_wire(r.is_subject, r.subject, r.event_name)?,
            lesson_number: r.lesson_number,
            date: parse_date(&r.date)?,
            week_alternation: WeekAlternation::from_numerator(r.is_numerator),
        })
    }
}

impl TryFrom<AccessKeyResponse> for AccessKey {
    type Error = CoreError;

    fn try_from(r: AccessKeyResponse) -> Result<Self, Self::Error> {
        let expires_at = DateTime::from_timestamp_millis(r.expires_at).ok_or_else(|| {
            CoreError::Internal(format!("invalid key expiry {} from backend", r.expires_at))
        })?;
        Ok(Self {
            key: r.key,
            expires_at,
        })
    }
}

// ── Entity bindings ────────────────────────────────────────────────

macro_rules! identified_by_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                type Key = Option<EntityId>;

                fn identity(&self) -> Self::Key {
                    self.id
                }
            }
        )*
    };
}

identified_by_id!(Classroom, Course, Discipline, Subject, Group, Teacher, User, ScheduleItem, Change);

impl Entity for Classroom {
    type Resource = Classrooms;
    const KIND: &'static str = "classroom";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: ClassroomResponse) -> Result<Self, CoreError> {
        Ok(response.into())
    }

    fn to_request(&self) -> Result<ClassroomRequest, CoreError> {
        Ok(ClassroomRequest {
            name: non_blank(&self.name, "classroom name")?,
        })
    }
}

impl Entity for Course {
    type Resource = Courses;
    const KIND: &'static str = "course";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: CourseResponse) -> Result<Self, CoreError> {
        Ok(response.into())
    }

    fn to_request(&self) -> Result<CourseRequest, CoreError> {
        Ok(CourseRequest {
            number: positive(self.number, "course number")?,
        })
    }
}

impl Entity for Discipline {
    type Resource = Disciplines;
    const KIND: &'static str = "discipline";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: DisciplineResponse) -> Result<Self, CoreError> {
        Ok(response.into())
    }

    fn to_request(&self) -> Result<DisciplineRequest, CoreError> {
        Ok(DisciplineRequest {
            name: non_blank(&self.name, "discipline name")?,
        })
    }
}

impl Entity for Subject {
    type Resource = Subjects;
    const KIND: &'static str = "subject";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: SubjectResponse) -> Result<Self, CoreError> {
        Ok(response.into())
    }

    fn to_request(&self) -> Result<SubjectRequest, CoreError> {
        Ok(SubjectRequest {
            name: non_blank(&self.name, "subject name")?,
        })
    }
}

impl Entity for Group {
    type Resource = Groups;
    const KIND: &'static str = "group";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: GroupResponse) -> Result<Self, CoreError> {
        Ok(response.into())
    }

    fn to_request(&self) -> Result<GroupRequest, CoreError> {
        Ok(GroupRequest {
            number: positive(self.number, "group number")?,
            course_id: required_id(self.course.id, "course")?,
        })
    }
}

impl Entity for Teacher {
    type Resource = Teachers;
    const KIND: &'static str = "teacher";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: TeacherResponse) -> Result<Self, CoreError> {
        Ok(response.into())
    }

    fn to_request(&self) -> Result<TeacherRequest, CoreError> {
        Ok(TeacherRequest {
            first_name: non_blank(&self.first_name, "first name")?,
            last_name: non_blank(&self.last_name, "last name")?,
            middle_name: self.middle_name.trim().to_owned(),
            discipline_id: required_id(self.discipline.id, "discipline")?,
            is_head_teacher: self.is_head_teacher,
        })
    }
}

impl Entity for User {
    type Resource = Users;
    const KIND: &'static str = "user";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: UserResponse) -> Result<Self, CoreError> {
        Ok(response.into())
    }

    fn to_request(&self) -> Result<UserRequest, CoreError> {
        let id = required_id(self.id, "user")?;
        let (group_id, teacher_id) = match &self.owner {
            UserOwner::Group(group) => (Some(required_id(group.id, "group")?), None),
            UserOwner::Teacher(teacher) => (None, Some(required_id(teacher.id, "teacher")?)),
            UserOwner::Unassigned => (None, None),
        };
        Ok(UserRequest {
            id,
            group_id,
            teacher_id,
        })
    }
}

impl Entity for ScheduleItem {
    type Resource = Schedule;
    const KIND: &'static str = "schedule entry";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: ScheduleResponse) -> Result<Self, CoreError> {
        response.try_into()
    }

    fn to_request(&self) -> Result<ScheduleRequest, CoreError> {
        let (subject_id, event_name) = lesson_fields(&self.lesson)?;
        Ok(ScheduleRequest {
            group_id: required_id(self.group.id, "group")?,
            classroom_id: required_id(self.classroom.id, "classroom")?,
            teacher_id: required_id(self.teacher.id, "teacher")?,
            subject_id,
            event_name,
            lesson_number: positive(self.lesson_number, "lesson number")?,
            day_number: weekday_to_number(self.day),
            is_numerator: self.week_alternation.is_numerator(),
        })
    }
}

impl Entity for Change {
    type Resource = Changes;
    const KIND: &'static str = "change";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn from_response(response: ChangeResponse) -> Result<Self, CoreError> {
        response.try_into()
    }

    fn to_request(&self) -> Result<ChangeRequest, CoreError> {
        let (subject_id, event_name) = lesson_fields(&self.lesson)?;
        let teacher_id = self
            .teacher
            .as_ref()
            .map(|teacher| required_id(teacher.id, "teacher"))
            .transpose()?;
        Ok(ChangeRequest {
            group_id: required_id(self.group.id, "group")?,
            classroom_id: required_id(self.classroom.id, "classroom")?,
            teacher_id,
            subject_id,
            event_name,
            lesson_number: positive(self.lesson_number, "lesson number")?,
            date: format_date(self.date),
            is_numerator: self.week_alternation.is_numerator(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn group() -> Group {
        Group {
            id: Some(EntityId::new(3)),
            number: 21,
            course: Course {
                id: Some(EntityId::new(2)),
                number: 2,
            },
        }
    }

    fn classroom() -> Classroom {
        Classroom {
            id: Some(EntityId::new(7)),
            name: "101".into(),
        }
    }

    fn change(lesson: Lesson) -> Change {
        Change {
            id: None,
            group: group(),
            classroom: classroom(),
            teacher: None,
            lesson,
            lesson_number: 2,
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            week_alternation: WeekAlternation::Numerator,
        }
    }

    #[test]
    fn weekday_numbers_round_trip() {
        assert_eq!(weekday_from_number(1), Some(Weekday::Mon));
        assert_eq!(weekday_from_number(7), Some(Weekday::Sun));
        assert_eq!(weekday_from_number(0), None);
        assert_eq!(weekday_to_number(Weekday::Wed), 3);
    }

    #[test]
    fn change_event_name_is_trimmed() {
        let req = change(Lesson::Event("  Assembly ".into())).to_request().unwrap();
        assert_eq!(req.event_name.as_deref(), Some("Assembly"));
        assert_eq!(req.subject_id, None);
        assert_eq!(req.date, "2024-09-02");
        assert_eq!(req.teacher_id, None);
    }

    #[test]
    fn blank_event_name_is_rejected() {
        let err = change(Lesson::Event("   ".into())).to_request().unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn unsaved_subject_is_rejected() {
        let err = change(Lesson::Subject(Subject::new("Physics")))
            .to_request()
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn blank_classroom_name_is_rejected() {
        assert!(Classroom::new("  ").to_request().is_err());
        assert_eq!(Classroom::new(" 204 ").to_request().unwrap().name, "204");
    }

    #[test]
    fn schedule_response_parses_day_and_lesson() {
        let response: ScheduleResponse = serde_json::from_value(serde_json::json!({
            "id": 11,
            "group": { "id": 3, "number": 21, "course": { "id": 2, "number": 2 } },
            "classroom": { "id": 7, "name": "101" },
            "teacher": {
                "id": 4, "firstName": "Olena", "lastName": "Koval",
                "discipline": { "id": 1, "name": "Mathematics" }
            },
            "subject": { "id": 9, "name": "Algebra" },
            "isSubject": true,
            "lessonNumber": 1,
            "dayNumber": 5,
            "isNumerator": false
        }))
        .unwrap();

        let item = ScheduleItem::from_response(response).unwrap();
        assert_eq!(item.day, Weekday::Fri);
        assert_eq!(item.week_alternation, WeekAlternation::Denominator);
        assert_eq!(item.lesson.title(), "Algebra");
        assert_eq!(item.identity(), Some(EntityId::new(11)));
    }

    #[test]
    fn access_key_expiry_is_epoch_millis() {
        let key = AccessKey::try_from(AccessKeyResponse {
            key: "K7-2QX".into(),
            expires_at: 1_727_000_000_000,
        })
        .unwrap();
        assert_eq!(key.expires_at.to_rfc3339(), "2024-09-22T10:13:20+00:00");
        assert!(key.is_expired_at(key.expires_at));

        let out_of_range = AccessKeyResponse {
            key: "x".into(),
            expires_at: i64::MAX,
        };
        assert!(matches!(AccessKey::try_from(out_of_range), Err(CoreError::Internal(_))));
    }

    #[test]
    fn user_owner_follows_is_group_flag() {
        let response: UserResponse = serde_json::from_value(serde_json::json!({
            "id": 1,
            "group": { "id": 3, "number": 21, "course": { "id": 2, "number": 2 } },
            "isGroup": true
        }))
        .unwrap();
        let user = User::from(response);
        assert!(matches!(user.owner, UserOwner::Group(_)));
        assert_eq!(
            user.to_request().unwrap(),
            UserRequest {
                id: 1,
                group_id: Some(3),
                teacher_id: None
            }
        );
    }
}
