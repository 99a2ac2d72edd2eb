// Resource descriptors for every backend collection.
//
// Each collection is a zero-sized marker implementing `Resource`, which
// binds its URL path, its wire types and the filter it accepts. The
// generic verbs on `ApiClient` are written once against this trait.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{
    ChangeRequest, ChangeResponse, ClassroomRequest, ClassroomResponse, CourseRequest,
    CourseResponse, DisciplineRequest, DisciplineResponse, GroupRequest, GroupResponse,
    ScheduleRequest, ScheduleResponse, SubjectRequest, SubjectResponse, TeacherRequest,
    TeacherResponse, UserRequest, UserResponse,
};

/// A REST collection served under `{base_url}/{PATH}`.
pub trait Resource: Send + Sync + 'static {
    /// Collection path relative to the API base URL.
    const PATH: &'static str;

    type Response: DeserializeOwned + Send + 'static;
    type Request: Serialize + Send + Sync;
    type Filter: QueryFilter + Clone + Default + Send + Sync + 'static;
}

/// Extra query parameters appended to a list request.
pub trait QueryFilter {
    fn query_params(&self) -> Vec<(&'static str, String)>;
}

fn push_query(params: &mut Vec<(&'static str, String)>, query: &str) {
    let query = query.trim();
    if !query.is_empty() {
        params.push(("query", query.to_owned()));
    }
}

fn push_opt<T: ToString>(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

// ── Filters ─────────────────────────────────────────────────────────

/// Free-text search. Blank queries are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub query: String,
}

impl SearchFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

impl QueryFilter for SearchFilter {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_query(&mut params, &self.query);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    pub query: String,
    pub course_id: Option<i64>,
}

impl QueryFilter for GroupFilter {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_query(&mut params, &self.query);
        push_opt(&mut params, "courseId", self.course_id);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherFilter {
    pub query: String,
    pub discipline_id: Option<i64>,
}

impl QueryFilter for TeacherFilter {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_query(&mut params, &self.query);
        push_opt(&mut params, "disciplineId", self.discipline_id);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    /// 1 = Monday ... 7 = Sunday.
    pub day_number: Option<i64>,
    pub is_numerator: Option<bool>,
    pub group_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

impl QueryFilter for ScheduleFilter {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_opt(&mut params, "dayNumber", self.day_number);
        push_opt(&mut params, "isNumerator", self.is_numerator);
        push_opt(&mut params, "groupId", self.group_id);
        push_opt(&mut params, "teacherId", self.teacher_id);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    /// ISO-8601 date (`YYYY-MM-DD`).
    pub date: Option<String>,
    pub is_numerator: Option<bool>,
    pub group_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

impl QueryFilter for ChangeFilter {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_opt(&mut params, "date", self.date.as_deref());
        push_opt(&mut params, "isNumerator", self.is_numerator);
        push_opt(&mut params, "groupId", self.group_id);
        push_opt(&mut params, "teacherId", self.teacher_id);
        params
    }
}

// ── Collections ─────────────────────────────────────────────────────

macro_rules! resource {
    ($(#[$meta:meta])* $name:ident, $path:literal, $resp:ty, $req:ty, $filter:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub enum $name {}

        impl Resource for $name {
            const PATH: &'static str = $path;
            type Response = $resp;
            type Request = $req;
            type Filter = $filter;
        }
    };
}

resource!(Classrooms, "classroom", ClassroomResponse, ClassroomRequest, SearchFilter);
resource!(Courses, "course", CourseResponse, CourseRequest, SearchFilter);
resource!(Disciplines, "discipline", DisciplineResponse, DisciplineRequest, SearchFilter);
resource!(Subjects, "subject", SubjectResponse, SubjectRequest, SearchFilter);
resource!(Groups, "group", GroupResponse, GroupRequest, GroupFilter);
resource!(Teachers, "teacher", TeacherResponse, TeacherRequest, TeacherFilter);
resource!(
    /// Accounts are created by the auth service; the admin only links them.
    Users, "user", UserResponse, UserRequest, SearchFilter
);
resource!(Schedule, "schedule", ScheduleResponse, ScheduleRequest, ScheduleFilter);
resource!(Changes, "change", ChangeResponse, ChangeRequest, ChangeFilter);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_is_omitted() {
        assert!(SearchFilter::new("   ").query_params().is_empty());
        assert_eq!(
            SearchFilter::new(" 101 ").query_params(),
            vec![("query", "101".to_owned())]
        );
    }

    #[test]
    fn schedule_filter_sends_alternation_flag_not_day() {
        let filter = ScheduleFilter {
            day_number: Some(3),
            is_numerator: Some(false),
            ..ScheduleFilter::default()
        };
        assert_eq!(
            filter.query_params(),
            vec![
                ("dayNumber", "3".to_owned()),
                ("isNumerator", "false".to_owned())
            ]
        );
    }

    #[test]
    fn change_filter_only_sends_present_fields() {
        let filter = ChangeFilter {
            date: Some("2024-09-02".into()),
            teacher_id: Some(7),
            ..ChangeFilter::default()
        };
        assert_eq!(
            filter.query_params(),
            vec![
                ("date", "2024-09-02".to_owned()),
                ("teacherId", "7".to_owned())
            ]
        );
    }
}
