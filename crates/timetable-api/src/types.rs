// Wire types for the timetable backend.
//
// Field names follow the backend's camelCase JSON. Responses embed their
// related records (a group carries its course, a teacher its discipline);
// requests reference related records by id only.

use serde::{Deserialize, Serialize};

// ── Responses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: i64,
    pub number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: i64,
    pub number: i64,
    pub course: CourseResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub discipline: DisciplineResponse,
    #[serde(default)]
    pub is_head_teacher: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    #[serde(default)]
    pub group: Option<GroupResponse>,
    #[serde(default)]
    pub teacher: Option<TeacherResponse>,
    #[serde(default)]
    pub is_group: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: i64,
    pub group: GroupResponse,
    pub classroom: ClassroomResponse,
    pub teacher: TeacherResponse,
    #[serde(default)]
    pub subject: Option<SubjectResponse>,
    #[serde(default)]
    pub event_name: Option<String>,
    pub is_subject: bool,
    pub lesson_number: i64,
    pub day_number: i64,
    pub is_numerator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResponse {
    pub id: i64,
    pub group: GroupResponse,
    pub classroom: ClassroomResponse,
    #[serde(default)]
    pub teacher: Option<TeacherResponse>,
    #[serde(default)]
    pub subject: Option<SubjectResponse>,
    #[serde(default)]
    pub event_name: Option<String>,
    pub is_subject: bool,
    pub lesson_number: i64,
    /// ISO-8601 date (`YYYY-MM-DD`).
    pub date: String,
    pub is_numerator: bool,
}

/// A freshly issued registration key. `expires_at` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyResponse {
    pub key: String,
    pub expires_at: i64,
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub number: i64,
    pub course_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRequest {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub discipline_id: i64,
    pub is_head_teacher: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub id: i64,
    pub group_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub group_id: i64,
    pub classroom_id: i64,
    pub teacher_id: i64,
    pub subject_id: Option<i64>,
    pub event_name: Option<String>,
    pub lesson_number: i64,
    pub day_number: i64,
    pub is_numerator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub group_id: i64,
    pub classroom_id: i64,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub event_name: Option<String>,
    pub lesson_number: i64,
    pub date: String,
    pub is_numerator: bool,
}
