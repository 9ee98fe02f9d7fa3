//! Action catalog.
//!
//! Each remote operation is a request struct implementing [`Action`]: the
//! struct's serialized fields are the flat parameter bag, and the trait ties
//! it to its action identifier, request kind and response type.

#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::models::{
    AttendanceRecord, AttendanceStatus, Batch, Content, Notification, TrainingSession, User, UserPatch,
    YoyoTestResult,
};
use crate::transport::{Params, RequestKind, TransportError};

/// A typed remote operation.
pub trait Action: Serialize + Send + Sync {
    /// Identifier sent as the `action` parameter.
    const NAME: &'static str;
    const KIND: RequestKind;
    type Output: DeserializeOwned + Send;
}

/// Flatten an action into its parameter bag. Unit actions have no parameters.
///
/// # Errors
///
/// Returns [`TransportError::Encode`] if the action does not serialize to an object.
pub fn to_params<A: Action>(action: &A) -> Result<Params, TransportError> {
    match serde_json::to_value(action).map_err(|e| TransportError::Encode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Params::new()),
        other => Err(TransportError::Encode(format!("{} parameters must be an object, got {other}", A::NAME))),
    }
}

macro_rules! action {
    ($ty:ty, $name:literal, $kind:ident, $out:ty) => {
        impl Action for $ty {
            const NAME: &'static str = $name;
            const KIND: RequestKind = RequestKind::$kind;
            type Output = $out;
        }
    };
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub phone: String,
    pub password: String,
}
action!(Login, "login", Write, User);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub user_id: String,
    pub old_password: String,
    pub new_password: String,
}
action!(ChangePassword, "changePassword", Write, bool);

// =============================================================================
// USERS
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ListUsers;
action!(ListUsers, "listUsers", Read, Vec<User>);

#[derive(Debug, Clone, Serialize)]
pub struct GetUser {
    pub id: String,
}
action!(GetUser, "getUser", Read, User);

#[derive(Debug, Clone, Serialize)]
pub struct CreateUser {
    #[serde(flatten)]
    pub user: User,
}
action!(CreateUser, "createUser", Write, User);

#[derive(Debug, Clone, Serialize)]
pub struct UpdateUser {
    pub id: String,
    #[serde(flatten)]
    pub patch: UserPatch,
}
action!(UpdateUser, "updateUser", Write, User);

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUser {
    pub id: String,
}
action!(DeleteUser, "deleteUser", Write, bool);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GetCoaches;
action!(GetCoaches, "getCoaches", Read, Vec<User>);

// =============================================================================
// BATCHES
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ListBatches;
action!(ListBatches, "listBatches", Read, Vec<Batch>);

#[derive(Debug, Clone, Serialize)]
pub struct CreateBatch {
    #[serde(flatten)]
    pub batch: Batch,
}
action!(CreateBatch, "createBatch", Write, Batch);

#[derive(Debug, Clone, Serialize)]
pub struct DeleteBatch {
    pub id: String,
}
action!(DeleteBatch, "deleteBatch", Write, bool);

// =============================================================================
// CONTENT
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ListContent;
action!(ListContent, "listContent", Read, Vec<Content>);

#[derive(Debug, Clone, Serialize)]
pub struct CreateContent {
    #[serde(flatten)]
    pub content: Content,
}
action!(CreateContent, "createContent", Write, Content);

/// Partial content update; `fields` holds only the columns to change.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateContent {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}
action!(UpdateContent, "updateContent", Write, Content);

#[derive(Debug, Clone, Serialize)]
pub struct DeleteContent {
    pub id: String,
}
action!(DeleteContent, "deleteContent", Write, bool);

// =============================================================================
// TRAINING SESSIONS
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListSessions {
    /// `YYYY-MM-DD`; all sessions when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}
action!(ListSessions, "listSessions", Read, Vec<TrainingSession>);

#[derive(Debug, Clone, Serialize)]
pub struct CreateSession {
    #[serde(flatten)]
    pub session: TrainingSession,
}
action!(CreateSession, "createSession", Write, TrainingSession);

/// Check-in: creates today's attendance record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub user_id: String,
    pub session_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub check_in_time: String,
    pub marked_by: String,
}
action!(CheckIn, "createAttendanceRecord", Write, AttendanceRecord);

impl CheckIn {
    /// Self check-in of `user_id` into `session_id` at `at`.
    #[must_use]
    pub fn at(user_id: impl Into<String>, session_id: impl Into<String>, at: OffsetDateTime) -> Self {
        let user_id = user_id.into();
        Self {
            marked_by: user_id.clone(),
            user_id,
            session_id: session_id.into(),
            date: calendar_date(at),
            status: AttendanceStatus::Present,
            check_in_time: clock_time(at),
        }
    }
}

/// Check-out: stamps an open attendance record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOut {
    pub id: String,
    pub check_out_time: String,
}
action!(CheckOut, "updateAttendanceRecord", Write, AttendanceRecord);

impl CheckOut {
    #[must_use]
    pub fn at(record_id: impl Into<String>, at: OffsetDateTime) -> Self {
        Self { id: record_id.into(), check_out_time: clock_time(at) }
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotifications {
    pub user_id: String,
}
action!(ListNotifications, "listNotifications", Read, Vec<Notification>);

#[derive(Debug, Clone, Serialize)]
pub struct CreateNotification {
    #[serde(flatten)]
    pub notification: Notification,
}
action!(CreateNotification, "createNotification", Write, Notification);

#[derive(Debug, Clone, Serialize)]
pub struct MarkNotificationRead {
    pub id: String,
}
action!(MarkNotificationRead, "markNotificationAsRead", Write, bool);

// =============================================================================
// ATTENDANCE
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAttendance {
    pub user_id: String,
}
action!(ListAttendance, "listAttendanceRecords", Read, Vec<AttendanceRecord>);

/// Coach-side attendance marking for a student.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub student_id: String,
    pub session_id: String,
    pub status: AttendanceStatus,
    pub marked_by: String,
}
action!(MarkAttendance, "markAttendance", Write, AttendanceRecord);

// =============================================================================
// FITNESS TESTS
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListYoyoTests {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}
action!(ListYoyoTests, "listYoyoTestResults", Read, Vec<YoyoTestResult>);

#[derive(Debug, Clone, Serialize)]
pub struct CreateYoyoTest {
    #[serde(flatten)]
    pub result: YoyoTestResult,
}
action!(CreateYoyoTest, "createYoyoTestResult", Write, YoyoTestResult);

// =============================================================================
// ANALYTICS & SETTINGS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStudentStats {
    pub user_id: String,
}
action!(GetStudentStats, "getStudentStats", Read, Value);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCoachStats {
    pub user_id: String,
}
action!(GetCoachStats, "getCoachStats", Read, Value);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GetAnalyticsOverview;
action!(GetAnalyticsOverview, "getAnalyticsOverview", Read, Value);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GetSettings;
action!(GetSettings, "getSettings", Read, Value);

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSettings {
    #[serde(flatten)]
    pub settings: serde_json::Map<String, Value>,
}
action!(UpdateSettings, "updateSettings", Write, Value);

// =============================================================================
// DATES
// =============================================================================

/// Local wall-clock time, falling back to UTC when the offset is unknown.
#[must_use]
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `YYYY-MM-DD`.
#[must_use]
pub fn calendar_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day]")).unwrap_or_default()
}

/// `HH:MM`, 24-hour.
#[must_use]
pub fn clock_time(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]")).unwrap_or_default()
}
