use serde_json::json;
use time::macros::datetime;

use super::*;
use crate::models::{NotificationKind, UserPatch};

#[test]
fn unit_actions_have_no_params() {
    assert!(to_params(&ListUsers).unwrap().is_empty());
    assert!(to_params(&GetAnalyticsOverview).unwrap().is_empty());
}

#[test]
fn read_and_write_kinds_follow_catalog() {
    assert_eq!(ListBatches::KIND, RequestKind::Read);
    assert_eq!(Login::KIND, RequestKind::Write);
    assert_eq!(CheckIn::NAME, "createAttendanceRecord");
    assert_eq!(CheckOut::NAME, "updateAttendanceRecord");
    assert_eq!(MarkNotificationRead::NAME, "markNotificationAsRead");
    assert_eq!(ListYoyoTests::NAME, "listYoyoTestResults");
}

#[test]
fn login_params_are_phone_and_password() {
    let params = to_params(&Login { phone: "9876543210".to_owned(), password: "password123".to_owned() }).unwrap();
    assert_eq!(Value::Object(params), json!({"phone": "9876543210", "password": "password123"}));
}

#[test]
fn change_password_params_are_camel_case() {
    let params = to_params(&ChangePassword {
        user_id: "U1".to_owned(),
        old_password: "old".to_owned(),
        new_password: "newpass".to_owned(),
    })
    .unwrap();
    assert_eq!(Value::Object(params), json!({"userId": "U1", "oldPassword": "old", "newPassword": "newpass"}));
}

#[test]
fn update_user_flattens_patch_next_to_id() {
    let action = UpdateUser {
        id: "U1".to_owned(),
        patch: UserPatch { name: Some("Ravi".to_owned()), ..UserPatch::default() },
    };
    assert_eq!(Value::Object(to_params(&action).unwrap()), json!({"id": "U1", "name": "Ravi"}));
}

#[test]
fn optional_filters_are_omitted_when_absent() {
    assert!(to_params(&ListSessions::default()).unwrap().is_empty());
    let params = to_params(&ListSessions { date: Some("2026-10-19".to_owned()) }).unwrap();
    assert_eq!(params["date"], "2026-10-19");
    assert!(to_params(&ListYoyoTests::default()).unwrap().is_empty());
}

#[test]
fn create_notification_omits_empty_id() {
    let action = CreateNotification {
        notification: Notification {
            user_id: "U1".to_owned(),
            title: "Nets moved".to_owned(),
            kind: NotificationKind::Session,
            ..Notification::default()
        },
    };
    let params = to_params(&action).unwrap();
    assert!(!params.contains_key("id"));
    assert_eq!(params["type"], "session");
    assert_eq!(params["isRead"], false);
}

#[test]
fn check_in_stamps_date_and_time() {
    let at = datetime!(2026-10-19 09:05 UTC);
    let action = CheckIn::at("U1", "S9", at);
    assert_eq!(action.date, "2026-10-19");
    assert_eq!(action.check_in_time, "09:05");
    assert_eq!(action.marked_by, "U1");
    assert_eq!(action.status, AttendanceStatus::Present);

    let params = to_params(&action).unwrap();
    assert_eq!(params["checkInTime"], "09:05");
    assert_eq!(params["status"], "present");
}

#[test]
fn check_out_stamps_time() {
    let action = CheckOut::at("A1", datetime!(2026-10-19 17:45 UTC));
    assert_eq!(Value::Object(to_params(&action).unwrap()), json!({"id": "A1", "checkOutTime": "17:45"}));
}
