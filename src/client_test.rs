use serde_json::json;

use super::*;
use crate::actions::{DeleteUser, GetUser, ListUsers};
use crate::models::Role;
use crate::test_support::{MockTransport, sample_user_json};
use crate::transport::RequestKind;

fn client_with(mock: &Arc<MockTransport>) -> ApiClient {
    ApiClient::new(mock.clone())
}

// =============================================================================
// request
// =============================================================================

#[tokio::test]
async fn success_yields_typed_data_without_message() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("getUser", Ok(sample_user_json()));
    let env = client_with(&mock).request(&GetUser { id: "U001".to_owned() }).await;

    assert!(env.is_success());
    assert!(env.message().is_none());
    let user = env.into_data().unwrap();
    assert_eq!(user.role, Role::Student);

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].action, "getUser");
    assert_eq!(calls[0].kind, RequestKind::Read);
    assert_eq!(calls[0].params["id"], "U001");
}

#[tokio::test]
async fn transport_failure_becomes_failed_envelope() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("listUsers", Err(TransportError::Network("connection refused".to_owned())));
    let env = client_with(&mock).request(&ListUsers).await;

    assert!(!env.is_success());
    assert!(env.data().is_none());
    assert_eq!(env.message(), Some("network request failed: connection refused"));
}

#[tokio::test]
async fn status_and_backend_failures_keep_their_message() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("deleteUser", Err(TransportError::Status { status: 500, message: "Sheet missing".to_owned() }));
    mock.respond("deleteUser", Err(TransportError::Backend("User not found".to_owned())));
    let client = client_with(&mock);
    let action = DeleteUser { id: "U9".to_owned() };

    assert_eq!(client.request(&action).await.message(), Some("Sheet missing"));
    assert_eq!(client.request(&action).await.message(), Some("User not found"));
}

#[tokio::test]
async fn payload_of_wrong_shape_is_a_failure() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("listUsers", Ok(json!({"rows": 3})));
    let env = client_with(&mock).request(&ListUsers).await;

    assert!(!env.is_success());
    assert!(env.message().unwrap().starts_with("invalid response: listUsers"));
}

// =============================================================================
// composites
// =============================================================================

#[tokio::test]
async fn todays_sessions_filters_by_local_date() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("listSessions", Ok(json!([{"id": "S1", "title": "Nets"}])));
    let env = client_with(&mock).todays_sessions().await;

    assert_eq!(env.into_data().unwrap()[0].title, "Nets");
    let today = actions::calendar_date(actions::local_now());
    assert_eq!(mock.calls()[0].params["date"], today.as_str());
}

#[tokio::test]
async fn check_in_and_out_use_attendance_actions() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("createAttendanceRecord", Ok(json!({"id": "A1", "userId": "U1", "sessionId": "S1"})));
    mock.respond("updateAttendanceRecord", Ok(json!({"id": "A1", "checkOutTime": "17:00"})));
    let client = client_with(&mock);

    let record = client.check_in("U1", "S1").await.into_data().unwrap();
    assert_eq!(record.id, "A1");
    let record = client.check_out("A1").await.into_data().unwrap();
    assert_eq!(record.check_out_time.as_deref(), Some("17:00"));

    let calls = mock.calls();
    assert_eq!(calls[0].params["markedBy"], "U1");
    assert_eq!(calls[0].params["status"], "present");
    assert_eq!(calls[1].params["id"], "A1");
    assert!(calls[1].params.contains_key("checkOutTime"));
}

#[tokio::test]
async fn bulk_notifications_succeed_when_all_succeed() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("createNotification", Ok(json!({"id": "N1", "userId": "U1"})));
    mock.respond("createNotification", Ok(json!({"id": "N2", "userId": "U2"})));
    let ids = vec!["U1".to_owned(), "U2".to_owned()];

    let env = client_with(&mock)
        .send_bulk_notifications("Rain", "Nets cancelled", &ids, NotificationKind::Announcement)
        .await;
    assert_eq!(env.into_data(), Some(true));

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.params["title"] == "Rain" && c.params["isRead"] == false));
}

#[tokio::test]
async fn bulk_notifications_report_partial_failure() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("createNotification", Ok(json!({"id": "N1", "userId": "U1"})));
    mock.respond("createNotification", Err(TransportError::Backend("quota exceeded".to_owned())));
    let ids = vec!["U1".to_owned(), "U2".to_owned()];

    let env = client_with(&mock)
        .send_bulk_notifications("Rain", "Nets cancelled", &ids, NotificationKind::Session)
        .await;
    assert!(!env.is_success());
    assert_eq!(env.message(), Some("failed to notify 1 of 2 users: quota exceeded"));
}
