//! Shared fixtures for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::models::User;
use crate::transport::{Params, RequestKind, Transport, TransportError};

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub kind: RequestKind,
    pub action: String,
    pub params: Params,
}

/// Transport that replays scripted results per action and records calls.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, TransportError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, action: &str, result: Result<Value, TransportError>) {
        self.responses
            .lock()
            .expect("mock mutex should lock")
            .entry(action.to_owned())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock mutex should lock").clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, kind: RequestKind, action: &str, params: Params) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .expect("mock mutex should lock")
            .push(RecordedCall { kind, action: action.to_owned(), params });
        self.responses
            .lock()
            .expect("mock mutex should lock")
            .get_mut(action)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(TransportError::Backend(format!("no response scripted for {action}"))))
    }
}

pub(crate) fn sample_user_json() -> Value {
    json!({
        "id": "U001",
        "name": "Arjun Sharma",
        "phone": "9876543210",
        "email": "arjun@academy.test",
        "role": "student",
        "status": "active",
        "joinDate": "2024-01-15",
        "avatar": "https://img.test/arjun.png",
        "batch": "U-16 Batting",
        "batchId": "B001",
        "skillLevel": "Intermediate",
        "isFirstLogin": true
    })
}

pub(crate) fn sample_user() -> User {
    serde_json::from_value(sample_user_json()).expect("sample user should parse")
}
