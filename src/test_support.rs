//! Recording fake transport shared by the unit tests.

use crate::{
    domain::{ApiRequest, Method, RawResponse, Transport},
    errors::TransportError,
    models::{Meme, VoteState},
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};
use tokio::sync::Notify;

enum Scripted {
    Reply(RawResponse),
    Fail,
}

/// Replies are scripted per (method, path). A queued reply is used once; the last reply for a
/// route is repeated. Unscripted routes fail like a dropped connection.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    sent: Mutex<Vec<ApiRequest>>,
    gate: Mutex<Option<std::sync::Arc<Notify>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Scripts a raw envelope body.
    pub fn respond(&self, method: Method, path: &str, envelope: Value) {
        let body = serde_json::to_vec(&envelope).unwrap();
        self.push(method, path, Scripted::Reply(RawResponse { status: 200, body }));
    }

    /// Scripts `{ success: true, code: 200, data }`.
    pub fn respond_ok(&self, method: Method, path: &str, data: Value) {
        self.respond(method, path, json!({ "success": true, "code": 200, "data": data }));
    }

    pub fn respond_status(&self, method: Method, path: &str, status: u16) {
        self.push(method, path, Scripted::Reply(RawResponse { status, body: Vec::new() }));
    }

    pub fn fail(&self, method: Method, path: &str) {
        self.push(method, path, Scripted::Fail);
    }

    /// Holds every request until the returned handle is notified.
    pub fn hold(&self) -> std::sync::Arc<Notify> {
        let notify = std::sync::Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn next_reply(&self, method: Method, path: &str) -> Option<Result<RawResponse, TransportError>> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(&(method, path.to_string()))?;
        let scripted = if queue.len() > 1 { queue.pop_front()? } else { queue.front().map(clone_scripted)? };
        Some(match scripted {
            Scripted::Reply(raw) => Ok(raw),
            Scripted::Fail => Err(TransportError::InvalidRequest("connection refused".into())),
        })
    }
}

fn clone_scripted(scripted: &Scripted) -> Scripted {
    match scripted {
        Scripted::Reply(raw) => Scripted::Reply(raw.clone()),
        Scripted::Fail => Scripted::Fail,
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let (method, path) = (request.method, request.path.clone());
        self.sent.lock().unwrap().push(request);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.next_reply(method, &path)
            .unwrap_or_else(|| Err(TransportError::InvalidRequest("connection refused".into())))
    }
}

pub fn meme(id: &str, votes: i64) -> Meme {
    Meme {
        meme_id: id.to_string(),
        title: format!("meme {}", id),
        username: "alice".to_string(),
        votes,
        created_at: 1_754_640_000.0,
        user_vote: VoteState::None,
        image_url: None,
        description: None,
    }
}

pub fn meme_list(memes: &[Meme]) -> Value {
    json!({ "memes": memes })
}
