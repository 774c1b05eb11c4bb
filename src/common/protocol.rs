//! Frames exchanged between the chat client and the history server.
//!
//! Every frame is a single line of JSON. A client writes one [`Request`] and
//! waits for the [`Response`] carrying the same `id` before sending the next.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::Message;

pub const SEND_MESSAGE: &str = "ChatServer.SendMessage";
pub const FETCH_HISTORY: &str = "ChatServer.FetchHistory";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success<T: Serialize>(id: u64, reply: &T) -> Self {
        match serde_json::to_value(reply) {
            Ok(value) => Self {
                id,
                result: Some(value),
                error: None,
            },
            Err(err) => Self::failure(id, format!("failed to encode reply: {err}")),
        }
    }

    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Params of `ChatServer.SendMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendArgs {
    pub msg: Message,
}

/// Params of `ChatServer.FetchHistory`; always the empty object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchArgs {}

/// Reply of both methods: the full history after the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryReply {
    pub history: Vec<Message>,
}
